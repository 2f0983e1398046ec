//! Secret keys

use crate::{Ciphertext, CryptoContext, Error, Feature, KeyId, Plaintext, Result, Scheme};
use fhe_math::rq::{traits::TryConvertFrom, Context, Poly, Representation};
use fhe_traits::{FheDecrypter, FheParametrized};
use fhe_util::sample_vec_cbd;
use num_traits::ToPrimitive;
use rand::{CryptoRng, RngCore};
use std::fmt::Debug;
use std::sync::Arc;
use zeroize::Zeroizing;
use zeroize_derive::{Zeroize, ZeroizeOnDrop};

/// Secret key of a key pair. The coefficients never leave the crate and are
/// erased from memory when the key is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    #[zeroize(skip)]
    pub(crate) par: Arc<CryptoContext>,
    pub(crate) coeffs: Box<[i64]>,
    #[zeroize(skip)]
    pub(crate) key_id: KeyId,
}

impl Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl FheParametrized for SecretKey {
    type Parameters = CryptoContext;
}

impl SecretKey {
    /// The variance used for secret key sampling
    pub(crate) const SK_VARIANCE: f32 = 0.5;

    /// Generate a random ternary secret key. Its identifier is set once the
    /// matching public key exists.
    pub(crate) fn random<R: RngCore + CryptoRng>(
        par: &Arc<CryptoContext>,
        rng: &mut R,
    ) -> Result<Self> {
        let coeffs = sample_vec_cbd(par.degree(), Self::SK_VARIANCE, rng)
            .map_err(|e| Error::DefaultError(e.to_string()))?;
        Ok(Self {
            par: par.clone(),
            coeffs: coeffs.into_boxed_slice(),
            key_id: KeyId::default(),
        })
    }

    /// Identifier of the key pair this key belongs to.
    pub const fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// The secret as a polynomial of `ctx`, in Ntt representation.
    pub(crate) fn poly(&self, ctx: &Arc<Context>) -> Result<Zeroizing<Poly>> {
        let mut s = Zeroizing::new(Poly::try_convert_from(
            self.coeffs.as_ref(),
            ctx,
            Representation::PowerBasis,
        )?);
        s.change_representation(Representation::Ntt);
        Ok(s)
    }

    /// Computes `c_0 + c_1 s + ... + c_k s^k` in power basis.
    fn phase(&self, ct: &Ciphertext) -> Result<Zeroizing<Poly>> {
        let ctx = ct.c[0].ctx();
        let s = self.poly(ctx)?;
        let mut si = s.clone();
        let mut phase = Zeroizing::new(ct.c[0].clone());
        for ci in ct.c.iter().skip(1) {
            let mut cis = Zeroizing::new(ci.clone());
            *cis.as_mut() *= si.as_ref();
            *phase.as_mut() += cis.as_ref();
            *si.as_mut() *= s.as_ref();
        }
        phase.change_representation(Representation::PowerBasis);
        Ok(phase)
    }

    /// Measure the noise in a [`Ciphertext`], in bits.
    ///
    /// # Safety
    ///
    /// This operations may run in a variable time depending on the value of the
    /// noise.
    pub unsafe fn measure_noise(&self, ct: &Ciphertext) -> Result<usize> {
        let pt = self.try_decrypt(ct)?;
        let mut noise = self.phase(ct)?;
        let mut m = pt.poly_ntt.clone();
        m.change_representation(Representation::PowerBasis);
        *noise.as_mut() -= &m;
        let norm = noise.infinity_norm()?;
        Ok(norm.bits() as usize)
    }
}

impl FheDecrypter<Plaintext, Ciphertext> for SecretKey {
    type Error = Error;

    fn try_decrypt(&self, ct: &Ciphertext) -> Result<Plaintext> {
        self.par.require(Feature::PublicKeyEncryption)?;
        if self.par != ct.par {
            return Err(Error::ParametersMismatch);
        }
        if self.key_id != ct.key_id {
            return Err(Error::KeyMismatch {
                expected: self.key_id,
                found: ct.key_id,
            });
        }

        let phase = self.phase(ct)?;
        match self.par.scheme() {
            Scheme::Bfv => {
                let bfv = self.par.bfv()?;
                let scaled = Zeroizing::new(bfv.scalers[ct.level].scale(&phase)?);
                let q0 = &scaled.ctx().moduli_operators()[0];
                let m = scaled
                    .coefficients()
                    .row(0)
                    .iter()
                    .map(|c| bfv.plaintext.reduce_i64(q0.center(*c)))
                    .collect::<Vec<_>>();
                Plaintext::from_bfv_coefficients(&self.par, m, ct.level)
            }
            Scheme::Ckks => {
                let coefficients = phase
                    .lift_centered()?
                    .iter()
                    .map(|c| c.to_f64().unwrap_or(f64::NAN) / ct.scale)
                    .collect::<Vec<_>>();
                Plaintext::from_ckks_coefficients(&self.par, &coefficients, ct.level, ct.scale)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{CryptoContextBuilder, Encoding, KeyPair, Plaintext, Scheme, SecurityLevel};
    use fhe_traits::{FheDecoder, FheDecrypter, FheEncoder, FheEncrypter};
    use rand::thread_rng;
    use std::error::Error;

    #[test]
    fn ternary() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Bfv)
            .set_plaintext_modulus(65537)
            .set_ring_dimension(64)
            .set_security_level(SecurityLevel::NotSet)
            .build_arc()?;
        let kp = KeyPair::generate(&cc, &mut rng)?;
        assert!(kp.secret_key.coeffs.iter().all(|c| c.abs() <= 1));
        assert_eq!(kp.secret_key.key_id(), kp.key_id());
        assert!(!format!("{:?}", kp.secret_key).contains("coeffs"));
        Ok(())
    }

    #[test]
    fn unrelated_key_yields_garbage() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Bfv)
            .set_plaintext_modulus(65537)
            .set_ring_dimension(64)
            .set_security_level(SecurityLevel::NotSet)
            .build_arc()?;
        let alice = KeyPair::generate(&cc, &mut rng)?;
        let mut eve = KeyPair::generate(&cc, &mut rng)?;
        let values = (1..=64u64).collect::<Vec<_>>();
        let pt = Plaintext::try_encode(values.as_slice(), Encoding::packed(), &cc)?;
        let ct = alice.public_key.try_encrypt(&pt, &mut rng)?;

        // Bypass the key identifier check.
        eve.secret_key.key_id = alice.key_id();
        let decrypted = eve.secret_key.try_decrypt(&ct)?;
        let decoded = Vec::<u64>::try_decode(&decrypted, Encoding::packed())?;
        let matching = decoded.iter().zip(&values).filter(|(a, b)| a == b).count();
        assert!(matching < 4);
        Ok(())
    }
}
