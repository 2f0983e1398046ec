//! Public keys

use crate::proto::pre::PublicKey as PublicKeyProto;
use crate::{Ciphertext, CryptoContext, Error, Feature, KeyId, Plaintext, Result};
use fhe_math::rq::{Poly, Representation};
use fhe_traits::{
    DeserializeParametrized, DeserializeWithContext, FheEncrypter, FheParametrized, Serialize,
};
use prost::Message;
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::trace;
use zeroize::Zeroizing;

use super::SecretKey;

/// Public key `(-a s + e, a)` of a key pair.
///
/// The key lives modulo the full key-switching modulus `Q P` so that it can
/// also encrypt the key material of re-encryption keys; encryption projects
/// it onto the moduli of the plaintext level.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct PublicKey {
    pub(crate) par: Arc<CryptoContext>,
    pub(crate) c0: Poly,
    pub(crate) c1: Poly,
    pub(crate) seed: <ChaCha8Rng as SeedableRng>::Seed,
    pub(crate) key_id: KeyId,
}

impl FheParametrized for PublicKey {
    type Parameters = CryptoContext;
}

impl PublicKey {
    /// Generate the [`PublicKey`] matching a [`SecretKey`]. The identifier
    /// of the key is derived from the serialized key.
    pub(crate) fn new<R: RngCore + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<Self> {
        let ctx = sk.par.ks_ctx_at_level(0)?;
        let s = sk.poly(ctx)?;

        let seed = rng.gen::<<ChaCha8Rng as SeedableRng>::Seed>();
        let c1 = Poly::random_from_seed(ctx, Representation::Ntt, seed);
        let mut c0 = Poly::small(ctx, Representation::Ntt, sk.par.variance as f32, rng)?;
        c0 -= &(&c1 * s.as_ref());

        let mut pk = Self {
            par: sk.par.clone(),
            c0,
            c1,
            seed,
            key_id: KeyId::default(),
        };
        pk.key_id = KeyId::digest(&PublicKeyProto::from(&pk).c0);
        Ok(pk)
    }

    /// Identifier of the key pair this key belongs to.
    pub const fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// Encryption of zero at `level`, as the pair `(u pk_0 + e_1, u pk_1 + e_2)`.
    pub(crate) fn encrypt_zero<R: RngCore + CryptoRng>(
        &self,
        level: usize,
        rng: &mut R,
    ) -> Result<(Poly, Poly)> {
        let ctx = self.par.ctx_at_level(level)?;
        let u = Zeroizing::new(Poly::small(
            ctx,
            Representation::Ntt,
            SecretKey::SK_VARIANCE,
            rng,
        )?);
        let e1 = Zeroizing::new(Poly::small(
            ctx,
            Representation::Ntt,
            self.par.variance as f32,
            rng,
        )?);
        let e2 = Zeroizing::new(Poly::small(
            ctx,
            Representation::Ntt,
            self.par.variance as f32,
            rng,
        )?);

        let mut c0 = self.c0.project_to(ctx)?;
        c0 *= u.as_ref();
        c0 += e1.as_ref();
        let mut c1 = self.c1.project_to(ctx)?;
        c1 *= u.as_ref();
        c1 += e2.as_ref();
        Ok((c0, c1))
    }
}

impl FheEncrypter<Plaintext, Ciphertext> for PublicKey {
    type Error = Error;

    fn try_encrypt<R: RngCore + CryptoRng>(
        &self,
        pt: &Plaintext,
        rng: &mut R,
    ) -> Result<Ciphertext> {
        self.par.require(Feature::PublicKeyEncryption)?;
        if self.par != pt.par {
            return Err(Error::ParametersMismatch);
        }

        let (mut c0, c1) = self.encrypt_zero(pt.level, rng)?;
        c0 += &pt.poly_ntt;
        trace!(key_id = %self.key_id, level = pt.level, "encrypted plaintext");

        Ok(Ciphertext {
            par: self.par.clone(),
            c: vec![c0, c1],
            level: pt.level,
            depth: 0,
            key_id: self.key_id,
            scale: pt.scale,
        })
    }
}

impl From<&PublicKey> for PublicKeyProto {
    fn from(pk: &PublicKey) -> Self {
        PublicKeyProto {
            c0: pk.c0.to_bytes(),
            seed: pk.seed.to_vec(),
            key_id: pk.key_id.as_bytes().to_vec(),
        }
    }
}

impl Serialize for PublicKey {
    fn to_bytes(&self) -> Vec<u8> {
        PublicKeyProto::from(self).encode_to_vec()
    }
}

impl DeserializeParametrized for PublicKey {
    type Error = Error;

    fn from_bytes(bytes: &[u8], par: &Arc<Self::Parameters>) -> Result<Self> {
        let proto: PublicKeyProto =
            Message::decode(bytes).map_err(|_| Error::SerializationError)?;
        let ctx = par.ks_ctx_at_level(0)?;
        let c0 = Poly::from_bytes(&proto.c0, ctx).map_err(|_| Error::SerializationError)?;
        if c0.representation() != &Representation::Ntt {
            return Err(Error::SerializationError);
        }
        let seed = <ChaCha8Rng as SeedableRng>::Seed::try_from(proto.seed.as_slice())
            .map_err(|_| Error::SerializationError)?;
        let key_id = KeyId::try_from_slice(&proto.key_id)?;
        if key_id != KeyId::digest(&proto.c0) {
            return Err(Error::SerializationError);
        }
        Ok(Self {
            par: par.clone(),
            c0,
            c1: Poly::random_from_seed(ctx, Representation::Ntt, seed),
            seed,
            key_id,
        })
    }
}
