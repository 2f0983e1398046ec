//! Relinearization keys
//!
//! Multiplying two ciphertexts yields three polynomials `(c_0, c_1, c_2)`
//! decrypting under `(1, s, s^2)`. A relinearization key is a key switching
//! key from `s^2` to `s`; applying it to `c_2` brings the product back to two
//! polynomials.

use super::{KeyId, KeySwitchingKey, SecretKey};
use crate::proto::pre::RelinearizationKey as RelinearizationKeyProto;
use crate::{Ciphertext, CryptoContext, Error, Feature, Result};
use fhe_traits::{DeserializeParametrized, FheParametrized, Serialize};
use prost::Message;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use tracing::debug;

/// Key used to relinearize the product of two ciphertexts encrypted under
/// the same key pair.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RelinearizationKey {
    pub(crate) ksk: KeySwitchingKey,
    pub(crate) key_id: KeyId,
}

impl RelinearizationKey {
    /// Generate a [`RelinearizationKey`] from a [`SecretKey`].
    pub fn new<R: RngCore + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<Self> {
        sk.par.require(Feature::LeveledShe)?;
        let ctx = sk.par.ks_ctx_at_level(0)?;
        let mut s2 = sk.poly(ctx)?;
        let s = s2.clone();
        *s2.as_mut() *= s.as_ref();
        let ksk = KeySwitchingKey::new(sk, &s2, rng)?;
        debug!(key_id = %sk.key_id, "generated relinearization key");
        Ok(Self {
            ksk,
            key_id: sk.key_id,
        })
    }

    /// Identifier of the key pair this key belongs to.
    pub const fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// Relinearize an "extended" ciphertext (c₀, c₁, c₂) into a [`Ciphertext`]
    pub(crate) fn relinearizes(&self, ct: &mut Ciphertext) -> Result<()> {
        if ct.c.len() != 3 {
            return Err(Error::DefaultError(
                "Only supports relinearization of ciphertext with 3 parts".to_string(),
            ));
        }
        if ct.key_id != self.key_id {
            return Err(Error::KeyMismatch {
                expected: self.key_id,
                found: ct.key_id,
            });
        }

        let (d0, d1) = self.ksk.key_switch(&ct.c[2], ct.level)?;
        ct.c.truncate(2);
        ct.c[0] += &d0;
        ct.c[1] += &d1;
        Ok(())
    }
}

impl FheParametrized for RelinearizationKey {
    type Parameters = CryptoContext;
}

impl From<&RelinearizationKey> for RelinearizationKeyProto {
    fn from(value: &RelinearizationKey) -> Self {
        RelinearizationKeyProto {
            ksk: Some((&value.ksk).into()),
            key_id: value.key_id.as_bytes().to_vec(),
        }
    }
}

impl Serialize for RelinearizationKey {
    fn to_bytes(&self) -> Vec<u8> {
        RelinearizationKeyProto::from(self).encode_to_vec()
    }
}

impl DeserializeParametrized for RelinearizationKey {
    type Error = Error;

    fn from_bytes(bytes: &[u8], par: &Arc<Self::Parameters>) -> Result<Self> {
        let rk: RelinearizationKeyProto =
            Message::decode(bytes).map_err(|_| Error::SerializationError)?;
        let ksk = rk.ksk.as_ref().ok_or(Error::SerializationError)?;
        Ok(Self {
            ksk: KeySwitchingKey::try_from_proto(ksk, par)?,
            key_id: KeyId::try_from_slice(&rk.key_id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RelinearizationKey;
    use crate::{CryptoContextBuilder, Feature, KeyPair, Scheme, SecurityLevel};
    use fhe_traits::{DeserializeParametrized, Serialize};
    use rand::thread_rng;
    use std::error::Error;

    #[test]
    fn requires_leveled_she() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Bfv)
            .set_plaintext_modulus(65537)
            .set_ring_dimension(32)
            .set_security_level(SecurityLevel::NotSet)
            .set_features(&[Feature::ProxyReEncryption])
            .build_arc()?;
        let kp = KeyPair::generate(&cc, &mut rng)?;
        assert_eq!(
            RelinearizationKey::new(&kp.secret_key, &mut rng).err(),
            Some(crate::Error::FeatureNotEnabled(Feature::LeveledShe))
        );
        Ok(())
    }

    #[test]
    fn serialize() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Bfv)
            .set_plaintext_modulus(65537)
            .set_multiplicative_depth(2)
            .set_ring_dimension(32)
            .set_security_level(SecurityLevel::NotSet)
            .build_arc()?;
        let kp = KeyPair::generate(&cc, &mut rng)?;
        let rk = RelinearizationKey::new(&kp.secret_key, &mut rng)?;
        assert_eq!(rk.key_id(), kp.key_id());
        let bytes = rk.to_bytes();
        assert_eq!(RelinearizationKey::from_bytes(&bytes, &cc)?, rk);
        Ok(())
    }
}
