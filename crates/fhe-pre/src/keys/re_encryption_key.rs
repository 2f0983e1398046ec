//! Re-encryption keys
//!
//! A re-encryption key from Alice to Bob is a key switching key from Alice's
//! secret to Bob's, whose pairs are encryptions under Bob's public key. Alice
//! produces it alone: Bob's secret key is never needed.

use super::{KeyId, KeySwitchingKey, PublicKey, SecretKey};
use crate::proto::pre::ReEncryptionKey as ReEncryptionKeyProto;
use crate::{CryptoContext, Error, Feature, Result};
use fhe_traits::{DeserializeParametrized, FheParametrized, Serialize};
use prost::Message;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use tracing::debug;

/// Key turning ciphertexts under the key pair `from` into ciphertexts under
/// the key pair `to`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ReEncryptionKey {
    pub(crate) ksk: KeySwitchingKey,
    pub(crate) from: KeyId,
    pub(crate) to: KeyId,
}

impl ReEncryptionKey {
    /// Generate a [`ReEncryptionKey`] from the secret key of the delegator
    /// and the public key of the delegatee.
    pub fn new<R: RngCore + CryptoRng>(
        sk_from: &SecretKey,
        pk_to: &PublicKey,
        rng: &mut R,
    ) -> Result<Self> {
        sk_from.par.require(Feature::ProxyReEncryption)?;
        if sk_from.par != pk_to.par {
            return Err(Error::ParametersMismatch);
        }

        let ctx = sk_from.par.ks_ctx_at_level(0)?;
        let s_from = sk_from.poly(ctx)?;
        let ksk = KeySwitchingKey::from_public_key(pk_to, &s_from, rng)?;
        debug!(from = %sk_from.key_id, to = %pk_to.key_id, "generated re-encryption key");
        Ok(Self {
            ksk,
            from: sk_from.key_id,
            to: pk_to.key_id,
        })
    }

    /// Identifier of the key pair of the ciphertexts this key accepts.
    pub const fn from(&self) -> KeyId {
        self.from
    }

    /// Identifier of the key pair of the re-encrypted ciphertexts.
    pub const fn to(&self) -> KeyId {
        self.to
    }
}

impl FheParametrized for ReEncryptionKey {
    type Parameters = CryptoContext;
}

impl From<&ReEncryptionKey> for ReEncryptionKeyProto {
    fn from(value: &ReEncryptionKey) -> Self {
        ReEncryptionKeyProto {
            ksk: Some((&value.ksk).into()),
            from: value.from.as_bytes().to_vec(),
            to: value.to.as_bytes().to_vec(),
        }
    }
}

impl Serialize for ReEncryptionKey {
    fn to_bytes(&self) -> Vec<u8> {
        ReEncryptionKeyProto::from(self).encode_to_vec()
    }
}

impl DeserializeParametrized for ReEncryptionKey {
    type Error = Error;

    fn from_bytes(bytes: &[u8], par: &Arc<Self::Parameters>) -> Result<Self> {
        let proto: ReEncryptionKeyProto =
            Message::decode(bytes).map_err(|_| Error::SerializationError)?;
        let ksk = proto.ksk.as_ref().ok_or(Error::SerializationError)?;
        Ok(Self {
            ksk: KeySwitchingKey::try_from_proto(ksk, par)?,
            from: KeyId::try_from_slice(&proto.from)?,
            to: KeyId::try_from_slice(&proto.to)?,
        })
    }
}
