//! Keys: secret and public keys, evaluation keys and re-encryption keys.

mod eval_sum_key;
mod key_id;
mod key_switching_key;
mod public_key;
mod re_encryption_key;
mod relinearization_key;
mod secret_key;

pub use eval_sum_key::{EvalSumKey, GaloisKey};
pub use key_id::KeyId;
pub(crate) use key_switching_key::KeySwitchingKey;
pub use public_key::PublicKey;
pub use re_encryption_key::ReEncryptionKey;
pub use relinearization_key::RelinearizationKey;
pub use secret_key::SecretKey;

use crate::{CryptoContext, Feature, Result};
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use tracing::debug;

/// A key pair. The two halves are meant to be handed to different owners:
/// the public key can be shared freely while the secret key stays with the
/// party that generated it.
#[derive(Debug)]
pub struct KeyPair {
    /// The public key.
    pub public_key: PublicKey,
    /// The secret key.
    pub secret_key: SecretKey,
}

impl KeyPair {
    /// Generate a fresh key pair in the given context.
    pub fn generate<R: RngCore + CryptoRng>(
        par: &Arc<CryptoContext>,
        rng: &mut R,
    ) -> Result<Self> {
        par.require(Feature::PublicKeyEncryption)?;
        let mut secret_key = SecretKey::random(par, rng)?;
        let public_key = PublicKey::new(&secret_key, rng)?;
        secret_key.key_id = public_key.key_id;
        debug!(key_id = %public_key.key_id, "generated key pair");
        Ok(Self {
            public_key,
            secret_key,
        })
    }

    /// Identifier of the key pair.
    pub fn key_id(&self) -> KeyId {
        self.public_key.key_id
    }

    /// Split the key pair into its public and secret halves.
    pub fn into_parts(self) -> (PublicKey, SecretKey) {
        (self.public_key, self.secret_key)
    }
}
