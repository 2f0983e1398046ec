//! Identifiers binding ciphertexts and evaluation keys to a key pair.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::fmt::{Debug, Display};

const KEY_ID_SIZE: usize = 8;

/// Identifier of a key pair, derived from a hash of the public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct KeyId([u8; KEY_ID_SIZE]);

impl KeyId {
    /// Creates an identifier from its bytes.
    pub const fn from_bytes(bytes: [u8; KEY_ID_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the bytes of the identifier.
    pub const fn as_bytes(&self) -> &[u8; KEY_ID_SIZE] {
        &self.0
    }

    pub(crate) fn digest(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        let mut bytes = [0u8; KEY_ID_SIZE];
        bytes.copy_from_slice(&hash[..KEY_ID_SIZE]);
        Self(bytes)
    }

    pub(crate) fn try_from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_ID_SIZE] = bytes.try_into().map_err(|_| Error::SerializationError)?;
        Ok(Self(bytes))
    }
}

impl Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl Debug for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KeyId({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::KeyId;

    #[test]
    fn digest() {
        let a = KeyId::digest(b"alice");
        assert_eq!(a, KeyId::digest(b"alice"));
        assert_ne!(a, KeyId::digest(b"bob"));
        // First bytes of SHA-256("abc").
        assert_eq!(KeyId::digest(b"abc").to_string(), "ba7816bf8f01cfea");
        assert_eq!(format!("{:?}", KeyId::from_bytes([0; 8])), "KeyId(0000000000000000)");
    }

    #[test]
    fn from_slice() {
        let id = KeyId::digest(b"carol");
        assert_eq!(KeyId::try_from_slice(id.as_bytes()).ok(), Some(id));
        assert!(KeyId::try_from_slice(&[1, 2, 3]).is_err());
    }
}
