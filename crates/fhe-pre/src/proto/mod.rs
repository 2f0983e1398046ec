//! Protobuf messages for the types of this crate.

/// Messages for contexts, ciphertexts and keys.
pub mod pre;
