#![crate_name = "fhe_pre"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Multi-key leveled homomorphic encryption with proxy re-encryption.
//!
//! A [`CryptoContext`] fixes the scheme (BFV over integers modulo a
//! plaintext modulus, or CKKS over approximate complex numbers), the ring
//! dimension and the RNS modulus chain. Parties generate independent
//! [`KeyPair`]s under the same context; ciphertexts remember the
//! [`KeyId`] they are encrypted under, and a [`ReEncryptionKey`] lets an
//! untrusted proxy convert a ciphertext from one key to another without
//! learning the plaintext.
//!
//! ```
//! use fhe_pre::{CryptoContextBuilder, Encoding, KeyPair, Plaintext, ReEncryptionKey, Scheme};
//! use fhe_traits::{FheDecoder, FheDecrypter, FheEncoder, FheEncrypter};
//! use rand::thread_rng;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut rng = thread_rng();
//! let cc = CryptoContextBuilder::new(Scheme::Bfv)
//!     .set_plaintext_modulus(65537)
//!     .set_multiplicative_depth(1)
//!     .set_ring_dimension(1024)
//!     .set_security_level(fhe_pre::SecurityLevel::NotSet)
//!     .build_arc()?;
//!
//! let alice = KeyPair::generate(&cc, &mut rng)?;
//! let bob = KeyPair::generate(&cc, &mut rng)?;
//!
//! let pt = Plaintext::try_encode(&[1u64, 2, 3] as &[u64], Encoding::packed(), &cc)?;
//! let ct = alice.public_key.try_encrypt(&pt, &mut rng)?;
//!
//! let rk = ReEncryptionKey::new(&alice.secret_key, &bob.public_key, &mut rng)?;
//! let ct_bob = fhe_pre::re_encrypt(&ct, &rk)?;
//!
//! let decrypted = bob.secret_key.try_decrypt(&ct_bob)?;
//! let values = Vec::<u64>::try_decode(&decrypted, Encoding::packed())?;
//! assert_eq!(&values[..3], &[1, 2, 3]);
//! # Ok(())
//! # }
//! ```

mod ciphertext;
mod context;
mod encoding;
mod errors;
mod keys;
mod ops;
mod plaintext;
mod proto;

pub use ciphertext::Ciphertext;
pub use context::{
    Capabilities, CryptoContext, CryptoContextBuilder, Feature, Scheme, SecurityLevel,
};
pub use encoding::Encoding;
pub use errors::{Error, ParametersError, Result};
pub use keys::{
    EvalSumKey, GaloisKey, KeyId, KeyPair, PublicKey, ReEncryptionKey, RelinearizationKey,
    SecretKey,
};
pub use ops::{
    eval_add, eval_add_plain, eval_mult, eval_negate, eval_sub, eval_sum, re_encrypt,
    re_encrypt_rerandomized,
};
pub use plaintext::Plaintext;
