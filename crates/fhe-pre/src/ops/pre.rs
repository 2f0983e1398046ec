//! Proxy re-encryption.

use crate::{Ciphertext, Error, Feature, PublicKey, ReEncryptionKey, Result};
use rand::{CryptoRng, RngCore};
use tracing::debug;

/// Re-encrypt a ciphertext under the target key pair of `rk`, without
/// decrypting it. The ciphertext must be encrypted under the source key pair
/// of `rk`; re-encryption consumes one level of multiplicative depth.
pub fn re_encrypt(ct: &Ciphertext, rk: &ReEncryptionKey) -> Result<Ciphertext> {
    ct.par.require(Feature::ProxyReEncryption)?;
    if ct.par != rk.ksk.par {
        return Err(Error::ParametersMismatch);
    }
    if ct.key_id != rk.from {
        return Err(Error::KeyMismatch {
            expected: rk.from,
            found: ct.key_id,
        });
    }
    if ct.c.len() != 2 {
        return Err(Error::DefaultError(
            "Only ciphertexts of size 2 can be re-encrypted".to_string(),
        ));
    }
    let depth = ct.depth + 1;
    if depth > ct.par.multiplicative_depth() {
        return Err(Error::DepthExceeded {
            required: depth,
            available: ct.par.multiplicative_depth(),
        });
    }

    let (d0, d1) = rk.ksk.key_switch(&ct.c[1], ct.level)?;
    debug!(from = %rk.from, to = %rk.to, level = ct.level, "re-encrypted ciphertext");
    Ok(Ciphertext {
        c: vec![&ct.c[0] + &d0, d1],
        depth,
        key_id: rk.to,
        ..ct.clone()
    })
}

/// Re-encrypt a ciphertext after adding a fresh encryption of zero under the
/// source public key, so that the output cannot be linked to the input.
pub fn re_encrypt_rerandomized<R: RngCore + CryptoRng>(
    ct: &Ciphertext,
    rk: &ReEncryptionKey,
    pk_from: &PublicKey,
    rng: &mut R,
) -> Result<Ciphertext> {
    if pk_from.key_id != rk.from {
        return Err(Error::KeyMismatch {
            expected: rk.from,
            found: pk_from.key_id,
        });
    }
    if ct.par != pk_from.par {
        return Err(Error::ParametersMismatch);
    }
    let (z0, z1) = pk_from.encrypt_zero(ct.level, rng)?;
    let mut randomized = ct.clone();
    if randomized.c.len() != 2 {
        return Err(Error::DefaultError(
            "Only ciphertexts of size 2 can be re-encrypted".to_string(),
        ));
    }
    randomized.c[0] += &z0;
    randomized.c[1] += &z1;
    re_encrypt(&randomized, rk)
}

#[cfg(test)]
mod tests {
    use super::{re_encrypt, re_encrypt_rerandomized};
    use crate::{
        CryptoContextBuilder, Encoding, Error, KeyPair, Plaintext, ReEncryptionKey, Scheme,
        SecurityLevel,
    };
    use fhe_traits::{FheDecoder, FheDecrypter, FheEncoder, FheEncrypter};
    use rand::thread_rng;
    use std::error::Error as StdError;

    #[test]
    fn bfv_re_encrypt() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Bfv)
            .set_plaintext_modulus(65537)
            .set_multiplicative_depth(2)
            .set_ring_dimension(64)
            .set_security_level(SecurityLevel::NotSet)
            .build_arc()?;
        let alice = KeyPair::generate(&cc, &mut rng)?;
        let bob = KeyPair::generate(&cc, &mut rng)?;
        let carol = KeyPair::generate(&cc, &mut rng)?;
        let ab = ReEncryptionKey::new(&alice.secret_key, &bob.public_key, &mut rng)?;
        let bc = ReEncryptionKey::new(&bob.secret_key, &carol.public_key, &mut rng)?;

        let values = (0..64u64).map(|i| i * 997).collect::<Vec<_>>();
        let pt = Plaintext::try_encode(values.as_slice(), Encoding::packed(), &cc)?;
        let ct = alice.public_key.try_encrypt(&pt, &mut rng)?;

        let ct_bob = re_encrypt(&ct, &ab)?;
        assert_eq!(ct_bob.key_id(), bob.key_id());
        assert_eq!(ct_bob.depth(), 1);
        assert_eq!(ct_bob.level(), ct.level());
        let decrypted = bob.secret_key.try_decrypt(&ct_bob)?;
        assert_eq!(Vec::<u64>::try_decode(&decrypted, Encoding::packed())?, values);
        assert!(matches!(
            alice.secret_key.try_decrypt(&ct_bob),
            Err(Error::KeyMismatch { .. })
        ));

        // Chained re-encryption consumes the remaining depth.
        let ct_carol = re_encrypt(&ct_bob, &bc)?;
        let decrypted = carol.secret_key.try_decrypt(&ct_carol)?;
        assert_eq!(Vec::<u64>::try_decode(&decrypted, Encoding::packed())?, values);
        assert!(matches!(
            re_encrypt(&ct_carol, &bc),
            Err(Error::KeyMismatch { .. })
        ));

        assert_eq!(
            re_encrypt(&ct_bob, &ab).err(),
            Some(Error::KeyMismatch {
                expected: alice.key_id(),
                found: bob.key_id(),
            })
        );
        Ok(())
    }

    #[test]
    fn depth_exceeded() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Bfv)
            .set_plaintext_modulus(65537)
            .set_multiplicative_depth(1)
            .set_ring_dimension(32)
            .set_security_level(SecurityLevel::NotSet)
            .build_arc()?;
        let alice = KeyPair::generate(&cc, &mut rng)?;
        let bob = KeyPair::generate(&cc, &mut rng)?;
        let ab = ReEncryptionKey::new(&alice.secret_key, &bob.public_key, &mut rng)?;
        let ba = ReEncryptionKey::new(&bob.secret_key, &alice.public_key, &mut rng)?;
        let pt = Plaintext::try_encode(&[7u64] as &[u64], Encoding::packed(), &cc)?;
        let ct = alice.public_key.try_encrypt(&pt, &mut rng)?;
        let ct_bob = re_encrypt(&ct, &ab)?;
        for _ in 0..2 {
            assert_eq!(
                re_encrypt(&ct_bob, &ba).err(),
                Some(Error::DepthExceeded {
                    required: 2,
                    available: 1
                })
            );
        }
        Ok(())
    }

    #[test]
    fn ckks_rerandomized() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Ckks)
            .set_scaling_mod_size(40)
            .set_first_mod_size(50)
            .set_ring_dimension(32)
            .set_batch_size(4)
            .set_security_level(SecurityLevel::NotSet)
            .build_arc()?;
        let alice = KeyPair::generate(&cc, &mut rng)?;
        let bob = KeyPair::generate(&cc, &mut rng)?;
        let rk = ReEncryptionKey::new(&alice.secret_key, &bob.public_key, &mut rng)?;

        let values = [1.0, -2.0, 3.5];
        let pt = Plaintext::try_encode(&values as &[f64], Encoding::packed(), &cc)?;
        let ct = alice.public_key.try_encrypt(&pt, &mut rng)?;

        let plain = re_encrypt(&ct, &rk)?;
        let randomized = re_encrypt_rerandomized(&ct, &rk, &alice.public_key, &mut rng)?;
        assert_ne!(plain, randomized);
        for c in [plain, randomized] {
            let mut pt = bob.secret_key.try_decrypt(&c)?;
            pt.set_length(3);
            let decoded = Vec::<f64>::try_decode(&pt, Encoding::packed())?;
            assert!(values.iter().zip(&decoded).all(|(a, b)| (a - b).abs() < 1e-6));
        }

        assert!(matches!(
            re_encrypt_rerandomized(&ct, &rk, &bob.public_key, &mut rng),
            Err(Error::KeyMismatch { .. })
        ));
        Ok(())
    }
}
