//! Multiplication of ciphertexts.

use super::aligned;
use crate::{Ciphertext, Error, Feature, RelinearizationKey, Result, Scheme};
use fhe_math::rq::Poly;
use tracing::trace;

/// Homomorphic multiplication of two ciphertexts encrypted under the key pair
/// of the relinearization key. The result consumes one more level of
/// multiplicative depth than the deeper operand; the operation is rejected
/// before any computation when the context does not allow it.
pub fn eval_mult(
    lhs: &Ciphertext,
    rhs: &Ciphertext,
    rk: &RelinearizationKey,
) -> Result<Ciphertext> {
    lhs.par.require(Feature::LeveledShe)?;
    if lhs.par != rk.ksk.par {
        return Err(Error::ParametersMismatch);
    }
    let (lhs, rhs) = aligned(lhs, rhs)?;
    if lhs.key_id != rk.key_id {
        return Err(Error::KeyMismatch {
            expected: rk.key_id,
            found: lhs.key_id,
        });
    }
    if lhs.c.len() != 2 || rhs.c.len() != 2 {
        return Err(Error::DefaultError(
            "Multiplication can only be performed on ciphertexts of size 2".to_string(),
        ));
    }

    let par = &lhs.par;
    let depth = lhs.depth.max(rhs.depth) + 1;
    if depth > par.multiplicative_depth() {
        return Err(Error::DepthExceeded {
            required: depth,
            available: par.multiplicative_depth(),
        });
    }
    if par.scheme() == Scheme::Ckks && lhs.level >= par.max_level() {
        return Err(Error::DepthExceeded {
            required: lhs.level + 1,
            available: par.max_level(),
        });
    }

    let mut product = match par.scheme() {
        Scheme::Bfv => bfv_tensor(&lhs, &rhs)?,
        Scheme::Ckks => ckks_tensor(&lhs, &rhs),
    };
    product.depth = depth;
    rk.relinearizes(&mut product)?;
    if par.scheme() == Scheme::Ckks {
        product.mod_switch_to_next_level()?;
    }
    trace!(level = product.level, depth, "multiplied ciphertexts");
    Ok(product)
}

/// Tensor product `(c00 c10, c00 c11 + c01 c10, c01 c11)` computed exactly in
/// an extended basis, then scaled by `t / Q`.
fn bfv_tensor(lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
    let mp = &lhs.par.bfv()?.mul_params[lhs.level];

    // Extend
    let extend = |p: &Poly| mp.extender.scale(p);
    let c00 = extend(&lhs.c[0])?;
    let c01 = extend(&lhs.c[1])?;
    let c10 = extend(&rhs.c[0])?;
    let c11 = extend(&rhs.c[1])?;

    // Multiply
    let c0 = &c00 * &c10;
    let mut c1 = &c00 * &c11;
    c1 += &(&c01 * &c10);
    let c2 = &c01 * &c11;

    // Scale down
    let c = [c0, c1, c2]
        .iter()
        .map(|ci| mp.down_scaler.scale(ci))
        .collect::<std::result::Result<Vec<_>, fhe_math::Error>>()?;

    Ok(Ciphertext {
        c,
        ..lhs.clone()
    })
}

/// Tensor product modulo the ciphertext modulus; the scales multiply.
fn ckks_tensor(lhs: &Ciphertext, rhs: &Ciphertext) -> Ciphertext {
    let c0 = &lhs.c[0] * &rhs.c[0];
    let mut c1 = &lhs.c[0] * &rhs.c[1];
    c1 += &(&lhs.c[1] * &rhs.c[0]);
    let c2 = &lhs.c[1] * &rhs.c[1];
    Ciphertext {
        c: vec![c0, c1, c2],
        scale: lhs.scale * rhs.scale,
        ..lhs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::eval_mult;
    use crate::{
        CryptoContextBuilder, Encoding, Error, KeyPair, Plaintext, RelinearizationKey, Scheme,
        SecurityLevel,
    };
    use fhe_math::zq::Modulus;
    use fhe_traits::{FheDecoder, FheDecrypter, FheEncoder, FheEncrypter};
    use rand::thread_rng;
    use std::error::Error as StdError;

    #[test]
    fn bfv_mul() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Bfv)
            .set_plaintext_modulus(65537)
            .set_multiplicative_depth(2)
            .set_ring_dimension(64)
            .set_security_level(SecurityLevel::NotSet)
            .build_arc()?;
        let kp = KeyPair::generate(&cc, &mut rng)?;
        let rk = RelinearizationKey::new(&kp.secret_key, &mut rng)?;
        let t = Modulus::new(65537)?;

        for _ in 0..5 {
            let a = t.random_vec(64, &mut rng);
            let b = t.random_vec(64, &mut rng);
            let pa = Plaintext::try_encode(a.as_slice(), Encoding::packed(), &cc)?;
            let pb = Plaintext::try_encode(b.as_slice(), Encoding::packed(), &cc)?;
            let ca = kp.public_key.try_encrypt(&pa, &mut rng)?;
            let cb = kp.public_key.try_encrypt(&pb, &mut rng)?;

            let ab = eval_mult(&ca, &cb, &rk)?;
            assert_eq!(ab.depth(), 1);
            assert_eq!(ab.len(), 2);
            let mut expected = a.clone();
            t.mul_vec(&mut expected, &b);
            let decrypted = kp.secret_key.try_decrypt(&ab)?;
            assert_eq!(Vec::<u64>::try_decode(&decrypted, Encoding::packed())?, expected);

            let abb = eval_mult(&ab, &cb, &rk)?;
            assert_eq!(abb.depth(), 2);
            t.mul_vec(&mut expected, &b);
            let decrypted = kp.secret_key.try_decrypt(&abb)?;
            assert_eq!(Vec::<u64>::try_decode(&decrypted, Encoding::packed())?, expected);

            assert_eq!(
                eval_mult(&abb, &ca, &rk).err(),
                Some(Error::DepthExceeded {
                    required: 3,
                    available: 2
                })
            );
        }
        Ok(())
    }

    #[test]
    fn ckks_mul() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Ckks)
            .set_scaling_mod_size(40)
            .set_first_mod_size(55)
            .set_multiplicative_depth(2)
            .set_ring_dimension(64)
            .set_batch_size(8)
            .set_security_level(SecurityLevel::NotSet)
            .build_arc()?;
        let kp = KeyPair::generate(&cc, &mut rng)?;
        let rk = RelinearizationKey::new(&kp.secret_key, &mut rng)?;
        let a = [1.0, 2.0, 3.0, -0.5];
        let b = [4.0, 0.0, 6.0, 0.25];
        let pa = Plaintext::try_encode(&a as &[f64], Encoding::packed(), &cc)?;
        let pb = Plaintext::try_encode(&b as &[f64], Encoding::packed(), &cc)?;
        let ca = kp.public_key.try_encrypt(&pa, &mut rng)?;
        let cb = kp.public_key.try_encrypt(&pb, &mut rng)?;

        let ab = eval_mult(&ca, &cb, &rk)?;
        assert_eq!(ab.level(), 1);
        assert_eq!(ab.depth(), 1);
        let mut pt = kp.secret_key.try_decrypt(&ab)?;
        pt.set_length(4);
        let values = Vec::<f64>::try_decode(&pt, Encoding::packed())?;
        for ((x, y), v) in a.iter().zip(b.iter()).zip(values.iter()) {
            assert!((x * y - v).abs() < 1e-4);
        }

        let abb = eval_mult(&ab, &ab, &rk)?;
        assert_eq!(abb.level(), 2);
        assert!(matches!(
            eval_mult(&abb, &abb, &rk),
            Err(Error::DepthExceeded { .. })
        ));
        Ok(())
    }
}
