//! Homomorphic operations on ciphertexts.
//!
//! Binary operations require both operands to be encrypted under the same
//! key pair. Ciphertexts at different levels are first brought to the deeper
//! of the two levels.

mod mul;
mod pre;
mod sum;

pub use mul::eval_mult;
pub use pre::{re_encrypt, re_encrypt_rerandomized};
pub use sum::eval_sum;

use crate::{Ciphertext, Error, Feature, Plaintext, Result, Scheme};
use std::borrow::Cow;

/// Relative tolerance on the equality of CKKS scales.
const SCALE_TOLERANCE: f64 = 1e-6;

/// Checks that two ciphertexts can be combined, and returns them at the same
/// level.
pub(crate) fn aligned<'a>(
    lhs: &'a Ciphertext,
    rhs: &'a Ciphertext,
) -> Result<(Cow<'a, Ciphertext>, Cow<'a, Ciphertext>)> {
    if lhs.par != rhs.par {
        return Err(Error::ParametersMismatch);
    }
    if lhs.key_id != rhs.key_id {
        return Err(Error::KeyMismatch {
            expected: lhs.key_id,
            found: rhs.key_id,
        });
    }
    if lhs.par.scheme() == Scheme::Ckks && !same_scale(lhs.scale, rhs.scale) {
        return Err(Error::ScaleMismatch(lhs.scale, rhs.scale));
    }

    let level = lhs.level.max(rhs.level);
    let bring = |ct: &'a Ciphertext| -> Result<Cow<'a, Ciphertext>> {
        if ct.level == level {
            Ok(Cow::Borrowed(ct))
        } else {
            let mut ct = ct.clone();
            ct.drop_to_level(level)?;
            Ok(Cow::Owned(ct))
        }
    };
    Ok((bring(lhs)?, bring(rhs)?))
}

pub(crate) fn same_scale(a: f64, b: f64) -> bool {
    (a - b).abs() <= SCALE_TOLERANCE * a.abs().max(b.abs())
}

/// Homomorphic addition of two ciphertexts.
pub fn eval_add(lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
    lhs.par.require(Feature::LeveledShe)?;
    let (lhs, rhs) = aligned(lhs, rhs)?;
    let mut out = lhs.into_owned();
    for (i, ci) in rhs.c.iter().enumerate() {
        match out.c.get_mut(i) {
            Some(oi) => *oi += ci,
            None => out.c.push(ci.clone()),
        }
    }
    out.depth = out.depth.max(rhs.depth);
    Ok(out)
}

/// Homomorphic subtraction of two ciphertexts.
pub fn eval_sub(lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
    lhs.par.require(Feature::LeveledShe)?;
    let (lhs, rhs) = aligned(lhs, rhs)?;
    let mut out = lhs.into_owned();
    for (i, ci) in rhs.c.iter().enumerate() {
        match out.c.get_mut(i) {
            Some(oi) => *oi -= ci,
            None => out.c.push(-ci),
        }
    }
    out.depth = out.depth.max(rhs.depth);
    Ok(out)
}

/// Homomorphic negation of a ciphertext.
pub fn eval_negate(ct: &Ciphertext) -> Result<Ciphertext> {
    ct.par.require(Feature::LeveledShe)?;
    let mut out = ct.clone();
    out.c = ct.c.iter().map(|ci| -ci).collect();
    Ok(out)
}

/// Homomorphic addition of a plaintext to a ciphertext. The plaintext is
/// brought to the level and, for CKKS, to the scale of the ciphertext.
pub fn eval_add_plain(ct: &Ciphertext, pt: &Plaintext) -> Result<Ciphertext> {
    ct.par.require(Feature::LeveledShe)?;
    if ct.par != pt.par {
        return Err(Error::ParametersMismatch);
    }
    let mut out = ct.clone();
    if pt.level == ct.level && (ct.par.scheme() == Scheme::Bfv || pt.scale == ct.scale) {
        out.c[0] += &pt.poly_ntt;
    } else {
        let m = Plaintext::scaled_poly(&ct.par, &pt.value, ct.level, ct.scale)?;
        out.c[0] += &m;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{eval_add, eval_add_plain, eval_negate, eval_sub};
    use crate::{
        Ciphertext, CryptoContextBuilder, Encoding, Error, KeyPair, Plaintext, Scheme,
        SecurityLevel,
    };
    use fhe_traits::{FheDecoder, FheDecrypter, FheEncoder, FheEncrypter};
    use rand::thread_rng;
    use std::error::Error as StdError;

    #[test]
    fn bfv_add_sub_negate() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Bfv)
            .set_plaintext_modulus(65537)
            .set_multiplicative_depth(2)
            .set_ring_dimension(32)
            .set_security_level(SecurityLevel::NotSet)
            .build_arc()?;
        let kp = KeyPair::generate(&cc, &mut rng)?;
        let a = [1i64, 2, 3];
        let b = [4i64, 0, 6];
        let pa = Plaintext::try_encode(&a as &[i64], Encoding::packed(), &cc)?;
        let pb = Plaintext::try_encode(&b as &[i64], Encoding::packed(), &cc)?;
        let ca = kp.public_key.try_encrypt(&pa, &mut rng)?;
        let mut cb = kp.public_key.try_encrypt(&pb, &mut rng)?;
        cb.mod_switch_to_next_level()?;

        let decrypt = |ct: &Ciphertext| -> Result<Vec<i64>, Box<dyn StdError>> {
            let mut pt = kp.secret_key.try_decrypt(ct)?;
            pt.set_length(3);
            Ok(Vec::<i64>::try_decode(&pt, Encoding::packed())?)
        };

        let sum = eval_add(&ca, &cb)?;
        assert_eq!(sum.level(), 1);
        assert_eq!(decrypt(&sum)?, vec![5, 2, 9]);
        assert_eq!(decrypt(&eval_sub(&ca, &cb)?)?, vec![-3, 2, -3]);
        assert_eq!(decrypt(&eval_negate(&ca)?)?, vec![-1, -2, -3]);
        assert_eq!(decrypt(&eval_add_plain(&cb, &pa)?)?, vec![5, 2, 9]);
        Ok(())
    }

    #[test]
    fn ckks_add() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Ckks)
            .set_scaling_mod_size(40)
            .set_first_mod_size(50)
            .set_multiplicative_depth(2)
            .set_ring_dimension(32)
            .set_batch_size(8)
            .set_security_level(SecurityLevel::NotSet)
            .build_arc()?;
        let kp = KeyPair::generate(&cc, &mut rng)?;
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 0.0, 6.0];
        let pa = Plaintext::try_encode(&a as &[f64], Encoding::packed(), &cc)?;
        let pb = Plaintext::try_encode(&b as &[f64], Encoding::packed(), &cc)?;
        let ca = kp.public_key.try_encrypt(&pa, &mut rng)?;
        let mut cb = kp.public_key.try_encrypt(&pb, &mut rng)?;
        cb.drop_to_level(1)?;

        for (ct, expected) in [
            (eval_add(&ca, &cb)?, [5.0, 2.0, 9.0]),
            (eval_sub(&ca, &cb)?, [-3.0, 2.0, -3.0]),
            (eval_add_plain(&cb, &pa)?, [5.0, 2.0, 9.0]),
        ] {
            let mut pt = kp.secret_key.try_decrypt(&ct)?;
            pt.set_length(3);
            let values = Vec::<f64>::try_decode(&pt, Encoding::packed())?;
            assert!(values.iter().zip(expected).all(|(v, e)| (v - e).abs() < 1e-6));
        }

        let mut rescaled = ca.clone();
        rescaled.mod_switch_to_next_level()?;
        assert!(matches!(
            eval_add(&rescaled, &cb),
            Err(Error::ScaleMismatch(_, _))
        ));
        Ok(())
    }

    #[test]
    fn key_mismatch() -> Result<(), Box<dyn StdError>> {
        let mut rng = thread_rng();
        let cc = CryptoContextBuilder::new(Scheme::Bfv)
            .set_plaintext_modulus(65537)
            .set_ring_dimension(32)
            .set_security_level(SecurityLevel::NotSet)
            .build_arc()?;
        let alice = KeyPair::generate(&cc, &mut rng)?;
        let bob = KeyPair::generate(&cc, &mut rng)?;
        let pt = Plaintext::try_encode(&[1u64] as &[u64], Encoding::packed(), &cc)?;
        let ca = alice.public_key.try_encrypt(&pt, &mut rng)?;
        let cb = bob.public_key.try_encrypt(&pt, &mut rng)?;
        assert_eq!(
            eval_add(&ca, &cb).err(),
            Some(Error::KeyMismatch {
                expected: alice.key_id(),
                found: bob.key_id(),
            })
        );
        assert!(matches!(
            bob.secret_key.try_decrypt(&ca),
            Err(Error::KeyMismatch { .. })
        ));
        Ok(())
    }
}
