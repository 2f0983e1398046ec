#![crate_name = "fhe_util"]
#![crate_type = "lib"]
#![warn(missing_docs, unused_imports)]

//! Utilities shared by the fhe-pre crates.

use num_bigint_dig::{prime::probably_prime, BigUint};
use num_traits::ToPrimitive;
use rand::{CryptoRng, RngCore};

/// Returns whether `p` is prime (with overwhelming probability).
pub fn is_prime(p: u64) -> bool {
    probably_prime(&BigUint::from(p), 0)
}

/// Samples `vector_size` values from a centered binomial distribution of the
/// given `variance`.
///
/// The variance must be a multiple of 1/2 between 1/2 and 16, which covers
/// the ternary secrets (variance 1/2) and the error distributions used by the
/// engine.
pub fn sample_vec_cbd<R: RngCore + CryptoRng>(
    vector_size: usize,
    variance: f32,
    rng: &mut R,
) -> Result<Vec<i64>, &'static str> {
    if !(0.5..=16.0).contains(&variance) || (2.0 * variance).fract() != 0.0 {
        return Err("The variance should be a multiple of 1/2 between 1/2 and 16");
    }

    // A sum of k coin differences has variance k/2.
    let k = (2.0 * variance).to_usize().ok_or("Invalid variance")?;
    let mut out = Vec::with_capacity(vector_size);
    let mut bytes = vec![0u8; (2 * k * vector_size).div_ceil(8)];
    rng.fill_bytes(&mut bytes);

    let mut bit = 0usize;
    let mut next_bit = || {
        let b = (bytes[bit >> 3] >> (bit & 7)) & 1;
        bit += 1;
        b as i64
    };
    for _ in 0..vector_size {
        let mut v = 0i64;
        for _ in 0..k {
            v += next_bit();
            v -= next_bit();
        }
        out.push(v);
    }
    Ok(out)
}

/// Computes the variance of a slice of signed values.
pub fn variance(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;
    values
        .iter()
        .map(|v| (*v as f64 - mean) * (*v as f64 - mean))
        .sum::<f64>()
        / n
}

#[cfg(test)]
mod tests {
    use super::{is_prime, sample_vec_cbd, variance};
    use proptest::prelude::*;
    use rand::thread_rng;

    proptest! {
        #[test]
        fn cbd_is_bounded(size in 1usize..200, half_var in 1u8..=32) {
            let var = half_var as f32 / 2.0;
            let v = sample_vec_cbd(size, var, &mut thread_rng()).unwrap();
            prop_assert_eq!(v.len(), size);
            prop_assert!(v.iter().all(|vi| vi.unsigned_abs() <= half_var as u64));
        }
    }

    #[test]
    fn prime() {
        assert!(is_prime(2));
        assert!(is_prime(3));
        assert!(is_prime(5));
        assert!(is_prime(7));
        assert!(is_prime(65537));
        assert!(is_prime(4611686018326724609));

        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(!is_prime(4));
        assert!(!is_prime(65535));
        assert!(!is_prime(4611686018326724607));
    }

    #[test]
    fn cbd_variance() {
        let mut rng = thread_rng();
        assert!(sample_vec_cbd(10, 0.0, &mut rng).is_err());
        assert!(sample_vec_cbd(10, 0.3, &mut rng).is_err());
        assert!(sample_vec_cbd(10, 16.5, &mut rng).is_err());

        for var in [0.5f32, 1.0, 10.0, 16.0] {
            let v = sample_vec_cbd(20000, var, &mut rng).unwrap();
            let bound = (2.0 * var) as i64;
            assert!(v.iter().all(|vi| vi.abs() <= bound));
            let observed = variance(&v);
            assert!((observed - var as f64).abs() < 0.1 * var as f64 + 0.05);
        }
    }

    #[test]
    fn ternary() {
        let mut rng = thread_rng();
        let v = sample_vec_cbd(1000, 0.5, &mut rng).unwrap();
        assert!(v.iter().all(|vi| (-1..=1).contains(vi)));
    }
}
