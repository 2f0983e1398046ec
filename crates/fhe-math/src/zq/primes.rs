//! Generation of NTT-friendly primes.

use fhe_util::is_prime;

/// Returns the largest prime `p` of exactly `num_bits` bits such that
/// `p < upper_bound` and `p = 1 mod modulo`, if one exists.
///
/// Aborts in debug mode if `num_bits` is not in [10, 62] or if `modulo` is not
/// a power of two.
pub fn generate_prime(num_bits: usize, modulo: u64, upper_bound: u64) -> Option<u64> {
    debug_assert!((10..=62).contains(&num_bits));
    debug_assert!(modulo.is_power_of_two());

    let lower_bound = 1u64 << (num_bits - 1);
    let upper_bound = upper_bound.min(1u64 << num_bits);
    if upper_bound <= lower_bound + 1 {
        return None;
    }

    // Largest candidate below the bound that is 1 modulo `modulo`.
    let mut candidate = upper_bound - 1;
    candidate -= (candidate + modulo - 1) % modulo;
    while candidate >= lower_bound {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate = candidate.checked_sub(modulo)?;
    }
    None
}
