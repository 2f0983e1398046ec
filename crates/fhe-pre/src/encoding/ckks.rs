//! Canonical embedding used by the CKKS packed encoding.
//!
//! Slot `j` of a plaintext holds the evaluation of the plaintext polynomial
//! at `zeta^(5^j)`, with `zeta` a primitive `2n`-th root of unity. Sparse
//! packings with `s < n / 2` slots use the subring generated by
//! `X^(n / 2s)`.

use crate::context::CkksMaterial;
use num_complex::Complex64;

fn bit_reverse(values: &mut [Complex64]) {
    let n = values.len();
    let mut j = 0;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            values.swap(i, j);
        }
    }
}

/// Evaluate the slots from the `values.len()` complex coefficients of the
/// subring polynomial.
fn emb(values: &mut [Complex64], ckks: &CkksMaterial) {
    let size = values.len();
    let m = ckks.ksi_pows.len();
    bit_reverse(values);
    let mut len = 2;
    while len <= size {
        let lenh = len >> 1;
        let lenq = len << 2;
        for i in (0..size).step_by(len) {
            for j in 0..lenh {
                let idx = (ckks.rot_group[j] % lenq) * m / lenq;
                let u = values[i + j];
                let v = values[i + j + lenh] * ckks.ksi_pows[idx];
                values[i + j] = u + v;
                values[i + j + lenh] = u - v;
            }
        }
        len <<= 1;
    }
}

/// Inverse of [`emb`].
fn emb_inv(values: &mut [Complex64], ckks: &CkksMaterial) {
    let size = values.len();
    let m = ckks.ksi_pows.len();
    let mut len = size;
    while len >= 2 {
        let lenh = len >> 1;
        let lenq = len << 2;
        for i in (0..size).step_by(len) {
            for j in 0..lenh {
                let idx = (lenq - ckks.rot_group[j] % lenq) * m / lenq;
                let u = values[i + j] + values[i + j + lenh];
                let v = (values[i + j] - values[i + j + lenh]) * ckks.ksi_pows[idx];
                values[i + j] = u;
                values[i + j + lenh] = v;
            }
        }
        len >>= 1;
    }
    bit_reverse(values);
    let size_inv = 1.0 / size as f64;
    values.iter_mut().for_each(|v| *v *= size_inv);
}

/// Real coefficients of the polynomial whose first `slots` slots hold
/// `values`, zero-padded to `slots` values.
pub(crate) fn slots_to_coefficients(
    values: &[Complex64],
    slots: usize,
    degree: usize,
    ckks: &CkksMaterial,
) -> Vec<f64> {
    let nh = degree / 2;
    let gap = nh / slots;
    let mut u = vec![Complex64::default(); slots];
    u.iter_mut().zip(values).for_each(|(ui, vi)| *ui = *vi);
    emb_inv(&mut u, ckks);

    let mut coefficients = vec![0f64; degree];
    for (i, ui) in u.iter().enumerate() {
        coefficients[i * gap] = ui.re;
        coefficients[nh + i * gap] = ui.im;
    }
    coefficients
}

/// The first `slots` slots of the polynomial with real coefficients
/// `coefficients`.
pub(crate) fn coefficients_to_slots(
    coefficients: &[f64],
    slots: usize,
    ckks: &CkksMaterial,
) -> Vec<Complex64> {
    let nh = coefficients.len() / 2;
    let gap = nh / slots;
    let mut values = (0..slots)
        .map(|i| Complex64::new(coefficients[i * gap], coefficients[nh + i * gap]))
        .collect::<Vec<_>>();
    emb(&mut values, ckks);
    values
}

#[cfg(test)]
mod tests {
    use super::{coefficients_to_slots, slots_to_coefficients};
    use crate::context::CkksMaterial;
    use num_complex::Complex64;
    use proptest::prelude::*;
    use std::f64::consts::PI;

    const DEGREE: usize = 32;

    fn material() -> CkksMaterial {
        let m = 2 * DEGREE;
        let rot_group = (0..DEGREE / 2)
            .scan(1usize, |pow, _| {
                let current = *pow;
                *pow = (*pow * 5) % m;
                Some(current)
            })
            .collect::<Vec<_>>();
        CkksMaterial {
            scale: 1.0,
            rot_group: rot_group.into_boxed_slice(),
            ksi_pows: (0..m)
                .map(|k| Complex64::from_polar(1.0, 2.0 * PI * k as f64 / m as f64))
                .collect(),
        }
    }

    fn negacyclic_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
        let n = a.len();
        let mut c = vec![0f64; n];
        for i in 0..n {
            for j in 0..n {
                if i + j < n {
                    c[i + j] += a[i] * b[j];
                } else {
                    c[i + j - n] -= a[i] * b[j];
                }
            }
        }
        c
    }

    fn close(a: &[Complex64], b: &[Complex64]) -> bool {
        a.iter().zip(b).all(|(x, y)| (x - y).norm() < 1e-9)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn slot_wise_product(
            values in prop::collection::vec(-8.0f64..8.0, 32),
            log_slots in 0usize..5,
        ) {
            let ckks = material();
            let slots = 1 << log_slots;
            let z1 = values[..slots].iter().map(|x| Complex64::new(*x, 0.0)).collect::<Vec<_>>();
            let z2 = values[16..16 + slots]
                .iter()
                .map(|x| Complex64::new(*x, -x / 2.0))
                .collect::<Vec<_>>();

            let p1 = slots_to_coefficients(&z1, slots, DEGREE, &ckks);
            let p2 = slots_to_coefficients(&z2, slots, DEGREE, &ckks);
            prop_assert!(close(&coefficients_to_slots(&p1, slots, &ckks), &z1));

            let product = coefficients_to_slots(&negacyclic_mul(&p1, &p2), slots, &ckks);
            let expected = z1.iter().zip(&z2).map(|(a, b)| a * b).collect::<Vec<_>>();
            prop_assert!(close(&product, &expected));
        }
    }

    #[test]
    fn substitution_rotates_slots() {
        let ckks = material();
        for slots in [4, 16] {
            let z = (0..slots)
                .map(|i| Complex64::new(i as f64 + 1.0, 0.0))
                .collect::<Vec<_>>();
            let p = slots_to_coefficients(&z, slots, DEGREE, &ckks);

            // X -> X^5 in the negacyclic ring.
            let mut q = vec![0f64; DEGREE];
            for (i, c) in p.iter().enumerate() {
                let k = (5 * i) % (2 * DEGREE);
                if k < DEGREE {
                    q[k] += c;
                } else {
                    q[k - DEGREE] -= c;
                }
            }

            let mut rotated = z.clone();
            rotated.rotate_left(1);
            assert!(close(&coefficients_to_slots(&q, slots, &ckks), &rotated));
        }
    }
}
