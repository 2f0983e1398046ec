use crate::zq::Modulus;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Negacyclic Number-Theoretic Transform operator.
///
/// The forward transform evaluates a polynomial of `Z_p[X]/(X^n + 1)` at the
/// odd powers of a primitive `2n`-th root of unity `psi`, and outputs the
/// evaluations in bit-reversed order: index `k` holds the evaluation at
/// `psi^(2 * bitrev(k) + 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NttOperator {
    p: Modulus,
    size: usize,
    psi_powers: Box<[u64]>,
    psi_powers_shoup: Box<[u64]>,
    psi_inv_powers: Box<[u64]>,
    psi_inv_powers_shoup: Box<[u64]>,
    size_inv: u64,
    size_inv_shoup: u64,
}

impl NttOperator {
    /// Create an NTT operator given a modulus for a specific size.
    ///
    /// Returns None if the modulus does not support the NTT for this specific
    /// size.
    pub fn new(p: &Modulus, size: usize) -> Option<Self> {
        if !super::supports_ntt(p.p, size) {
            return None;
        }

        let size_inv = p.inv(size as u64)?;
        let psi = Self::primitive_root(size, p);
        let psi_inv = p.inv(psi)?;

        let shift = size.leading_zeros() + 1;
        let (psi_powers, psi_inv_powers): (Vec<u64>, Vec<u64>) = (0..size)
            .map(|i| {
                let e = (i.reverse_bits() >> shift) as u64;
                (p.pow(psi, e), p.pow(psi_inv, e))
            })
            .unzip();

        Some(Self {
            p: p.clone(),
            size,
            psi_powers_shoup: p.shoup_vec(&psi_powers).into_boxed_slice(),
            psi_powers: psi_powers.into_boxed_slice(),
            psi_inv_powers_shoup: p.shoup_vec(&psi_inv_powers).into_boxed_slice(),
            psi_inv_powers: psi_inv_powers.into_boxed_slice(),
            size_inv,
            size_inv_shoup: p.shoup(size_inv),
        })
    }

    /// Size of the transform.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Compute the forward NTT in place.
    /// Aborts if a is not of the size handled by the operator.
    pub fn forward(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.size);

        let mut t = self.size;
        let mut m = 1;
        while m < self.size {
            t >>= 1;
            for i in 0..m {
                let s = self.psi_powers[m + i];
                let s_shoup = self.psi_powers_shoup[m + i];
                let (lo, hi) = a[2 * i * t..2 * (i + 1) * t].split_at_mut(t);
                for (x, y) in lo.iter_mut().zip(hi.iter_mut()) {
                    let v = self.p.mul_shoup(*y, s, s_shoup);
                    *y = self.p.sub(*x, v);
                    *x = self.p.add(*x, v);
                }
            }
            m <<= 1;
        }
    }

    /// Compute the backward NTT in place.
    /// Aborts if a is not of the size handled by the operator.
    pub fn backward(&self, a: &mut [u64]) {
        assert_eq!(a.len(), self.size);

        let mut t = 1;
        let mut m = self.size;
        while m > 1 {
            let h = m >> 1;
            for i in 0..h {
                let s = self.psi_inv_powers[h + i];
                let s_shoup = self.psi_inv_powers_shoup[h + i];
                let (lo, hi) = a[2 * i * t..2 * (i + 1) * t].split_at_mut(t);
                for (x, y) in lo.iter_mut().zip(hi.iter_mut()) {
                    let u = *x;
                    *x = self.p.add(u, *y);
                    *y = self.p.mul_shoup(self.p.sub(u, *y), s, s_shoup);
                }
            }
            t <<= 1;
            m = h;
        }

        a.iter_mut()
            .for_each(|ai| *ai = self.p.mul_shoup(*ai, self.size_inv, self.size_inv_shoup));
    }

    /// Returns a primitive `2 * size`-th root of unity modulo p.
    ///
    /// The root is derived from a fixed seed so that two operators built for
    /// the same modulus and size are identical.
    fn primitive_root(size: usize, p: &Modulus) -> u64 {
        debug_assert!(super::supports_ntt(p.p, size));

        let lambda = (p.p - 1) / (2 * size as u64);
        let mut rng: ChaCha8Rng = SeedableRng::seed_from_u64(0);
        loop {
            let root = p.pow(rng.gen_range(1..p.p), lambda);
            // The order of `root` is exactly 2 * size iff root^size = -1.
            if p.pow(root, size as u64) == p.p - 1 {
                return root;
            }
        }
    }
}
