//! Ring operations for moduli up to 62 bits.

pub mod primes;

use crate::{Error, Result};
use itertools::izip;
use num_bigint::{BigInt, BigUint};
use num_traits::{Signed, ToPrimitive};
use rand::{distributions::Uniform, CryptoRng, Rng, RngCore};

/// Structure holding a modulus up to 62 bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modulus {
    pub(crate) p: u64,
    half_p: u64,
}

impl Modulus {
    /// Create a modulus from an integer of at most 62 bits.
    pub fn new(p: u64) -> Result<Self> {
        if !(2..(1 << 62)).contains(&p) {
            Err(Error::InvalidModulus(p))
        } else {
            Ok(Self { p, half_p: p >> 1 })
        }
    }

    /// Returns the value of the modulus.
    pub const fn modulus(&self) -> u64 {
        self.p
    }

    /// Modular addition of a and b in constant time.
    ///
    /// Aborts if a >= p or b >= p in debug mode.
    pub const fn add(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        Self::reduce1(a + b, self.p)
    }

    /// Modular subtraction of a and b in constant time.
    ///
    /// Aborts if a >= p or b >= p in debug mode.
    pub const fn sub(&self, a: u64, b: u64) -> u64 {
        debug_assert!(a < self.p && b < self.p);
        Self::reduce1(a + self.p - b, self.p)
    }

    /// Modular negation.
    pub const fn neg(&self, a: u64) -> u64 {
        debug_assert!(a < self.p);
        Self::reduce1(self.p - a, self.p)
    }

    /// Modular multiplication of a and b.
    pub const fn mul(&self, a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % (self.p as u128)) as u64
    }

    /// Shoup representation of `a`, to be used in [`Self::mul_shoup`].
    pub const fn shoup(&self, a: u64) -> u64 {
        debug_assert!(a < self.p);
        (((a as u128) << 64) / (self.p as u128)) as u64
    }

    /// Shoup representation of a vector.
    pub fn shoup_vec(&self, a: &[u64]) -> Vec<u64> {
        a.iter().map(|ai| self.shoup(*ai)).collect()
    }

    /// Shoup multiplication of a and b, returning a value in [0, 2p).
    pub const fn lazy_mul_shoup(&self, a: u64, b: u64, b_shoup: u64) -> u64 {
        let q = ((a as u128 * b_shoup as u128) >> 64) as u64;
        a.wrapping_mul(b).wrapping_sub(q.wrapping_mul(self.p))
    }

    /// Shoup multiplication of a and b.
    pub const fn mul_shoup(&self, a: u64, b: u64, b_shoup: u64) -> u64 {
        Self::reduce1(self.lazy_mul_shoup(a, b, b_shoup), self.p)
    }

    /// Modular exponentiation.
    pub const fn pow(&self, a: u64, mut n: u64) -> u64 {
        let mut base = a;
        let mut r = 1 % self.p;
        while n > 0 {
            if n & 1 == 1 {
                r = self.mul(r, base);
            }
            base = self.mul(base, base);
            n >>= 1;
        }
        r
    }

    /// Modular inverse of `a`, or `None` if `a` is not invertible.
    pub fn inv(&self, a: u64) -> Option<u64> {
        let (mut r0, mut r1) = (self.p as i128, self.reduce(a) as i128);
        let (mut t0, mut t1) = (0i128, 1i128);
        while r1 != 0 {
            let q = r0 / r1;
            (r0, r1) = (r1, r0 - q * r1);
            (t0, t1) = (t1, t0 - q * t1);
        }
        if r0 != 1 {
            None
        } else {
            Some(t0.rem_euclid(self.p as i128) as u64)
        }
    }

    /// Reduce a u64 modulo p.
    pub const fn reduce(&self, a: u64) -> u64 {
        a % self.p
    }

    /// Reduce a u128 modulo p.
    pub const fn reduce_u128(&self, a: u128) -> u64 {
        (a % (self.p as u128)) as u64
    }

    /// Reduce an i64 modulo p.
    pub const fn reduce_i64(&self, a: i64) -> u64 {
        (a as i128).rem_euclid(self.p as i128) as u64
    }

    /// Reduce a big integer modulo p.
    pub fn reduce_biguint(&self, a: &BigUint) -> u64 {
        (a % self.p).to_u64().unwrap_or_default()
    }

    /// Reduce a signed big integer modulo p.
    pub fn reduce_bigint(&self, a: &BigInt) -> u64 {
        let r = self.reduce_biguint(a.magnitude());
        if a.is_negative() {
            self.neg(r)
        } else {
            r
        }
    }

    /// Centered representative of `a` in (-p/2, p/2].
    pub const fn center(&self, a: u64) -> i64 {
        debug_assert!(a < self.p);
        if a > self.half_p {
            a as i64 - self.p as i64
        } else {
            a as i64
        }
    }

    /// Conditional subtraction of p, returning a value in [0, p) when a < 2p.
    pub(crate) const fn reduce1(a: u64, p: u64) -> u64 {
        if a >= p {
            a - p
        } else {
            a
        }
    }

    /// Modular addition of vectors in place.
    pub fn add_vec(&self, a: &mut [u64], b: &[u64]) {
        debug_assert_eq!(a.len(), b.len());
        izip!(a.iter_mut(), b.iter()).for_each(|(ai, bi)| *ai = self.add(*ai, *bi));
    }

    /// Modular subtraction of vectors in place.
    pub fn sub_vec(&self, a: &mut [u64], b: &[u64]) {
        debug_assert_eq!(a.len(), b.len());
        izip!(a.iter_mut(), b.iter()).for_each(|(ai, bi)| *ai = self.sub(*ai, *bi));
    }

    /// Modular multiplication of vectors in place.
    pub fn mul_vec(&self, a: &mut [u64], b: &[u64]) {
        debug_assert_eq!(a.len(), b.len());
        izip!(a.iter_mut(), b.iter()).for_each(|(ai, bi)| *ai = self.mul(*ai, *bi));
    }

    /// Modular scalar multiplication of a vector in place.
    pub fn scalar_mul_vec(&self, a: &mut [u64], b: u64) {
        let b_shoup = self.shoup(b);
        a.iter_mut()
            .for_each(|ai| *ai = self.mul_shoup(*ai, b, b_shoup));
    }

    /// Modular negation of a vector in place.
    pub fn neg_vec(&self, a: &mut [u64]) {
        a.iter_mut().for_each(|ai| *ai = self.neg(*ai));
    }

    /// Reduce a vector of signed integers modulo p.
    pub fn reduce_vec_i64(&self, a: &[i64]) -> Vec<u64> {
        a.iter().map(|ai| self.reduce_i64(*ai)).collect()
    }

    /// Centered representatives of a vector.
    pub fn center_vec(&self, a: &[u64]) -> Vec<i64> {
        a.iter().map(|ai| self.center(*ai)).collect()
    }

    /// Sample a vector of uniformly random values modulo p.
    pub fn random_vec<R: RngCore + CryptoRng>(&self, size: usize, rng: &mut R) -> Vec<u64> {
        let distribution = Uniform::from(0..self.p);
        rng.sample_iter(distribution).take(size).collect()
    }
}
