//! Residue-Number System operations.

use crate::{zq::Modulus, Error, Result};
use itertools::izip;
use ndarray::ArrayView1;
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use std::{cmp::Ordering, fmt::Debug};

/// Context for a Residue Number System.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct RnsContext {
    moduli_u64: Box<[u64]>,
    moduli: Box<[Modulus]>,
    garner: Box<[BigUint]>,
    product: BigUint,
    half_product: BigUint,
}

impl Debug for RnsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RnsContext")
            .field("moduli_u64", &self.moduli_u64)
            .field("product", &self.product)
            .finish()
    }
}

const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl RnsContext {
    /// Create a RNS context from a list of moduli.
    ///
    /// Returns an error if the list is empty, or if the moduli are not
    /// pairwise coprime.
    pub fn new(moduli_u64: &[u64]) -> Result<Self> {
        if moduli_u64.is_empty() {
            return Err(Error::Default("The list of moduli is empty".to_string()));
        }
        for (i, qi) in moduli_u64.iter().enumerate() {
            if moduli_u64[i + 1..].iter().any(|qj| gcd(*qi, *qj) != 1) {
                return Err(Error::Default(
                    "The moduli are not pairwise coprime".to_string(),
                ));
            }
        }

        let moduli = moduli_u64
            .iter()
            .map(|qi| Modulus::new(*qi))
            .collect::<Result<Vec<_>>>()?;
        let product = moduli_u64
            .iter()
            .fold(BigUint::one(), |acc, qi| acc * *qi);

        // garner_i = (Q / q_i) * [(Q / q_i)^(-1)]_{q_i}
        let mut garner = Vec::with_capacity(moduli.len());
        for qi in &moduli {
            let q_star = &product / qi.modulus();
            let q_tilde = qi
                .inv(qi.reduce_biguint(&q_star))
                .ok_or(Error::Default("Could not invert the CRT factor".to_string()))?;
            garner.push(q_star * q_tilde);
        }

        Ok(Self {
            moduli_u64: moduli_u64.to_vec().into_boxed_slice(),
            moduli: moduli.into_boxed_slice(),
            garner: garner.into_boxed_slice(),
            half_product: &product >> 1,
            product,
        })
    }

    /// Returns the product of the moduli used when creating the RNS context.
    pub const fn modulus(&self) -> &BigUint {
        &self.product
    }

    /// Returns the moduli of the RNS context.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli_u64
    }

    /// Project a BigUint into its rests.
    pub fn project(&self, a: &BigUint) -> Vec<u64> {
        self.moduli.iter().map(|qi| qi.reduce_biguint(a)).collect()
    }

    /// Project a signed BigInt into its rests.
    pub fn project_signed(&self, a: &BigInt) -> Vec<u64> {
        self.moduli.iter().map(|qi| qi.reduce_bigint(a)).collect()
    }

    /// Lift rests into a BigUint in [0, Q).
    ///
    /// Aborts if the number of rests differs from the number of moduli in
    /// debug mode.
    pub fn lift(&self, rests: ArrayView1<u64>) -> BigUint {
        debug_assert_eq!(rests.len(), self.moduli_u64.len());

        let mut result = BigUint::zero();
        izip!(rests.iter(), self.garner.iter()).for_each(|(ri, gi)| result += gi * *ri);
        result % &self.product
    }

    /// Lift rests into a BigInt in (-Q/2, Q/2].
    pub fn lift_centered(&self, rests: ArrayView1<u64>) -> BigInt {
        let x = self.lift(rests);
        match x.cmp(&self.half_product) {
            Ordering::Greater => BigInt::from(x) - BigInt::from(self.product.clone()),
            _ => BigInt::from(x),
        }
    }
}

/// Rational factor `numerator / denominator` by which polynomials are scaled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalingFactor {
    pub(crate) numerator: BigUint,
    pub(crate) denominator: BigUint,
    pub(crate) is_one: bool,
}

impl ScalingFactor {
    /// Create a new scaling factor. Aborts if the denominator is 0.
    pub fn new(numerator: &BigUint, denominator: &BigUint) -> Self {
        assert_ne!(denominator, &BigUint::zero());
        Self {
            numerator: numerator.clone(),
            denominator: denominator.clone(),
            is_one: numerator == denominator,
        }
    }

    /// Returns the identity scaling factor.
    pub fn one() -> Self {
        Self {
            numerator: BigUint::one(),
            denominator: BigUint::one(),
            is_one: true,
        }
    }

    /// Scale a signed integer and round to the nearest integer.
    pub fn scale(&self, x: &BigInt) -> BigInt {
        if self.is_one {
            return x.clone();
        }
        let num = BigInt::from(self.numerator.clone());
        let den = BigInt::from(self.denominator.clone());
        let prod: BigInt = x * num;
        let half: BigInt = &den >> 1usize;
        if prod.sign() == num_bigint::Sign::Minus {
            -((-prod + half) / den)
        } else {
            (prod + half) / den
        }
    }
}
