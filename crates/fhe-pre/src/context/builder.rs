//! Builder for crypto contexts.

use super::{
    bit_size,
    security::{SecurityLevel, DEGREES},
    BfvMaterial, Capabilities, CkksMaterial, CryptoContext, Feature, MultiplicationParameters,
    Scheme,
};
use crate::{Error, ParametersError, Result};
use fhe_math::{
    ntt::NttOperator,
    rns::ScalingFactor,
    rq::{scaler::Scaler, Context},
    zq::{primes::generate_prime, Modulus},
};
use itertools::Itertools;
use num_bigint::BigUint;
use num_complex::Complex64;
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::debug;

/// Largest size of a ciphertext modulus.
const MAX_MODULUS_SIZE: usize = 60;

/// Builder for a [`CryptoContext`].
///
/// Unless set explicitly, the ring dimension is the smallest one for which
/// the modulus chain required by the multiplicative depth fits the security
/// level.
#[derive(Debug, Clone)]
pub struct CryptoContextBuilder {
    scheme: Scheme,
    degree: Option<usize>,
    plaintext: u64,
    multiplicative_depth: usize,
    scaling_mod_size: usize,
    first_mod_size: usize,
    security_level: SecurityLevel,
    batch_size: usize,
    variance: usize,
    ciphertext_moduli: Vec<u64>,
    special_modulus: Option<u64>,
    capabilities: Capabilities,
}

impl CryptoContextBuilder {
    /// Creates a new instance of the builder for the given scheme.
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            degree: None,
            plaintext: 0,
            multiplicative_depth: 1,
            scaling_mod_size: 50,
            first_mod_size: 60,
            security_level: SecurityLevel::default(),
            batch_size: 0,
            variance: 10,
            ciphertext_moduli: vec![],
            special_modulus: None,
            capabilities: Capabilities::all(),
        }
    }

    /// Sets the plaintext modulus of a BFV context.
    pub fn set_plaintext_modulus(&mut self, plaintext: u64) -> &mut Self {
        self.plaintext = plaintext;
        self
    }

    /// Sets the number of sequential multiplications (and re-encryptions)
    /// the context must support.
    pub fn set_multiplicative_depth(&mut self, depth: usize) -> &mut Self {
        self.multiplicative_depth = depth;
        self
    }

    /// Sets the bit size of the CKKS scaling moduli, which is also the
    /// logarithm of the CKKS scale.
    pub fn set_scaling_mod_size(&mut self, size: usize) -> &mut Self {
        self.scaling_mod_size = size;
        self
    }

    /// Sets the bit size of the first CKKS modulus.
    pub fn set_first_mod_size(&mut self, size: usize) -> &mut Self {
        self.first_mod_size = size;
        self
    }

    /// Sets the security level.
    pub fn set_security_level(&mut self, level: SecurityLevel) -> &mut Self {
        self.security_level = level;
        self
    }

    /// Sets the ring dimension instead of deriving it from the security
    /// level.
    pub fn set_ring_dimension(&mut self, degree: usize) -> &mut Self {
        self.degree = Some(degree);
        self
    }

    /// Sets the number of slots of packed plaintexts. Zero selects the
    /// largest batch the ring dimension allows.
    pub fn set_batch_size(&mut self, batch_size: usize) -> &mut Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the error variance. Returns an error at build time if the
    /// variance is not between one and sixteen.
    pub fn set_variance(&mut self, variance: usize) -> &mut Self {
        self.variance = variance;
        self
    }

    /// Sets the ciphertext moduli and the special modulus instead of
    /// generating them. The ring dimension must then be set too.
    pub fn set_moduli(&mut self, moduli: &[u64], special_modulus: u64) -> &mut Self {
        self.ciphertext_moduli = moduli.to_owned();
        self.special_modulus = Some(special_modulus);
        self
    }

    /// Restricts the features of the context to `features` and their
    /// dependencies.
    pub fn set_features(&mut self, features: &[Feature]) -> &mut Self {
        self.capabilities = Capabilities::from_features(features);
        self
    }

    /// Build a new `CryptoContext` inside an `Arc`.
    pub fn build_arc(&self) -> Result<Arc<CryptoContext>> {
        self.build().map(Arc::new)
    }

    /// Build a new `CryptoContext`.
    pub fn build(&self) -> Result<CryptoContext> {
        self.check_scheme_parameters()?;
        if !(1..=16).contains(&self.variance) {
            return Err(Error::ParametersError(ParametersError::InvalidPlaintext(
                format!("The variance {} is not between 1 and 16", self.variance),
            )));
        }
        if let Some(degree) = self.degree {
            if !degree.is_power_of_two() || !(16..=32768).contains(&degree) {
                return Err(Error::ParametersError(ParametersError::InvalidDegree(
                    degree,
                )));
            }
        }

        let (degree, moduli, special_modulus) = if self.ciphertext_moduli.is_empty() {
            self.select_chain()?
        } else {
            self.explicit_chain()?
        };
        let batch_size = self.batch_size(degree)?;

        let moduli_sizes = moduli.iter().map(|m| bit_size(*m)).collect_vec();

        // The key switching context of level l holds q_0, ..., q_(L - l), P and
        // the ciphertext context of level l is its first child.
        let mut ks_ctx = Vec::with_capacity(moduli.len());
        let mut ctx = Vec::with_capacity(moduli.len());
        for i in 0..moduli.len() {
            let mut ks_moduli = moduli[..moduli.len() - i].to_vec();
            ks_moduli.push(special_modulus);
            let ks_ctx_i = Context::new_arc(&ks_moduli, degree)?;
            let ctx_i = ks_ctx_i
                .next_context()
                .cloned()
                .ok_or(Error::MathError(fhe_math::Error::NoMoreContext))?;
            ks_ctx.push(ks_ctx_i);
            ctx.push(ctx_i);
        }

        let (bfv, ckks) = match self.scheme {
            Scheme::Bfv => (Some(self.bfv_material(degree, &moduli, &ctx)?), None),
            Scheme::Ckks => (None, Some(self.ckks_material(degree))),
        };

        debug!(
            scheme = ?self.scheme,
            degree,
            moduli = ?moduli,
            special_modulus,
            batch_size,
            "built crypto context"
        );

        Ok(CryptoContext {
            scheme: self.scheme,
            polynomial_degree: degree,
            plaintext_modulus: self.plaintext,
            moduli: moduli.into_boxed_slice(),
            moduli_sizes: moduli_sizes.into_boxed_slice(),
            special_modulus,
            multiplicative_depth: self.multiplicative_depth,
            scaling_mod_size: self.scaling_mod_size,
            first_mod_size: self.first_mod_size,
            batch_size,
            security_level: self.security_level,
            capabilities: self.capabilities,
            variance: self.variance,
            ctx,
            ks_ctx,
            bfv,
            ckks,
        })
    }

    fn check_scheme_parameters(&self) -> Result<()> {
        match self.scheme {
            Scheme::Bfv => {
                if self.plaintext == 0 {
                    return Err(Error::ParametersError(ParametersError::TooFewSpecified(
                        "A Bfv context requires a plaintext modulus".to_string(),
                    )));
                }
                Modulus::new(self.plaintext).map_err(|e| {
                    Error::ParametersError(ParametersError::InvalidPlaintext(e.to_string()))
                })?;
                if self.ciphertext_moduli.contains(&self.plaintext) {
                    return Err(Error::ParametersError(ParametersError::InvalidPlaintext(
                        "The plaintext modulus is one of the ciphertext moduli".to_string(),
                    )));
                }
            }
            Scheme::Ckks => {
                if self.plaintext != 0 {
                    return Err(Error::ParametersError(ParametersError::TooManySpecified(
                        "A Ckks context does not take a plaintext modulus".to_string(),
                    )));
                }
                if !(20..=59).contains(&self.scaling_mod_size) {
                    return Err(Error::ParametersError(ParametersError::InvalidModulusSize(
                        self.scaling_mod_size,
                        20,
                        59,
                    )));
                }
                if self.first_mod_size <= self.scaling_mod_size
                    || self.first_mod_size > MAX_MODULUS_SIZE
                {
                    return Err(Error::ParametersError(ParametersError::InvalidModulusSize(
                        self.first_mod_size,
                        self.scaling_mod_size + 1,
                        MAX_MODULUS_SIZE,
                    )));
                }
            }
        }
        Ok(())
    }

    /// Sizes of the ciphertext moduli for a ring dimension.
    fn moduli_sizes(&self, degree: usize) -> Vec<usize> {
        match self.scheme {
            Scheme::Bfv => {
                // Room for the plaintext, the fresh noise and, per level, the
                // noise growth of a multiplication by a fresh ciphertext.
                let t_bits = bit_size(self.plaintext - 1);
                let log_n = degree.ilog2() as usize;
                let bits = t_bits + 30 + self.multiplicative_depth * (t_bits + log_n + 10);
                let count = bits.div_ceil(MAX_MODULUS_SIZE);
                vec![bits.div_ceil(count); count]
            }
            Scheme::Ckks => std::iter::once(self.first_mod_size)
                .chain(std::iter::repeat(self.scaling_mod_size).take(self.multiplicative_depth))
                .collect(),
        }
    }

    fn special_modulus_size(sizes: &[usize]) -> usize {
        (sizes.iter().max().copied().unwrap_or_default() + 1).min(61)
    }

    fn minimum_degree(&self) -> usize {
        match self.scheme {
            Scheme::Bfv => self.batch_size.max(16),
            Scheme::Ckks => (2 * self.batch_size).max(16),
        }
    }

    /// Picks the ring dimension and generates the moduli.
    fn select_chain(&self) -> Result<(usize, Vec<u64>, u64)> {
        let candidates = match self.degree {
            Some(degree) => vec![degree],
            None if self.security_level == SecurityLevel::NotSet => {
                return Err(Error::ParametersError(ParametersError::TooFewSpecified(
                    "The ring dimension must be set when the security level is not set"
                        .to_string(),
                )))
            }
            None => DEGREES
                .into_iter()
                .filter(|d| *d >= self.minimum_degree())
                .collect(),
        };

        for degree in &candidates {
            let sizes = self.moduli_sizes(*degree);
            let special_size = Self::special_modulus_size(&sizes);
            let log_qp = sizes.iter().sum::<usize>() + special_size;
            match self.security_level.max_log_qp(*degree) {
                Some(max) if log_qp > max => {
                    if self.degree.is_some() {
                        return Err(Error::ParametersError(
                            ParametersError::InsecureParameters {
                                degree: *degree,
                                log_qp,
                                max,
                            },
                        ));
                    }
                }
                _ => {
                    let moduli = generate_moduli(&sizes, *degree, &[self.plaintext])?;
                    let mut exclude = moduli.clone();
                    exclude.push(self.plaintext);
                    let special = generate_moduli(&[special_size], *degree, &exclude)?;
                    return Ok((*degree, moduli, special[0]));
                }
            }
        }

        Err(Error::ParametersError(ParametersError::NoValidModulusChain(
            format!(
                "a depth of {} does not fit any ring dimension at {:?}",
                self.multiplicative_depth, self.security_level
            ),
        )))
    }

    /// Validates explicitly provided moduli.
    fn explicit_chain(&self) -> Result<(usize, Vec<u64>, u64)> {
        let degree = self.degree.ok_or_else(|| {
            Error::ParametersError(ParametersError::TooFewSpecified(
                "The ring dimension must be set along with the moduli".to_string(),
            ))
        })?;
        let special = self.special_modulus.ok_or_else(|| {
            Error::ParametersError(ParametersError::TooFewSpecified(
                "The special modulus must be set along with the moduli".to_string(),
            ))
        })?;
        let log_qp = self
            .ciphertext_moduli
            .iter()
            .chain(std::iter::once(&special))
            .map(|m| bit_size(*m))
            .sum::<usize>();
        if let Some(max) = self.security_level.max_log_qp(degree) {
            if log_qp > max {
                return Err(Error::ParametersError(
                    ParametersError::InsecureParameters {
                        degree,
                        log_qp,
                        max,
                    },
                ));
            }
        }
        Ok((degree, self.ciphertext_moduli.clone(), special))
    }

    fn batch_size(&self, degree: usize) -> Result<usize> {
        let max = match self.scheme {
            Scheme::Bfv => degree,
            Scheme::Ckks => degree / 2,
        };
        match self.batch_size {
            0 => Ok(max),
            b if b.is_power_of_two() && b <= max => Ok(b),
            b => Err(Error::ParametersError(ParametersError::InvalidBatchSize(b))),
        }
    }

    fn bfv_material(
        &self,
        degree: usize,
        moduli: &[u64],
        ctx: &[Arc<Context>],
    ) -> Result<BfvMaterial> {
        let plaintext = Modulus::new(self.plaintext)?;
        let t = BigUint::from(self.plaintext);
        let op = NttOperator::new(&plaintext, degree).map(Arc::new);

        // Extended basis for the tensor product, made of 62-bit primes.
        let mut extended_basis = vec![];
        let mut upper_bound = 1 << 62;
        let n_extended = (moduli.iter().map(|m| bit_size(*m)).sum::<usize>() + 60).div_ceil(62);
        while extended_basis.len() != n_extended {
            upper_bound = generate_prime(62, 2 * degree as u64, upper_bound)
                .ok_or(Error::ParametersError(ParametersError::NotEnoughPrimes(
                    62, degree,
                )))?;
            if !moduli.contains(&upper_bound) {
                extended_basis.push(upper_bound)
            }
        }

        let last_ctx = ctx.last().ok_or(Error::MathError(fhe_math::Error::InvalidContext))?;
        let mut delta = Vec::with_capacity(ctx.len());
        let mut scalers = Vec::with_capacity(ctx.len());
        let mut mul_params = Vec::with_capacity(ctx.len());
        for ctx_i in ctx {
            let q = ctx_i.modulus();
            let delta_i = q / &t;
            delta.push(
                ctx_i
                    .moduli_operators()
                    .iter()
                    .map(|qj| qj.reduce_biguint(&delta_i))
                    .collect_vec()
                    .into_boxed_slice(),
            );

            scalers.push(Scaler::new(
                ctx_i,
                last_ctx,
                ScalingFactor::new(&t, q),
            )?);

            let modulus_size = ctx_i.moduli().iter().map(|m| bit_size(*m)).sum::<usize>();
            let n_moduli = (modulus_size + 60).div_ceil(62);
            let mul_moduli = [ctx_i.moduli(), &extended_basis[..n_moduli]].concat();
            let mul_ctx = Context::new_arc(&mul_moduli, degree)?;
            mul_params.push(MultiplicationParameters {
                extender: Scaler::new(ctx_i, &mul_ctx, ScalingFactor::one())?,
                down_scaler: Scaler::new(&mul_ctx, ctx_i, ScalingFactor::new(&t, q))?,
                to: mul_ctx,
            });
        }

        Ok(BfvMaterial {
            plaintext,
            op,
            delta: delta.into_boxed_slice(),
            scalers: scalers.into_boxed_slice(),
            mul_params: mul_params.into_boxed_slice(),
            matrix_reps_index_map: matrix_reps_index_map(degree).into_boxed_slice(),
        })
    }

    fn ckks_material(&self, degree: usize) -> CkksMaterial {
        let m = 2 * degree;
        let mut rot_group = Vec::with_capacity(degree / 2);
        let mut five_pow = 1;
        for _ in 0..degree / 2 {
            rot_group.push(five_pow);
            five_pow = (five_pow * 5) % m;
        }
        let ksi_pows = (0..m)
            .map(|k| Complex64::from_polar(1.0, 2.0 * PI * k as f64 / m as f64))
            .collect_vec();
        CkksMaterial {
            scale: 2f64.powi(self.scaling_mod_size as i32),
            rot_group: rot_group.into_boxed_slice(),
            ksi_pows: ksi_pows.into_boxed_slice(),
        }
    }
}

/// Generate primes of the specified sizes, congruent to 1 modulo `2 * degree`
/// and distinct from each other and from `exclude`.
fn generate_moduli(moduli_sizes: &[usize], degree: usize, exclude: &[u64]) -> Result<Vec<u64>> {
    let mut moduli = vec![];
    for size in moduli_sizes {
        if *size > 61 || *size < 10 {
            return Err(Error::ParametersError(ParametersError::InvalidModulusSize(
                *size, 10, 61,
            )));
        }

        let mut upper_bound = 1 << size;
        loop {
            if let Some(prime) = generate_prime(*size, 2 * degree as u64, upper_bound) {
                if !moduli.contains(&prime) && !exclude.contains(&prime) {
                    moduli.push(prime);
                    break;
                } else {
                    upper_bound = prime;
                }
            } else {
                return Err(Error::ParametersError(ParametersError::NotEnoughPrimes(
                    *size, degree,
                )));
            }
        }
    }

    Ok(moduli)
}

/// Slot positions of the batch encoder, following the ordering of SEAL:
/// slot `i` of the first row is the evaluation at `psi^(3^i)` and slot `i`
/// of the second row the evaluation at `psi^(-3^i)`.
fn matrix_reps_index_map(degree: usize) -> Vec<usize> {
    let row_size = degree >> 1;
    let m = degree << 1;
    let gen = 3;
    let mut pos = 1;
    let mut map = vec![0usize; degree];
    for i in 0..row_size {
        let index1 = (pos - 1) >> 1;
        let index2 = (m - pos - 1) >> 1;
        map[i] = index1.reverse_bits() >> (degree.leading_zeros() + 1);
        map[row_size | i] = index2.reverse_bits() >> (degree.leading_zeros() + 1);
        pos *= gen;
        pos &= m - 1;
    }
    map
}

#[cfg(test)]
mod tests {
    use super::{generate_moduli, matrix_reps_index_map};
    use crate::{Error, ParametersError};
    use itertools::Itertools;

    #[test]
    fn moduli_are_distinct_ntt_primes() -> Result<(), Box<dyn std::error::Error>> {
        let moduli = generate_moduli(&[40, 40, 40], 1024, &[])?;
        assert!(moduli.iter().all_unique());
        for m in &moduli {
            assert_eq!(m % 2048, 1);
            assert!(fhe_util::is_prime(*m));
        }
        let other = generate_moduli(&[40], 1024, &moduli)?;
        assert!(!moduli.contains(&other[0]));

        assert_eq!(
            generate_moduli(&[62], 1024, &[]).err(),
            Some(Error::ParametersError(ParametersError::InvalidModulusSize(
                62, 10, 61
            )))
        );
        Ok(())
    }

    #[test]
    fn index_map_is_a_permutation() {
        let map = matrix_reps_index_map(16);
        assert_eq!(map[0], 0);
        assert_eq!(map.iter().sorted().copied().collect_vec(), (0..16).collect_vec());
    }
}
