//! Crypto context shared by every object of a computation.

mod builder;
mod capabilities;
mod security;

pub use builder::CryptoContextBuilder;
pub use capabilities::{Capabilities, Feature};
pub use security::SecurityLevel;

use crate::proto::pre::Parameters;
use crate::{Error, ParametersError, Result};
use fhe_math::{
    ntt::NttOperator,
    rq::{scaler::Scaler, Context},
    zq::Modulus,
};
use fhe_traits::{Deserialize, FheParameters, Serialize};
use num_complex::Complex64;
use prost::Message;
use std::fmt::Debug;
use std::sync::Arc;

/// The homomorphic encryption scheme of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Exact arithmetic on integers modulo a plaintext modulus.
    Bfv,
    /// Approximate arithmetic on complex numbers.
    Ckks,
}

/// Material specific to the BFV scheme, indexed by level where relevant.
pub(crate) struct BfvMaterial {
    /// Plaintext modulus `t`.
    pub(crate) plaintext: Modulus,

    /// Ntt operator modulo `t` for packed plaintexts, if `t` allows it.
    pub(crate) op: Option<Arc<NttOperator>>,

    /// `floor(Q_l / t)` reduced modulo each modulus of level `l`.
    pub(crate) delta: Box<[Box<[u64]>]>,

    /// Scale `t / Q_l` into the context of the last level.
    pub(crate) scalers: Box<[Scaler]>,

    pub(crate) mul_params: Box<[MultiplicationParameters]>,

    /// Position of each slot within the evaluations of the plaintext
    /// polynomial modulo `t`.
    pub(crate) matrix_reps_index_map: Box<[usize]>,
}

/// Material specific to the CKKS scheme.
pub(crate) struct CkksMaterial {
    /// Scale of fresh plaintexts.
    pub(crate) scale: f64,

    /// Powers of 5 modulo `2n`, for the first `n / 2` exponents.
    pub(crate) rot_group: Box<[usize]>,

    /// Primitive `2n`-th roots of unity `exp(2 i pi k / 2n)`.
    pub(crate) ksi_pows: Box<[Complex64]>,
}

/// Crypto context for a multi-key computation.
///
/// The context fixes the scheme, the ring dimension, the RNS modulus chain
/// `q_0, ..., q_L` and the special modulus `P` used for key switching.
/// Ciphertexts at level `l` live modulo `q_0 ... q_(L - l)`.
pub struct CryptoContext {
    scheme: Scheme,
    polynomial_degree: usize,
    plaintext_modulus: u64,
    moduli: Box<[u64]>,
    moduli_sizes: Box<[usize]>,
    special_modulus: u64,
    multiplicative_depth: usize,
    scaling_mod_size: usize,
    first_mod_size: usize,
    batch_size: usize,
    security_level: SecurityLevel,
    capabilities: Capabilities,

    /// Error variance
    pub(crate) variance: usize,

    /// Ciphertext contexts, one per level.
    pub(crate) ctx: Vec<Arc<Context>>,

    /// Key switching contexts, one per level, with the special modulus
    /// appended to the moduli of the corresponding ciphertext context.
    pub(crate) ks_ctx: Vec<Arc<Context>>,

    pub(crate) bfv: Option<BfvMaterial>,
    pub(crate) ckks: Option<CkksMaterial>,
}

impl Debug for CryptoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoContext")
            .field("scheme", &self.scheme)
            .field("polynomial_degree", &self.polynomial_degree)
            .field("plaintext_modulus", &self.plaintext_modulus)
            .field("moduli", &self.moduli)
            .field("special_modulus", &self.special_modulus)
            .field("multiplicative_depth", &self.multiplicative_depth)
            .finish()
    }
}

impl PartialEq for CryptoContext {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
            && self.polynomial_degree == other.polynomial_degree
            && self.plaintext_modulus == other.plaintext_modulus
            && self.moduli == other.moduli
            && self.special_modulus == other.special_modulus
            && self.multiplicative_depth == other.multiplicative_depth
            && self.scaling_mod_size == other.scaling_mod_size
            && self.batch_size == other.batch_size
            && self.variance == other.variance
            && self.capabilities == other.capabilities
    }
}

impl Eq for CryptoContext {}

impl FheParameters for CryptoContext {}

impl CryptoContext {
    /// Returns the scheme of this context.
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns the ring dimension.
    pub const fn degree(&self) -> usize {
        self.polynomial_degree
    }

    /// Returns the plaintext modulus for BFV contexts.
    pub const fn plaintext_modulus(&self) -> Option<u64> {
        match self.scheme {
            Scheme::Bfv => Some(self.plaintext_modulus),
            Scheme::Ckks => None,
        }
    }

    /// Returns the ciphertext moduli `q_0, ..., q_L`.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Returns the bit sizes of the ciphertext moduli.
    pub fn moduli_sizes(&self) -> &[usize] {
        &self.moduli_sizes
    }

    /// Returns the special modulus used for key switching.
    pub const fn special_modulus(&self) -> u64 {
        self.special_modulus
    }

    /// Returns the number of sequential multiplications supported.
    pub const fn multiplicative_depth(&self) -> usize {
        self.multiplicative_depth
    }

    /// Returns the bit size of the CKKS scaling moduli.
    pub const fn scaling_mod_size(&self) -> usize {
        self.scaling_mod_size
    }

    /// Returns the bit size of the first CKKS modulus.
    pub const fn first_mod_size(&self) -> usize {
        self.first_mod_size
    }

    /// Returns the number of slots of packed plaintexts.
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns the target security level.
    pub const fn security_level(&self) -> SecurityLevel {
        self.security_level
    }

    /// Returns the enabled features.
    pub const fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Returns the error variance.
    pub const fn variance(&self) -> usize {
        self.variance
    }

    /// Returns the scale of fresh CKKS plaintexts.
    pub fn scale(&self) -> Option<f64> {
        self.ckks.as_ref().map(|ckks| ckks.scale)
    }

    /// Returns the maximum level allowed by these parameters.
    pub fn max_level(&self) -> usize {
        self.moduli.len() - 1
    }

    /// Bit size of the product of all the moduli, including the special one.
    pub fn log_qp(&self) -> usize {
        self.moduli_sizes.iter().sum::<usize>() + bit_size(self.special_modulus)
    }

    /// Whether a feature is enabled.
    pub const fn is_enabled(&self, feature: Feature) -> bool {
        self.capabilities.contains(feature)
    }

    pub(crate) fn require(&self, feature: Feature) -> Result<()> {
        if self.is_enabled(feature) {
            Ok(())
        } else {
            Err(Error::FeatureNotEnabled(feature))
        }
    }

    pub(crate) fn require_scheme(&self, scheme: Scheme) -> Result<()> {
        if self.scheme == scheme {
            Ok(())
        } else {
            Err(Error::DefaultError(format!(
                "Operation requires a {scheme:?} context"
            )))
        }
    }

    /// Returns the context corresponding to the level.
    pub(crate) fn ctx_at_level(&self, level: usize) -> Result<&Arc<Context>> {
        self.ctx
            .get(level)
            .ok_or_else(|| Error::DefaultError("No context".to_string()))
    }

    /// Returns the key switching context corresponding to the level.
    pub(crate) fn ks_ctx_at_level(&self, level: usize) -> Result<&Arc<Context>> {
        self.ks_ctx
            .get(level)
            .ok_or_else(|| Error::DefaultError("No context".to_string()))
    }

    pub(crate) fn bfv(&self) -> Result<&BfvMaterial> {
        self.bfv
            .as_ref()
            .ok_or_else(|| Error::DefaultError("Operation requires a Bfv context".to_string()))
    }

    pub(crate) fn ckks(&self) -> Result<&CkksMaterial> {
        self.ckks
            .as_ref()
            .ok_or_else(|| Error::DefaultError("Operation requires a Ckks context".to_string()))
    }
}

pub(crate) fn bit_size(value: u64) -> usize {
    64 - value.leading_zeros() as usize
}

/// Multiplication parameters
#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct MultiplicationParameters {
    pub(crate) extender: Scaler,
    pub(crate) down_scaler: Scaler,
    pub(crate) to: Arc<Context>,
}

impl Serialize for CryptoContext {
    fn to_bytes(&self) -> Vec<u8> {
        Parameters {
            scheme: match self.scheme {
                Scheme::Bfv => 1,
                Scheme::Ckks => 2,
            },
            degree: self.polynomial_degree as u32,
            plaintext: self.plaintext_modulus,
            moduli: self.moduli.to_vec(),
            special_modulus: self.special_modulus,
            variance: self.variance as u32,
            multiplicative_depth: self.multiplicative_depth as u32,
            scaling_mod_size: self.scaling_mod_size as u32,
            first_mod_size: self.first_mod_size as u32,
            batch_size: self.batch_size as u32,
            security_level: self.security_level.to_i32(),
            features: self.capabilities.bits(),
        }
        .encode_to_vec()
    }
}

impl Deserialize for CryptoContext {
    type Error = Error;

    fn try_deserialize(bytes: &[u8]) -> Result<Self> {
        let params: Parameters =
            Message::decode(bytes).map_err(|_| Error::SerializationError)?;
        let scheme = match params.scheme {
            1 => Scheme::Bfv,
            2 => Scheme::Ckks,
            _ => return Err(Error::SerializationError),
        };
        let security_level =
            SecurityLevel::from_i32(params.security_level).ok_or(Error::SerializationError)?;
        let capabilities =
            Capabilities::from_bits(params.features).ok_or(Error::SerializationError)?;
        if params.moduli.is_empty() {
            return Err(Error::ParametersError(ParametersError::TooFewSpecified(
                "The serialized context has no moduli".to_string(),
            )));
        }

        let mut builder = CryptoContextBuilder::new(scheme);
        builder
            .set_ring_dimension(params.degree as usize)
            .set_moduli(&params.moduli, params.special_modulus)
            .set_variance(params.variance as usize)
            .set_multiplicative_depth(params.multiplicative_depth as usize)
            .set_batch_size(params.batch_size as usize)
            .set_security_level(security_level)
            .set_features(&capabilities.iter().collect::<Vec<_>>());
        match scheme {
            Scheme::Bfv => builder.set_plaintext_modulus(params.plaintext),
            Scheme::Ckks => builder
                .set_scaling_mod_size(params.scaling_mod_size as usize)
                .set_first_mod_size(params.first_mod_size as usize),
        };
        builder.build()
    }
}
