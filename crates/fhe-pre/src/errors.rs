use crate::{Feature, KeyId};
use thiserror::Error;

/// The Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

/// Enum encapsulating all the possible errors from this library.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Indicates that an error from the underlying mathematical library was
    /// encountered.
    #[error("{0}")]
    MathError(#[from] fhe_math::Error),

    /// Indicates a serialization error.
    #[error("Serialization error")]
    SerializationError,

    /// Indicates that too many values were provided.
    #[error("Too many values provided: {0} exceeds limit {1}")]
    TooManyValues(usize, usize),

    /// Indicates that too few values were provided.
    #[error("Too few values provided: {0} is below limit {1}")]
    TooFewValues(usize, usize),

    /// Indicates that the values could not be encoded or decoded.
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Indicates that an object is bound to a different key than expected.
    #[error("Key mismatch: expected {expected}, found {found}")]
    KeyMismatch {
        /// The key the operation requires.
        expected: KeyId,
        /// The key the object is bound to.
        found: KeyId,
    },

    /// Indicates that an operation would go beyond the multiplicative depth
    /// of the context.
    #[error("Multiplicative depth exceeded: {required} required, {available} available")]
    DepthExceeded {
        /// Depth the result would have.
        required: usize,
        /// Multiplicative depth of the context.
        available: usize,
    },

    /// Indicates that an operation requires a feature which was not enabled
    /// on the context.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(Feature),

    /// Indicates that two CKKS ciphertexts have incompatible scales.
    #[error("Scale mismatch: {0} and {1}")]
    ScaleMismatch(f64, f64),

    /// Indicates that objects from different contexts were combined.
    #[error("Objects belong to different crypto contexts")]
    ParametersMismatch,

    /// Indicates an error related to the construction of a context.
    #[error("{0}")]
    ParametersError(#[from] ParametersError),

    /// Indicates a default error
    #[error("{0}")]
    DefaultError(String),
}

/// Separate enum to indicate parameters-related errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParametersError {
    /// Indicates that the degree is invalid.
    #[error("Invalid degree: {0} is not a power of 2 between 16 and 32768")]
    InvalidDegree(usize),

    /// Indicates that the moduli sizes are invalid.
    #[error("Invalid modulus size: {0}, expected an integer between {1} and {2}")]
    InvalidModulusSize(usize, usize, usize),

    /// Indicates that there exists not enough primes of this size.
    #[error("Not enough primes of size {0} for polynomials of degree {1}")]
    NotEnoughPrimes(usize, usize),

    /// Indicates that the plaintext is invalid.
    #[error("{0}")]
    InvalidPlaintext(String),

    /// Indicates that the batch size is invalid.
    #[error("Invalid batch size: {0}")]
    InvalidBatchSize(usize),

    /// Indicates that too many parameters were specified.
    #[error("{0}")]
    TooManySpecified(String),

    /// Indicates that too few parameters were specified.
    #[error("{0}")]
    TooFewSpecified(String),

    /// Indicates that no ring dimension supports the requested modulus chain
    /// at the requested security level.
    #[error("No valid modulus chain: {0}")]
    NoValidModulusChain(String),

    /// Indicates that the modulus is too large for the ring dimension at the
    /// requested security level.
    #[error("Insecure parameters: log(QP) = {log_qp} exceeds {max} bits for degree {degree}")]
    InsecureParameters {
        /// Ring dimension.
        degree: usize,
        /// Bit size of the full key-switching modulus.
        log_qp: usize,
        /// Largest bit size allowed for this degree.
        max: usize,
    },
}
