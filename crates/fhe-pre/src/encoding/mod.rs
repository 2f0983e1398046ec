//! Encodings of values into plaintext polynomials.

pub(crate) mod ckks;

use fhe_traits::FhePlaintextEncoding;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EncodingEnum {
    Coefficients,
    Packed,
}

impl Display for EncodingEnum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// How values are laid out in a plaintext, and the level of the plaintext.
///
/// With the packed encoding, values occupy the slots of the plaintext and
/// homomorphic operations act slot-wise: integers modulo `t` for BFV, which
/// requires `t` to be a prime congruent to 1 modulo `2n`, and complex numbers
/// for CKKS. The coefficients encoding is only available for BFV and places
/// the values directly as polynomial coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoding {
    pub(crate) encoding: EncodingEnum,
    pub(crate) level: usize,
}

impl Encoding {
    /// A coefficients encoding at level 0.
    pub fn coefficients() -> Self {
        Self {
            encoding: EncodingEnum::Coefficients,
            level: 0,
        }
    }

    /// A packed encoding at level 0.
    pub fn packed() -> Self {
        Self {
            encoding: EncodingEnum::Packed,
            level: 0,
        }
    }

    /// The packed encoding of CKKS plaintexts, at level 0. Same as
    /// [`Encoding::packed`].
    pub fn ckks_packed() -> Self {
        Self::packed()
    }

    /// A coefficients encoding at a specific level.
    pub fn coefficients_at_level(level: usize) -> Self {
        Self {
            encoding: EncodingEnum::Coefficients,
            level,
        }
    }

    /// A packed encoding at a specific level.
    pub fn packed_at_level(level: usize) -> Self {
        Self {
            encoding: EncodingEnum::Packed,
            level,
        }
    }

    /// Level of the encoded plaintext.
    pub const fn level(&self) -> usize {
        self.level
    }
}

impl Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(level {})", self.encoding, self.level)
    }
}

impl FhePlaintextEncoding for Encoding {}
