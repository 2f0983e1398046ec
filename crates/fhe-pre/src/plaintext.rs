//! Plaintext type, shared by the BFV and CKKS schemes.

use crate::encoding::{ckks, EncodingEnum};
use crate::{CryptoContext, Encoding, Error, Result, Scheme};
use fhe_math::rq::{traits::TryConvertFrom, Poly, Representation};
use fhe_traits::{FheDecoder, FheEncoder, FheParametrized, FhePlaintext};
use num_bigint::BigInt;
use num_complex::Complex64;
use num_traits::{FromPrimitive, ToPrimitive};
use std::fmt::Display;
use std::sync::Arc;

/// Coefficients of the plaintext polynomial: integers modulo `t` for BFV,
/// reals for CKKS (before scaling).
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PlaintextValue {
    Bfv(Box<[u64]>),
    Ckks(Box<[f64]>),
}

/// A plaintext object, that encodes a vector according to a specific
/// encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Plaintext {
    /// The parameters of the underlying scheme.
    pub(crate) par: Arc<CryptoContext>,
    /// The coefficients of the plaintext polynomial.
    pub(crate) value: PlaintextValue,
    /// The encoding of the plaintext, if known
    pub(crate) encoding: Option<Encoding>,
    /// The plaintext as a polynomial of the ciphertext context at `level`,
    /// scaled by `Delta` (BFV) or by `scale` (CKKS).
    pub(crate) poly_ntt: Poly,
    pub(crate) level: usize,
    pub(crate) scale: f64,
    length: Option<usize>,
}

impl FheParametrized for Plaintext {
    type Parameters = CryptoContext;
}

impl FhePlaintext for Plaintext {
    type Encoding = Encoding;
}

impl Plaintext {
    /// Build a BFV plaintext from its coefficients modulo `t`.
    pub(crate) fn from_bfv_coefficients(
        par: &Arc<CryptoContext>,
        coefficients: Vec<u64>,
        level: usize,
    ) -> Result<Self> {
        let value = PlaintextValue::Bfv(coefficients.into_boxed_slice());
        let poly_ntt = Self::scaled_poly(par, &value, level, 1.0)?;
        Ok(Self {
            par: par.clone(),
            value,
            encoding: None,
            poly_ntt,
            level,
            scale: 1.0,
            length: None,
        })
    }

    /// Build a CKKS plaintext from the real coefficients of its polynomial.
    pub(crate) fn from_ckks_coefficients(
        par: &Arc<CryptoContext>,
        coefficients: &[f64],
        level: usize,
        scale: f64,
    ) -> Result<Self> {
        let value = PlaintextValue::Ckks(coefficients.into());
        let poly_ntt = Self::scaled_poly(par, &value, level, scale)?;
        Ok(Self {
            par: par.clone(),
            value,
            encoding: None,
            poly_ntt,
            level,
            scale,
            length: None,
        })
    }

    /// The plaintext polynomial at `level`, multiplied by `Delta_level` for
    /// BFV and by `scale` for CKKS, in Ntt representation.
    pub(crate) fn scaled_poly(
        par: &CryptoContext,
        value: &PlaintextValue,
        level: usize,
        scale: f64,
    ) -> Result<Poly> {
        let ctx = par.ctx_at_level(level)?;
        let mut poly = match value {
            PlaintextValue::Bfv(m) => {
                let mut poly =
                    Poly::try_convert_from(&m[..], ctx, Representation::PowerBasis)?;
                poly.change_representation(Representation::Ntt);
                poly.mul_rns_scalars(&par.bfv()?.delta[level])?;
                poly
            }
            PlaintextValue::Ckks(coefficients) => {
                let scaled = coefficients
                    .iter()
                    .map(|c| {
                        BigInt::from_f64((c * scale).round()).ok_or_else(|| {
                            Error::EncodingError(format!("Cannot scale the coefficient {c}"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Poly::try_convert_from(scaled.as_slice(), ctx, Representation::PowerBasis)?
            }
        };
        poly.change_representation(Representation::Ntt);
        Ok(poly)
    }

    /// The level of the plaintext.
    pub const fn level(&self) -> usize {
        self.level
    }

    /// The encoding of the plaintext, when it was created by encoding values.
    pub const fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    /// The scale of CKKS plaintexts.
    pub fn scale(&self) -> Option<f64> {
        match self.value {
            PlaintextValue::Bfv(_) => None,
            PlaintextValue::Ckks(_) => Some(self.scale),
        }
    }

    /// Number of values returned when decoding. Decrypted plaintexts hold as
    /// many values as there are slots until their length is set.
    pub fn len(&self) -> usize {
        self.length.unwrap_or_else(|| self.capacity(self.default_encoding()))
    }

    /// Whether decoding returns no value.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set the number of values returned when decoding, at most the number
    /// of values the encoding holds.
    pub fn set_length(&mut self, length: usize) {
        self.length = Some(length.min(self.capacity(self.default_encoding())));
    }

    /// Estimated number of bits of precision of a CKKS plaintext holding real
    /// values, derived from the magnitude of the imaginary parts of its slots.
    pub fn precision(&self) -> Option<f64> {
        let slots = match &self.value {
            PlaintextValue::Ckks(coefficients) => {
                let ckks = self.par.ckks().ok()?;
                ckks::coefficients_to_slots(coefficients, self.par.batch_size(), ckks)
            }
            PlaintextValue::Bfv(_) => return None,
        };
        let max_imaginary = slots.iter().map(|v| v.im.abs()).fold(0f64, f64::max);
        let bits = -max_imaginary.log2();
        Some(bits.clamp(0.0, self.scale.log2().max(0.0)))
    }

    fn default_encoding(&self) -> Encoding {
        match (&self.value, self.encoding) {
            (_, Some(encoding)) => encoding,
            (PlaintextValue::Bfv(_), None)
                if self.par.bfv.as_ref().is_some_and(|b| b.op.is_none()) =>
            {
                Encoding::coefficients_at_level(self.level)
            }
            _ => Encoding::packed_at_level(self.level),
        }
    }

    fn capacity(&self, encoding: Encoding) -> usize {
        match encoding.encoding {
            EncodingEnum::Packed => self.par.batch_size(),
            EncodingEnum::Coefficients => self.par.degree(),
        }
    }

    fn check_level(par: &CryptoContext, encoding: Encoding) -> Result<()> {
        if encoding.level > par.max_level() {
            return Err(Error::DefaultError("Invalid level".to_string()));
        }
        Ok(())
    }

    fn encode_bfv(values: &[u64], encoding: Encoding, par: &Arc<CryptoContext>) -> Result<Self> {
        par.require_scheme(Scheme::Bfv)?;
        Self::check_level(par, encoding)?;
        let bfv = par.bfv()?;
        let t = bfv.plaintext.modulus();
        if let Some(v) = values.iter().find(|v| **v >= t) {
            return Err(Error::EncodingError(format!(
                "The value {v} is not smaller than the plaintext modulus {t}"
            )));
        }

        let mut m = vec![0u64; par.degree()];
        match encoding.encoding {
            EncodingEnum::Packed => {
                let op = bfv.op.as_ref().ok_or_else(|| {
                    Error::EncodingError(
                        "The plaintext modulus does not support the packed encoding".to_string(),
                    )
                })?;
                check_capacity(values.len(), par.batch_size())?;
                for (v, i) in values.iter().zip(bfv.matrix_reps_index_map.iter()) {
                    m[*i] = *v;
                }
                op.backward(&mut m);
            }
            EncodingEnum::Coefficients => {
                check_capacity(values.len(), par.degree())?;
                m[..values.len()].copy_from_slice(values);
            }
        }

        let mut pt = Self::from_bfv_coefficients(par, m, encoding.level)?;
        pt.encoding = Some(encoding);
        pt.length = Some(values.len());
        Ok(pt)
    }

    fn encode_ckks(
        values: &[Complex64],
        encoding: Encoding,
        par: &Arc<CryptoContext>,
    ) -> Result<Self> {
        par.require_scheme(Scheme::Ckks)?;
        Self::check_level(par, encoding)?;
        if encoding.encoding != EncodingEnum::Packed {
            return Err(Error::EncodingError(
                "Ckks plaintexts only support the packed encoding".to_string(),
            ));
        }
        let slots = par.batch_size();
        check_capacity(values.len(), slots)?;
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::EncodingError(
                "Ckks values must be finite".to_string(),
            ));
        }

        let ckks = par.ckks()?;
        let coefficients = ckks::slots_to_coefficients(values, slots, par.degree(), ckks);

        // The scaled coefficients must stay below half of the modulus of the level.
        let bound = par
            .ctx_at_level(encoding.level)?
            .modulus()
            .to_f64()
            .unwrap_or(f64::MAX)
            / 2.0;
        if coefficients.iter().any(|c| (c * ckks.scale).abs() >= bound) {
            return Err(Error::EncodingError(
                "The scaled values overflow the ciphertext modulus".to_string(),
            ));
        }

        let mut pt = Self::from_ckks_coefficients(par, &coefficients, encoding.level, ckks.scale)?;
        pt.encoding = Some(encoding);
        pt.length = Some(values.len());
        Ok(pt)
    }

    /// Values of a BFV plaintext modulo `t`, according to `encoding`.
    fn decode_bfv(&self, encoding: Encoding) -> Result<Vec<u64>> {
        let PlaintextValue::Bfv(m) = &self.value else {
            return Err(Error::EncodingError(
                "Cannot decode a Ckks plaintext into integers".to_string(),
            ));
        };
        let bfv = self.par.bfv()?;
        let mut values = match encoding.encoding {
            EncodingEnum::Packed => {
                let op = bfv.op.as_ref().ok_or_else(|| {
                    Error::EncodingError(
                        "The plaintext modulus does not support the packed encoding".to_string(),
                    )
                })?;
                let mut evaluations = m.to_vec();
                op.forward(&mut evaluations);
                bfv.matrix_reps_index_map
                    .iter()
                    .take(self.par.batch_size())
                    .map(|i| evaluations[*i])
                    .collect::<Vec<_>>()
            }
            EncodingEnum::Coefficients => m.to_vec(),
        };
        values.truncate(self.length.unwrap_or(usize::MAX));
        Ok(values)
    }

    /// Slots of a CKKS plaintext.
    fn decode_ckks(&self, encoding: Encoding) -> Result<Vec<Complex64>> {
        let PlaintextValue::Ckks(coefficients) = &self.value else {
            return Err(Error::EncodingError(
                "Cannot decode a Bfv plaintext into complex numbers".to_string(),
            ));
        };
        if encoding.encoding != EncodingEnum::Packed {
            return Err(Error::EncodingError(
                "Ckks plaintexts only support the packed encoding".to_string(),
            ));
        }
        let mut values =
            ckks::coefficients_to_slots(coefficients, self.par.batch_size(), self.par.ckks()?);
        values.truncate(self.length.unwrap_or(usize::MAX));
        Ok(values)
    }

    fn resolve_encoding<O: Into<Option<Encoding>>>(&self, encoding: O) -> Encoding {
        encoding.into().unwrap_or_else(|| self.default_encoding())
    }
}

impl FheEncoder<&[u64]> for Plaintext {
    type Error = Error;

    fn try_encode(value: &[u64], encoding: Encoding, par: &Arc<CryptoContext>) -> Result<Self> {
        Self::encode_bfv(value, encoding, par)
    }
}

impl FheEncoder<&[i64]> for Plaintext {
    type Error = Error;

    fn try_encode(value: &[i64], encoding: Encoding, par: &Arc<CryptoContext>) -> Result<Self> {
        par.require_scheme(Scheme::Bfv)?;
        let t = &par.bfv()?.plaintext;
        let half = (t.modulus() / 2) as i64;
        if let Some(v) = value.iter().find(|v| **v <= -half || **v > half) {
            return Err(Error::EncodingError(format!(
                "The value {v} is out of the range (-t/2, t/2]"
            )));
        }
        let reduced = value.iter().map(|v| t.reduce_i64(*v)).collect::<Vec<_>>();
        Self::encode_bfv(&reduced, encoding, par)
    }
}

impl FheEncoder<&[f64]> for Plaintext {
    type Error = Error;

    fn try_encode(value: &[f64], encoding: Encoding, par: &Arc<CryptoContext>) -> Result<Self> {
        let values = value
            .iter()
            .map(|v| Complex64::new(*v, 0.0))
            .collect::<Vec<_>>();
        Self::encode_ckks(&values, encoding, par)
    }
}

impl FheEncoder<&[Complex64]> for Plaintext {
    type Error = Error;

    fn try_encode(
        value: &[Complex64],
        encoding: Encoding,
        par: &Arc<CryptoContext>,
    ) -> Result<Self> {
        Self::encode_ckks(value, encoding, par)
    }
}

impl FheDecoder<Plaintext> for Vec<u64> {
    type Error = Error;

    fn try_decode<O>(pt: &Plaintext, encoding: O) -> Result<Self>
    where
        O: Into<Option<Encoding>>,
    {
        pt.decode_bfv(pt.resolve_encoding(encoding))
    }
}

impl FheDecoder<Plaintext> for Vec<i64> {
    type Error = Error;

    fn try_decode<O>(pt: &Plaintext, encoding: O) -> Result<Self>
    where
        O: Into<Option<Encoding>>,
    {
        let values = pt.decode_bfv(pt.resolve_encoding(encoding))?;
        let t = pt.par.bfv()?.plaintext.modulus();
        Ok(values
            .into_iter()
            .map(|v| if v > t / 2 { v as i64 - t as i64 } else { v as i64 })
            .collect())
    }
}

impl FheDecoder<Plaintext> for Vec<Complex64> {
    type Error = Error;

    fn try_decode<O>(pt: &Plaintext, encoding: O) -> Result<Self>
    where
        O: Into<Option<Encoding>>,
    {
        pt.decode_ckks(pt.resolve_encoding(encoding))
    }
}

impl FheDecoder<Plaintext> for Vec<f64> {
    type Error = Error;

    fn try_decode<O>(pt: &Plaintext, encoding: O) -> Result<Self>
    where
        O: Into<Option<Encoding>>,
    {
        Ok(pt
            .decode_ckks(pt.resolve_encoding(encoding))?
            .into_iter()
            .map(|v| v.re)
            .collect())
    }
}

fn check_capacity(len: usize, capacity: usize) -> Result<()> {
    if len > capacity {
        return Err(Error::EncodingError(format!(
            "{len} values do not fit in {capacity} slots"
        )));
    }
    Ok(())
}

impl Display for Plaintext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            PlaintextValue::Bfv(_) => {
                let values = Vec::<i64>::try_decode(self, None::<Encoding>)
                    .map_err(|_| std::fmt::Error)?;
                write!(f, "(")?;
                for v in values {
                    write!(f, " {v}")?;
                }
                write!(f, " ... )")
            }
            PlaintextValue::Ckks(_) => {
                let values = Vec::<f64>::try_decode(self, None::<Encoding>)
                    .map_err(|_| std::fmt::Error)?;
                write!(f, "(")?;
                for v in values {
                    write!(f, "{v:.6}, ")?;
                }
                write!(f, " ... )")?;
                if let Some(precision) = self.precision() {
                    write!(f, "; Estimated precision: {} bits", precision.floor())?;
                }
                Ok(())
            }
        }
    }
}
