//! Ciphertext type, shared by the BFV and CKKS schemes.

use crate::proto::pre::Ciphertext as CiphertextProto;
use crate::{CryptoContext, Error, KeyId, Result, Scheme};
use fhe_math::rq::{Poly, Representation};
use fhe_traits::{
    DeserializeParametrized, DeserializeWithContext, FheCiphertext, FheParametrized, Serialize,
};
use prost::Message;
use std::sync::Arc;

/// A ciphertext encrypting a plaintext under a key pair.
///
/// Besides its polynomials, a ciphertext carries the identifier of the key
/// pair able to decrypt it, its level in the modulus chain, the number of
/// sequential multiplications and re-encryptions it went through, and for
/// CKKS the scale of the encrypted values.
#[derive(Debug, Clone, PartialEq)]
pub struct Ciphertext {
    /// The crypto context of the ciphertext.
    pub(crate) par: Arc<CryptoContext>,

    /// The ciphertext elements, in Ntt representation.
    pub(crate) c: Vec<Poly>,

    /// The ciphertext level
    pub(crate) level: usize,

    pub(crate) depth: usize,

    pub(crate) key_id: KeyId,

    /// Scale of the encrypted values; always 1 for BFV.
    pub(crate) scale: f64,
}

impl Ciphertext {
    /// The level of the ciphertext in the modulus chain.
    pub const fn level(&self) -> usize {
        self.level
    }

    /// The multiplicative depth consumed so far.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Identifier of the key pair the ciphertext is encrypted under.
    pub const fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// The scale of the encrypted values, for CKKS ciphertexts.
    pub fn scale(&self) -> Option<f64> {
        match self.par.scheme() {
            Scheme::Bfv => None,
            Scheme::Ckks => Some(self.scale),
        }
    }

    /// Number of polynomials in the ciphertext.
    pub fn len(&self) -> usize {
        self.c.len()
    }

    /// Whether the ciphertext holds no polynomial.
    pub fn is_empty(&self) -> bool {
        self.c.is_empty()
    }

    /// Get the i-th polynomial of the ciphertext.
    pub fn get(&self, i: usize) -> Option<&Poly> {
        self.c.get(i)
    }

    /// Modulo switch the ciphertext to the next level, dividing it by the
    /// last modulus of its level. For CKKS this is a rescaling: the scale is
    /// divided by the same modulus.
    pub fn mod_switch_to_next_level(&mut self) -> Result<()> {
        if self.level >= self.par.max_level() {
            return Err(Error::DepthExceeded {
                required: self.level + 1,
                available: self.par.max_level(),
            });
        }
        let q_last = self.par.moduli()[self.par.max_level() - self.level];
        let next_ctx = self.par.ctx_at_level(self.level + 1)?;
        for ci in self.c.iter_mut() {
            ci.change_representation(Representation::PowerBasis);
            ci.mod_switch_down_next()?;
            ci.change_representation(Representation::Ntt);
            *ci = ci.project_to(next_ctx)?;
        }
        if self.par.scheme() == Scheme::Ckks {
            self.scale /= q_last as f64;
        }
        self.level += 1;
        Ok(())
    }

    /// Bring the ciphertext down to `level` while keeping the encrypted
    /// values and their scale. BFV ciphertexts are modulo switched, while
    /// CKKS ciphertexts simply drop the moduli above `level`.
    pub fn drop_to_level(&mut self, level: usize) -> Result<()> {
        if level < self.level || level > self.par.max_level() {
            return Err(Error::DefaultError(format!(
                "Cannot bring a ciphertext from level {} to level {level}",
                self.level
            )));
        }
        match self.par.scheme() {
            Scheme::Bfv => {
                while self.level < level {
                    self.mod_switch_to_next_level()?
                }
            }
            Scheme::Ckks => {
                let ctx = self.par.ctx_at_level(level)?;
                self.c = self
                    .c
                    .iter()
                    .map(|ci| ci.project_to(ctx))
                    .collect::<std::result::Result<Vec<_>, fhe_math::Error>>()?;
                self.level = level;
            }
        }
        Ok(())
    }
}

impl FheCiphertext for Ciphertext {}

impl FheParametrized for Ciphertext {
    type Parameters = CryptoContext;
}

impl Serialize for Ciphertext {
    fn to_bytes(&self) -> Vec<u8> {
        CiphertextProto::from(self).encode_to_vec()
    }
}

impl DeserializeParametrized for Ciphertext {
    type Error = Error;

    fn from_bytes(bytes: &[u8], par: &Arc<CryptoContext>) -> Result<Self> {
        let proto: CiphertextProto =
            Message::decode(bytes).map_err(|_| Error::SerializationError)?;
        Ciphertext::try_from_proto(&proto, par)
    }
}

/// Conversions from and to protobuf.
impl From<&Ciphertext> for CiphertextProto {
    fn from(ct: &Ciphertext) -> Self {
        CiphertextProto {
            c: ct.c.iter().map(|ci| ci.to_bytes()).collect(),
            level: ct.level as u32,
            depth: ct.depth as u32,
            key_id: ct.key_id.as_bytes().to_vec(),
            scale: ct.scale,
        }
    }
}

impl Ciphertext {
    fn try_from_proto(value: &CiphertextProto, par: &Arc<CryptoContext>) -> Result<Self> {
        if value.c.len() < 2 {
            return Err(Error::TooFewValues(value.c.len(), 2));
        }
        if value.level as usize > par.max_level() {
            return Err(Error::DefaultError("Invalid level".to_string()));
        }
        if !(value.scale.is_finite() && value.scale > 0.0) {
            return Err(Error::SerializationError);
        }

        let ctx = par.ctx_at_level(value.level as usize)?;
        let c = value
            .c
            .iter()
            .map(|bytes| Poly::from_bytes(bytes, ctx).map_err(|_| Error::SerializationError))
            .collect::<Result<Vec<_>>>()?;
        if c.iter().any(|ci| ci.representation() != &Representation::Ntt) {
            return Err(Error::SerializationError);
        }

        Ok(Ciphertext {
            par: par.clone(),
            c,
            level: value.level as usize,
            depth: value.depth as usize,
            key_id: KeyId::try_from_slice(&value.key_id)?,
            scale: value.scale,
        })
    }
}
