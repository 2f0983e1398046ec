//! Galois keys and the key set used to sum the slots of a ciphertext.

use super::{KeyId, KeySwitchingKey, SecretKey};
use crate::proto::pre::{EvalSumKey as EvalSumKeyProto, GaloisKey as GaloisKeyProto};
use crate::{Ciphertext, CryptoContext, Error, Feature, Result, Scheme};
use fhe_traits::{DeserializeParametrized, FheParametrized, Serialize};
use prost::Message;
use rand::{CryptoRng, RngCore};
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

/// Key switching key from `s(X^k)` to `s(X)`, which evaluates the Galois
/// automorphism `X -> X^k` on ciphertexts.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct GaloisKey {
    pub(crate) element: usize,
    pub(crate) ksk: KeySwitchingKey,
    pub(crate) key_id: KeyId,
}

impl GaloisKey {
    /// Generate a [`GaloisKey`] for the odd exponent `element < 2n`.
    pub fn new<R: RngCore + CryptoRng>(
        sk: &SecretKey,
        element: usize,
        rng: &mut R,
    ) -> Result<Self> {
        sk.par.require(Feature::KeySwitching)?;
        if element % 2 == 0 || element >= 2 * sk.par.degree() {
            return Err(Error::DefaultError(format!(
                "Invalid Galois element {element}"
            )));
        }
        let ctx = sk.par.ks_ctx_at_level(0)?;
        let s = sk.poly(ctx)?;
        let s_sub = Zeroizing::new(s.substitute(element)?);
        Ok(Self {
            element,
            ksk: KeySwitchingKey::new(sk, &s_sub, rng)?,
            key_id: sk.key_id,
        })
    }

    /// The exponent of the automorphism.
    pub const fn element(&self) -> usize {
        self.element
    }

    /// Apply the automorphism to a ciphertext.
    pub fn apply(&self, ct: &Ciphertext) -> Result<Ciphertext> {
        if ct.par != self.ksk.par {
            return Err(Error::ParametersMismatch);
        }
        if ct.key_id != self.key_id {
            return Err(Error::KeyMismatch {
                expected: self.key_id,
                found: ct.key_id,
            });
        }
        if ct.c.len() != 2 {
            return Err(Error::TooManyValues(ct.c.len(), 2));
        }

        let c0 = ct.c[0].substitute(self.element)?;
        let c1 = ct.c[1].substitute(self.element)?;
        let (d0, d1) = self.ksk.key_switch(&c1, ct.level)?;
        Ok(Ciphertext {
            c: vec![&c0 + &d0, d1],
            ..ct.clone()
        })
    }
}

impl From<&GaloisKey> for GaloisKeyProto {
    fn from(value: &GaloisKey) -> Self {
        GaloisKeyProto {
            ksk: Some((&value.ksk).into()),
            element: value.element as u32,
            key_id: value.key_id.as_bytes().to_vec(),
        }
    }
}

/// Galois keys rotating the slots by every power of two below the batch
/// size, plus the row swap for BFV contexts whose batch spans both rows.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct EvalSumKey {
    pub(crate) par: Arc<CryptoContext>,
    pub(crate) keys: Box<[GaloisKey]>,
    pub(crate) key_id: KeyId,
}

impl EvalSumKey {
    /// Generate an [`EvalSumKey`] from a [`SecretKey`].
    pub fn new<R: RngCore + CryptoRng>(sk: &SecretKey, rng: &mut R) -> Result<Self> {
        sk.par.require(Feature::AdvancedShe)?;
        let keys = Self::elements(&sk.par)
            .into_iter()
            .map(|element| GaloisKey::new(sk, element, rng))
            .collect::<Result<Vec<_>>>()?;
        debug!(key_id = %sk.key_id, count = keys.len(), "generated eval sum key");
        Ok(Self {
            par: sk.par.clone(),
            keys: keys.into_boxed_slice(),
            key_id: sk.key_id,
        })
    }

    /// Identifier of the key pair this key belongs to.
    pub const fn key_id(&self) -> KeyId {
        self.key_id
    }

    /// The Galois keys, in the order they are applied.
    pub fn keys(&self) -> &[GaloisKey] {
        &self.keys
    }

    fn elements(par: &CryptoContext) -> Vec<usize> {
        let degree = par.degree();
        let m = 2 * degree;
        let (generator, row_size) = match par.scheme() {
            Scheme::Bfv => (3, par.batch_size().min(degree / 2)),
            Scheme::Ckks => (5, par.batch_size()),
        };
        let mut elements = vec![];
        let mut step = 1;
        while step < row_size {
            elements.push((0..step).fold(1, |acc, _| (acc * generator) % m));
            step <<= 1;
        }
        if par.scheme() == Scheme::Bfv && par.batch_size() == degree {
            elements.push(m - 1);
        }
        elements
    }
}

impl FheParametrized for EvalSumKey {
    type Parameters = CryptoContext;
}

impl Serialize for EvalSumKey {
    fn to_bytes(&self) -> Vec<u8> {
        EvalSumKeyProto {
            gk: self.keys.iter().map(GaloisKeyProto::from).collect(),
        }
        .encode_to_vec()
    }
}

impl DeserializeParametrized for EvalSumKey {
    type Error = Error;

    fn from_bytes(bytes: &[u8], par: &Arc<Self::Parameters>) -> Result<Self> {
        let proto: EvalSumKeyProto =
            Message::decode(bytes).map_err(|_| Error::SerializationError)?;
        let keys = proto
            .gk
            .iter()
            .map(|gk| -> Result<GaloisKey> {
                let ksk = gk.ksk.as_ref().ok_or(Error::SerializationError)?;
                Ok(GaloisKey {
                    element: gk.element as usize,
                    ksk: KeySwitchingKey::try_from_proto(ksk, par)?,
                    key_id: KeyId::try_from_slice(&gk.key_id)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let elements = keys.iter().map(|gk| gk.element).collect::<Vec<_>>();
        let key_id = keys.first().map(|gk| gk.key_id).unwrap_or_default();
        if elements != Self::elements(par) || keys.iter().any(|gk| gk.key_id != key_id) {
            return Err(Error::SerializationError);
        }
        Ok(Self {
            par: par.clone(),
            keys: keys.into_boxed_slice(),
            key_id,
        })
    }
}
