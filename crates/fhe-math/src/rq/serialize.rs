//! Implementation of serialization and deserialization.

use super::{traits::TryConvertFrom, Context, Poly, Representation};
use crate::{
    proto::rq::{Representation as RepresentationProto, Rq},
    Error, Result,
};
use fhe_traits::{DeserializeWithContext, Serialize};
use ndarray::Array2;
use prost::Message;
use std::sync::Arc;

impl From<&Poly> for Rq {
    fn from(p: &Poly) -> Self {
        let mut coefficients = Vec::with_capacity(8 * p.coefficients.len());
        p.coefficients
            .iter()
            .for_each(|c| coefficients.extend_from_slice(&c.to_le_bytes()));
        Rq {
            representation: match p.representation {
                Representation::PowerBasis => RepresentationProto::Powerbasis,
                Representation::Ntt => RepresentationProto::Ntt,
            } as i32,
            degree: p.ctx.degree as u32,
            moduli: p.ctx.moduli.to_vec(),
            coefficients,
        }
    }
}

impl TryConvertFrom<&Rq> for Poly {
    fn try_convert_from(
        value: &Rq,
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        let stored = match RepresentationProto::try_from(value.representation) {
            Ok(RepresentationProto::Powerbasis) => Representation::PowerBasis,
            Ok(RepresentationProto::Ntt) => Representation::Ntt,
            _ => {
                return Err(Error::Serialization(
                    "Unknown representation".to_string(),
                ))
            }
        };
        if value.degree as usize != ctx.degree || value.moduli.as_slice() != ctx.moduli() {
            return Err(Error::InvalidContext);
        }
        let nmoduli = ctx.moduli.len();
        if value.coefficients.len() != 8 * nmoduli * ctx.degree {
            return Err(Error::Serialization(
                "Invalid number of coefficients".to_string(),
            ));
        }

        let coefficients = value
            .coefficients
            .chunks_exact(8)
            .map(|c| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(c);
                u64::from_le_bytes(bytes)
            })
            .collect::<Vec<_>>();
        let array = Array2::from_shape_vec((nmoduli, ctx.degree), coefficients)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        let mut p = Poly::try_convert_from(array, ctx, stored)?;
        p.change_representation(representation);
        Ok(p)
    }
}

impl Serialize for Poly {
    fn to_bytes(&self) -> Vec<u8> {
        Rq::from(self).encode_to_vec()
    }
}

impl DeserializeWithContext for Poly {
    type Error = Error;
    type Context = Context;

    fn from_bytes(bytes: &[u8], ctx: &Arc<Context>) -> Result<Self> {
        let rq = Rq::decode(bytes).map_err(|e| Error::Serialization(e.to_string()))?;
        let representation = match RepresentationProto::try_from(rq.representation) {
            Ok(RepresentationProto::Ntt) => Representation::Ntt,
            _ => Representation::PowerBasis,
        };
        Poly::try_convert_from(&rq, ctx, representation)
    }
}

#[cfg(test)]
mod tests {
    use crate::rq::{Context, Poly, Representation};
    use fhe_traits::{DeserializeWithContext, Serialize};
    use rand::thread_rng;
    use std::{error::Error, sync::Arc};

    const MODULI: &[u64; 3] = &[1153, 4611686018326724609, 4611686018309947393];

    #[test]
    fn serialize() -> Result<(), Box<dyn Error>> {
        let mut rng = thread_rng();
        let ctx = Arc::new(Context::new(MODULI, 16)?);
        for representation in [Representation::PowerBasis, Representation::Ntt] {
            let p = Poly::random(&ctx, representation, &mut rng);
            let q = Poly::from_bytes(&p.to_bytes(), &ctx)?;
            assert_eq!(p, q);
        }

        let p = Poly::random(&ctx, Representation::Ntt, &mut rng);
        let other = Arc::new(Context::new(&MODULI[..2], 16)?);
        assert!(Poly::from_bytes(&p.to_bytes(), &other).is_err());
        assert!(Poly::from_bytes(&[1, 2, 3], &ctx).is_err());
        Ok(())
    }
}
