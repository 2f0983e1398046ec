//! Implementation of conversions from and to polynomials.

use super::{traits::TryConvertFrom, Context, Poly, Representation};
use crate::{Error, Result};
use itertools::izip;
use ndarray::Array2;
use num_bigint::{BigInt, BigUint};
use std::sync::Arc;

impl Poly {
    fn from_rows<F>(
        ctx: &Arc<Context>,
        len: usize,
        representation: Representation,
        mut fill: F,
    ) -> Result<Self>
    where
        F: FnMut(usize, usize) -> u64,
    {
        if len > ctx.degree {
            return Err(Error::Default(format!(
                "Too many coefficients: {len} exceeds the degree {}",
                ctx.degree
            )));
        }
        let mut p = Poly::zero(ctx, Representation::PowerBasis);
        for (i, mut row) in p.coefficients.outer_iter_mut().enumerate() {
            for (j, x) in row.iter_mut().take(len).enumerate() {
                *x = fill(i, j);
            }
        }
        p.change_representation(representation);
        Ok(p)
    }
}

impl TryConvertFrom<&[u64]> for Poly {
    fn try_convert_from(
        value: &[u64],
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        Poly::from_rows(ctx, value.len(), representation, |i, j| {
            ctx.q[i].reduce(value[j])
        })
    }
}

impl TryConvertFrom<&[i64]> for Poly {
    fn try_convert_from(
        value: &[i64],
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        Poly::from_rows(ctx, value.len(), representation, |i, j| {
            ctx.q[i].reduce_i64(value[j])
        })
    }
}

impl TryConvertFrom<&[BigUint]> for Poly {
    fn try_convert_from(
        value: &[BigUint],
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        Poly::from_rows(ctx, value.len(), representation, |i, j| {
            ctx.q[i].reduce_biguint(&value[j])
        })
    }
}

impl TryConvertFrom<&[BigInt]> for Poly {
    fn try_convert_from(
        value: &[BigInt],
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        Poly::from_rows(ctx, value.len(), representation, |i, j| {
            ctx.q[i].reduce_bigint(&value[j])
        })
    }
}

impl TryConvertFrom<Array2<u64>> for Poly {
    fn try_convert_from(
        value: Array2<u64>,
        ctx: &Arc<Context>,
        representation: Representation,
    ) -> Result<Self> {
        if value.shape() != [ctx.moduli.len(), ctx.degree] {
            return Err(Error::Default(
                "The array of coefficient does not have the correct shape".to_string(),
            ));
        }
        if izip!(value.outer_iter(), ctx.moduli.iter())
            .any(|(row, qi)| row.iter().any(|x| x >= qi))
        {
            return Err(Error::Default(
                "Coefficients are not reduced modulo their modulus".to_string(),
            ));
        }
        Ok(Self {
            ctx: ctx.clone(),
            representation,
            coefficients: value,
        })
    }
}

impl From<&Poly> for Vec<BigUint> {
    /// Lift the coefficients in [0, Q). Polynomials in Ntt representation are
    /// converted first.
    fn from(p: &Poly) -> Self {
        let mut q = p.clone();
        q.change_representation(Representation::PowerBasis);
        q.coefficients
            .axis_iter(ndarray::Axis(1))
            .map(|column| q.ctx.rns.lift(column))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::rq::{traits::TryConvertFrom, Context, Poly, Representation};
    use ndarray::Array2;
    use num_bigint::{BigInt, BigUint};
    use std::{error::Error, sync::Arc};

    const MODULI: &[u64; 3] = &[
        4611686018326724609,
        4611686018309947393,
        4611686018232352769,
    ];

    #[test]
    fn from_signed_and_big() -> Result<(), Box<dyn Error>> {
        let ctx = Arc::new(Context::new(MODULI, 16)?);
        let values = [-3i64, 0, 5, -1];
        let p = Poly::try_convert_from(&values[..], &ctx, Representation::PowerBasis)?;
        let lifted = p.lift_centered()?;
        assert_eq!(&lifted[..4], &values.map(BigInt::from)[..]);
        assert!(lifted[4..].iter().all(|c| c == &BigInt::from(0)));

        let big = vec![ctx.modulus() - 1u64, BigUint::from(7u64)];
        let q = Poly::try_convert_from(big.as_slice(), &ctx, Representation::Ntt)?;
        let back: Vec<BigUint> = (&q).into();
        assert_eq!(&back[..2], &big[..]);

        let neg = vec![BigInt::from(-1)];
        let r = Poly::try_convert_from(neg.as_slice(), &ctx, Representation::PowerBasis)?;
        let r_back: Vec<BigUint> = (&r).into();
        assert_eq!(r_back[0], ctx.modulus() - 1u64);
        Ok(())
    }

    #[test]
    fn too_many_coefficients() -> Result<(), Box<dyn Error>> {
        let ctx = Arc::new(Context::new(MODULI, 16)?);
        let values = vec![1u64; 17];
        assert!(Poly::try_convert_from(values.as_slice(), &ctx, Representation::Ntt).is_err());
        Ok(())
    }

    #[test]
    fn from_array() -> Result<(), Box<dyn Error>> {
        let ctx = Arc::new(Context::new(MODULI, 16)?);
        let a = Array2::<u64>::zeros((3, 16));
        let p = Poly::try_convert_from(a, &ctx, Representation::Ntt)?;
        assert_eq!(p, Poly::zero(&ctx, Representation::Ntt));

        assert!(Poly::try_convert_from(
            Array2::<u64>::zeros((2, 16)),
            &ctx,
            Representation::Ntt
        )
        .is_err());
        let mut b = Array2::<u64>::zeros((3, 16));
        b[[1, 0]] = MODULI[1];
        assert!(Poly::try_convert_from(b, &ctx, Representation::Ntt).is_err());
        Ok(())
    }
}
