//! Polynomials in R_q\[x\] = (ZZ_q1 x ... x ZZ_qn)\[x\] where the qi's are
//! prime moduli in zq.

mod context;
mod convert;
mod ops;
mod serialize;

pub mod scaler;
pub mod traits;

pub use context::Context;

use crate::{Error, Result};
use traits::TryConvertFrom;
use itertools::{izip, Itertools};
use ndarray::{s, Array2, ArrayView2, Axis};
use num_bigint::BigInt;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use zeroize::Zeroize;

/// Possible representations of the underlying polynomial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Representation {
    /// This is the list of coefficients ci, such that the polynomial is c0 +
    /// c1 * x + ... + c_(degree - 1) * x^(degree - 1)
    #[default]
    PowerBasis,
    /// This is the NTT representation of the PowerBasis representation.
    Ntt,
}

/// Struct that holds a polynomial for a specific context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poly {
    ctx: Arc<Context>,
    representation: Representation,
    coefficients: Array2<u64>,
}

impl Poly {
    /// Creates a polynomial holding the constant 0.
    pub fn zero(ctx: &Arc<Context>, representation: Representation) -> Self {
        Self {
            ctx: ctx.clone(),
            representation,
            coefficients: Array2::zeros((ctx.moduli.len(), ctx.degree)),
        }
    }

    /// Current representation of the polynomial.
    pub const fn representation(&self) -> &Representation {
        &self.representation
    }

    /// Context of the polynomial.
    pub const fn ctx(&self) -> &Arc<Context> {
        &self.ctx
    }

    /// Returns a view of the coefficients, one row per modulus.
    pub fn coefficients(&self) -> ArrayView2<u64> {
        self.coefficients.view()
    }

    /// Change the representation of the underlying polynomial.
    pub fn change_representation(&mut self, to: Representation) {
        match (self.representation, to) {
            (Representation::PowerBasis, Representation::Ntt) => {
                izip!(self.coefficients.outer_iter_mut(), self.ctx.ops.iter()).for_each(
                    |(mut v, op)| {
                        if let Some(slice) = v.as_slice_mut() {
                            op.forward(slice)
                        }
                    },
                );
            }
            (Representation::Ntt, Representation::PowerBasis) => {
                izip!(self.coefficients.outer_iter_mut(), self.ctx.ops.iter()).for_each(
                    |(mut v, op)| {
                        if let Some(slice) = v.as_slice_mut() {
                            op.backward(slice)
                        }
                    },
                );
            }
            _ => {}
        }
        self.representation = to;
    }

    /// Generate a random polynomial.
    pub fn random<R: RngCore + CryptoRng>(
        ctx: &Arc<Context>,
        representation: Representation,
        rng: &mut R,
    ) -> Self {
        let mut p = Poly::zero(ctx, representation);
        izip!(p.coefficients.outer_iter_mut(), ctx.q.iter()).for_each(|(mut v, qi)| {
            v.iter_mut()
                .zip(qi.random_vec(ctx.degree, rng))
                .for_each(|(x, r)| *x = r);
        });
        p
    }

    /// Generate a random polynomial deterministically from a seed.
    pub fn random_from_seed(
        ctx: &Arc<Context>,
        representation: Representation,
        seed: <ChaCha8Rng as SeedableRng>::Seed,
    ) -> Self {
        let mut rng = ChaCha8Rng::from_seed(seed);
        let mut p = Poly::zero(ctx, representation);
        izip!(p.coefficients.outer_iter_mut(), ctx.q.iter()).for_each(|(mut v, qi)| {
            let mut rng_i = ChaCha8Rng::from_seed(rng.gen_seed());
            v.iter_mut()
                .zip(qi.random_vec(ctx.degree, &mut rng_i))
                .for_each(|(x, r)| *x = r);
        });
        p
    }

    /// Generate a small polynomial with coefficients following a centered
    /// binomial distribution of the given variance, and convert it into the
    /// specified representation.
    ///
    /// Returns an error if the variance does not belong to [1/2, ..., 16].
    pub fn small<R: RngCore + CryptoRng>(
        ctx: &Arc<Context>,
        representation: Representation,
        variance: f32,
        rng: &mut R,
    ) -> Result<Self> {
        let coeffs = fhe_util::sample_vec_cbd(ctx.degree, variance, rng)
            .map_err(|e| Error::Default(e.to_string()))?;
        Poly::try_convert_from(coeffs.as_slice(), ctx, representation)
    }

    /// Lift the coefficients to centered big integers in (-Q/2, Q/2].
    ///
    /// Returns an error if the polynomial is not in power basis.
    pub fn lift_centered(&self) -> Result<Vec<BigInt>> {
        self.expect_representation(Representation::PowerBasis)?;
        Ok(self
            .coefficients
            .axis_iter(Axis(1))
            .map(|column| self.ctx.rns.lift_centered(column))
            .collect())
    }

    /// Modulus switch down the polynomial by dividing and rounding each
    /// coefficient by the last modulus of its context, and move it to the
    /// next context.
    ///
    /// Returns an error if there is no next context.
    pub fn mod_switch_down_next(&mut self) -> Result<()> {
        let next_ctx = self.ctx.next_context.clone().ok_or(Error::NoMoreContext)?;
        let nmoduli = self.ctx.moduli.len();
        let q_last = &self.ctx.q[nmoduli - 1];

        let mut last = self.coefficients.row(nmoduli - 1).to_vec();
        if self.representation == Representation::Ntt {
            self.ctx.ops[nmoduli - 1].backward(&mut last);
        }
        let last_centered = q_last.center_vec(&last);

        let mut coefficients = self.coefficients.slice(s![..nmoduli - 1, ..]).to_owned();
        izip!(
            coefficients.outer_iter_mut(),
            self.ctx.q.iter(),
            self.ctx.ops.iter(),
            self.ctx.inv_last_qi_mod_qj.iter(),
            self.ctx.inv_last_qi_mod_qj_shoup.iter()
        )
        .for_each(|(mut row, qi, op, inv, inv_shoup)| {
            let mut r = qi.reduce_vec_i64(&last_centered);
            if self.representation == Representation::Ntt {
                op.forward(&mut r);
            }
            row.iter_mut().zip(r.iter()).for_each(|(x, ri)| {
                *x = qi.mul_shoup(qi.sub(*x, *ri), *inv, *inv_shoup);
            });
        });

        last.zeroize();
        self.coefficients = coefficients;
        self.ctx = next_ctx;
        Ok(())
    }

    /// Modulus switch down the polynomial until it reaches the context `ctx`.
    ///
    /// Returns an error if `ctx` is not a child of the polynomial context.
    pub fn mod_switch_down_to(&mut self, ctx: &Arc<Context>) -> Result<()> {
        let niterations = self.ctx.niterations_to(ctx)?;
        for _ in 0..niterations {
            self.mod_switch_down_next()?;
        }
        Ok(())
    }

    /// Restricts the polynomial to the moduli of `ctx`, which must all be
    /// moduli of the polynomial context. No rounding happens: the residues of
    /// the remaining moduli are kept as is, in the same representation.
    pub fn project_to(&self, ctx: &Arc<Context>) -> Result<Self> {
        if Arc::ptr_eq(&self.ctx, ctx) || self.ctx == *ctx {
            return Ok(Self {
                ctx: ctx.clone(),
                representation: self.representation,
                coefficients: self.coefficients.clone(),
            });
        }
        let indices = ctx.indices_in(&self.ctx).ok_or(Error::InvalidContext)?;
        Ok(Self {
            ctx: ctx.clone(),
            representation: self.representation,
            coefficients: self.coefficients.select(Axis(0), &indices),
        })
    }

    /// Substitute x by x^i in a polynomial, where i is odd and smaller than
    /// twice the degree.
    ///
    /// The representation of the polynomial is preserved.
    pub fn substitute(&self, i: usize) -> Result<Self> {
        let degree = self.ctx.degree;
        if i & 1 == 0 || i >= 2 * degree {
            return Err(Error::Default(format!(
                "Invalid substitution exponent {i}"
            )));
        }

        let mut source = self.clone();
        source.change_representation(Representation::PowerBasis);
        let mut q = Poly::zero(&self.ctx, Representation::PowerBasis);
        izip!(
            q.coefficients.outer_iter_mut(),
            source.coefficients.outer_iter(),
            self.ctx.q.iter()
        )
        .for_each(|(mut dst, src, qi)| {
            for (j, c) in src.iter().enumerate() {
                let k = (j * i) % (2 * degree);
                if k < degree {
                    dst[k] = qi.add(dst[k], *c);
                } else {
                    dst[k - degree] = qi.sub(dst[k - degree], *c);
                }
            }
        });
        source.zeroize();
        q.change_representation(self.representation);
        Ok(q)
    }

    /// Multiplies the residues of row `j` by `scalars[j]`.
    pub fn mul_rns_scalars(&mut self, scalars: &[u64]) -> Result<()> {
        if scalars.len() != self.ctx.moduli.len() {
            return Err(Error::Default(
                "The number of scalars differs from the number of moduli".to_string(),
            ));
        }
        izip!(
            self.coefficients.outer_iter_mut(),
            self.ctx.q.iter(),
            scalars.iter()
        )
        .for_each(|(mut v, qi, si)| {
            if let Some(slice) = v.as_slice_mut() {
                qi.scalar_mul_vec(slice, qi.reduce(*si))
            }
        });
        Ok(())
    }

    /// Returns the infinity norm of the centered lift of the polynomial.
    pub fn infinity_norm(&self) -> Result<BigInt> {
        let mut p = self.clone();
        p.change_representation(Representation::PowerBasis);
        Ok(p.lift_centered()?
            .into_iter()
            .map(|c| if c.sign() == num_bigint::Sign::Minus { -c } else { c })
            .max()
            .unwrap_or_default())
    }

    fn expect_representation(&self, representation: Representation) -> Result<()> {
        if self.representation != representation {
            Err(Error::IncorrectRepresentation(
                self.representation,
                representation,
            ))
        } else {
            Ok(())
        }
    }

    /// Rows of the coefficient matrix as vectors, mostly for tests.
    pub fn rows(&self) -> Vec<Vec<u64>> {
        self.coefficients
            .outer_iter()
            .map(|row| row.to_vec())
            .collect_vec()
    }
}

trait SeedExt {
    fn gen_seed(&mut self) -> <ChaCha8Rng as SeedableRng>::Seed;
}

impl<R: RngCore> SeedExt for R {
    fn gen_seed(&mut self) -> <ChaCha8Rng as SeedableRng>::Seed {
        let mut seed = <ChaCha8Rng as SeedableRng>::Seed::default();
        self.fill_bytes(&mut seed);
        seed
    }
}

impl AsRef<Poly> for Poly {
    fn as_ref(&self) -> &Poly {
        self
    }
}

impl AsMut<Poly> for Poly {
    fn as_mut(&mut self) -> &mut Poly {
        self
    }
}

impl Zeroize for Poly {
    fn zeroize(&mut self) {
        if let Some(coeffs) = self.coefficients.as_slice_mut() {
            coeffs.zeroize()
        }
    }
}
