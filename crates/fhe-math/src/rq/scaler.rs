#![warn(missing_docs, unused_imports)]

//! Polynomial scaler.

use super::{Context, Poly, Representation};
use crate::{rns::ScalingFactor, Error, Result};
use ndarray::Array2;
use rayon::prelude::*;
use std::sync::Arc;

/// Context extender.
///
/// Maps a polynomial of `from` into a polynomial of `to` while multiplying
/// it by a rational factor, rounding to the nearest integer. The input is
/// interpreted through its centered lift in (-Q/2, Q/2].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaler {
    from: Arc<Context>,
    to: Arc<Context>,
    factor: ScalingFactor,
}

impl Scaler {
    /// Create a scaler from a context `from` to a context `to`.
    pub fn new(from: &Arc<Context>, to: &Arc<Context>, factor: ScalingFactor) -> Result<Self> {
        if from.degree != to.degree {
            return Err(Error::Default("Incompatible degrees".to_string()));
        }
        Ok(Self {
            from: from.clone(),
            to: to.clone(),
            factor,
        })
    }

    /// Scale a polynomial. The output is in the same representation as the
    /// input.
    pub fn scale(&self, p: &Poly) -> Result<Poly> {
        if p.ctx.as_ref() != self.from.as_ref() {
            return Err(Error::InvalidContext);
        }

        let mut input = p.clone();
        input.change_representation(Representation::PowerBasis);

        let columns = (0..self.from.degree)
            .into_par_iter()
            .map(|j| {
                let x = self.from.rns.lift_centered(input.coefficients.column(j));
                self.to.rns.project_signed(&self.factor.scale(&x))
            })
            .collect::<Vec<_>>();

        let nmoduli = self.to.moduli.len();
        let mut coefficients = Array2::zeros((nmoduli, self.to.degree));
        for (j, column) in columns.iter().enumerate() {
            for (i, c) in column.iter().enumerate() {
                coefficients[[i, j]] = *c;
            }
        }

        let mut out = Poly {
            ctx: self.to.clone(),
            representation: Representation::PowerBasis,
            coefficients,
        };
        out.change_representation(p.representation);
        Ok(out)
    }
}
