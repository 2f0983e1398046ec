//! Implementation of operations over polynomials.

use super::{Poly, Representation};
use itertools::izip;
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

impl Poly {
    fn assert_compatible(&self, p: &Poly) {
        assert!(
            std::sync::Arc::ptr_eq(&self.ctx, &p.ctx) || self.ctx == p.ctx,
            "Incompatible contexts"
        );
        assert_eq!(
            self.representation, p.representation,
            "Incompatible representations"
        );
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, p: &Poly) {
        self.assert_compatible(p);
        izip!(
            self.coefficients.outer_iter_mut(),
            p.coefficients.outer_iter(),
            self.ctx.q.iter()
        )
        .for_each(|(mut v1, v2, qi)| {
            v1.iter_mut()
                .zip(v2.iter())
                .for_each(|(x, y)| *x = qi.add(*x, *y))
        });
    }
}

impl Add<&Poly> for &Poly {
    type Output = Poly;
    fn add(self, p: &Poly) -> Poly {
        let mut q = self.clone();
        q += p;
        q
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, p: &Poly) {
        self.assert_compatible(p);
        izip!(
            self.coefficients.outer_iter_mut(),
            p.coefficients.outer_iter(),
            self.ctx.q.iter()
        )
        .for_each(|(mut v1, v2, qi)| {
            v1.iter_mut()
                .zip(v2.iter())
                .for_each(|(x, y)| *x = qi.sub(*x, *y))
        });
    }
}

impl Sub<&Poly> for &Poly {
    type Output = Poly;
    fn sub(self, p: &Poly) -> Poly {
        let mut q = self.clone();
        q -= p;
        q
    }
}

impl MulAssign<&Poly> for Poly {
    /// Multiplication of polynomials in Ntt representation.
    ///
    /// Aborts if the polynomials are not in Ntt representation.
    fn mul_assign(&mut self, p: &Poly) {
        self.assert_compatible(p);
        assert_eq!(
            self.representation,
            Representation::Ntt,
            "Multiplication requires an Ntt representation."
        );
        izip!(
            self.coefficients.outer_iter_mut(),
            p.coefficients.outer_iter(),
            self.ctx.q.iter()
        )
        .for_each(|(mut v1, v2, qi)| {
            v1.iter_mut()
                .zip(v2.iter())
                .for_each(|(x, y)| *x = qi.mul(*x, *y))
        });
    }
}

impl Mul<&Poly> for &Poly {
    type Output = Poly;
    fn mul(self, p: &Poly) -> Poly {
        let mut q = self.clone();
        q *= p;
        q
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        let mut out = self.clone();
        izip!(out.coefficients.outer_iter_mut(), self.ctx.q.iter()).for_each(|(mut v, qi)| {
            v.iter_mut().for_each(|x| *x = qi.neg(*x));
        });
        out
    }
}

impl Neg for Poly {
    type Output = Poly;

    fn neg(self) -> Poly {
        -&self
    }
}
