use itertools::Itertools;
use num_bigint::BigUint;
use std::{fmt::Debug, sync::Arc};

use crate::{ntt::NttOperator, rns::RnsContext, zq::Modulus, Error, Result};

/// Struct that holds the context associated with elements in rq.
///
/// Two contexts are equal when they share the same moduli and degree, since
/// every other field is derived deterministically from these.
#[derive(Default, Clone)]
pub struct Context {
    pub(crate) moduli: Box<[u64]>,
    pub(crate) q: Box<[Modulus]>,
    pub(crate) rns: Arc<RnsContext>,
    pub(crate) ops: Box<[NttOperator]>,
    pub(crate) degree: usize,
    /// `[q_last^(-1)]_{q_j}` for every modulus `q_j` but the last one.
    pub(crate) inv_last_qi_mod_qj: Box<[u64]>,
    pub(crate) inv_last_qi_mod_qj_shoup: Box<[u64]>,
    /// Context with the last modulus removed.
    pub(crate) next_context: Option<Arc<Context>>,
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("moduli", &self.moduli)
            .field("degree", &self.degree)
            .finish()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.degree == other.degree && self.moduli == other.moduli
    }
}

impl Eq for Context {}

impl Context {
    /// Creates a context from a list of moduli and a polynomial degree.
    ///
    /// Returns an error if the moduli are not distinct primes less than 62
    /// bits which support the NTT of size `degree`.
    pub fn new(moduli: &[u64], degree: usize) -> Result<Self> {
        if !degree.is_power_of_two() || degree < 8 {
            return Err(Error::Default(
                "The degree is not a power of two larger or equal to 8".to_string(),
            ));
        }

        let rns = Arc::new(RnsContext::new(moduli)?);
        let (q, ops): (Vec<Modulus>, Vec<NttOperator>) = moduli
            .iter()
            .map(|modulus| -> Result<(Modulus, NttOperator)> {
                let qi = Modulus::new(*modulus)?;
                let op = NttOperator::new(&qi, degree).ok_or_else(|| {
                    Error::Default(format!(
                        "Impossible to construct a Ntt operator for modulus {modulus}"
                    ))
                })?;
                Ok((qi, op))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unzip();

        let (last, others) = q.split_last().ok_or(Error::InvalidContext)?;
        let inv_last_qi_mod_qj = others
            .iter()
            .map(|qj| {
                qj.inv(qj.reduce(last.modulus()))
                    .ok_or(Error::Default("Moduli are not coprime".to_string()))
            })
            .collect::<Result<Vec<_>>>()?;
        let inv_last_qi_mod_qj_shoup = shoup_all(others, &inv_last_qi_mod_qj);

        let next_context = if moduli.len() >= 2 {
            Some(Arc::new(Context::new(&moduli[..moduli.len() - 1], degree)?))
        } else {
            None
        };

        Ok(Self {
            moduli: moduli.to_vec().into_boxed_slice(),
            q: q.into_boxed_slice(),
            rns,
            ops: ops.into_boxed_slice(),
            degree,
            inv_last_qi_mod_qj: inv_last_qi_mod_qj.into_boxed_slice(),
            inv_last_qi_mod_qj_shoup: inv_last_qi_mod_qj_shoup.into_boxed_slice(),
            next_context,
        })
    }

    /// Creates a context in an `Arc`.
    pub fn new_arc(moduli: &[u64], degree: usize) -> Result<Arc<Self>> {
        Self::new(moduli, degree).map(Arc::new)
    }

    /// Returns the modulus as a BigUint.
    pub fn modulus(&self) -> &BigUint {
        self.rns.modulus()
    }

    /// Returns a reference to the moduli in this context.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Returns a reference to the moduli as Modulus in this context.
    pub fn moduli_operators(&self) -> &[Modulus] {
        &self.q
    }

    /// Returns the degree of the polynomials in this context.
    pub const fn degree(&self) -> usize {
        self.degree
    }

    /// Returns the context with the last modulus removed, if any.
    pub fn next_context(&self) -> Option<&Arc<Context>> {
        self.next_context.as_ref()
    }

    /// Returns the number of iterations to switch to a children context.
    /// Returns an error if the context provided is not a child context.
    pub fn niterations_to(&self, context: &Arc<Context>) -> Result<usize> {
        if context.as_ref() == self {
            return Ok(0);
        }

        let mut niterations = 0;
        let mut current = self.next_context.as_ref();
        while let Some(ctx) = current {
            niterations += 1;
            if Arc::ptr_eq(ctx, context) || ctx == context {
                return Ok(niterations);
            }
            current = ctx.next_context.as_ref();
        }
        Err(Error::InvalidContext)
    }

    /// Returns the context after `i` iterations.
    pub fn context_at_level(self: &Arc<Self>, i: usize) -> Result<Arc<Self>> {
        let mut current = self.clone();
        for _ in 0..i {
            current = current
                .next_context
                .clone()
                .ok_or(Error::NoMoreContext)?;
        }
        Ok(current)
    }

    /// Returns the indices of this context's moduli inside `other`, or `None`
    /// if some modulus of this context is absent from `other`.
    pub(crate) fn indices_in(&self, other: &Context) -> Option<Vec<usize>> {
        if self.degree != other.degree {
            return None;
        }
        self.moduli
            .iter()
            .map(|qi| other.moduli.iter().position(|qj| qj == qi))
            .collect()
    }
}

fn shoup_all(q: &[Modulus], values: &[u64]) -> Vec<u64> {
    q.iter()
        .zip_eq(values.iter())
        .map(|(qi, vi)| qi.shoup(*vi))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::{error::Error, sync::Arc};

    use crate::ntt::supports_ntt;
    use crate::rq::Context;

    const MODULI: &[u64; 5] = &[
        1153,
        4611686018326724609,
        4611686018309947393,
        4611686018232352769,
        4611686018171535361,
    ];

    #[test]
    fn context_constructor() {
        for modulus in MODULI {
            assert!(Context::new(&[*modulus], 8).is_ok());

            if supports_ntt(*modulus, 128) {
                assert!(Context::new(&[*modulus], 128).is_ok());
            } else {
                assert!(Context::new(&[*modulus], 128).is_err());
            }
        }

        assert!(Context::new(MODULI, 8).is_ok());
        assert!(Context::new(MODULI, 128).is_err());
        assert!(Context::new(MODULI, 12).is_err());
        assert!(Context::new(&[1153, 1153], 8).is_err());
    }

    #[test]
    fn next_context() -> Result<(), Box<dyn Error>> {
        let context = Arc::new(Context::new(MODULI, 8)?);
        assert_eq!(
            context.next_context,
            Some(Arc::new(Context::new(&MODULI[..MODULI.len() - 1], 8)?))
        );

        let mut number_of_children = 0;
        let mut current = context.next_context();
        while let Some(ctx) = current {
            number_of_children += 1;
            current = ctx.next_context();
        }
        assert_eq!(number_of_children, MODULI.len() - 1);

        Ok(())
    }

    #[test]
    fn niterations_to() -> Result<(), Box<dyn Error>> {
        let context = Arc::new(Context::new(MODULI, 8)?);

        assert_eq!(context.niterations_to(&context).ok(), Some(0));
        assert_eq!(
            context
                .niterations_to(&Arc::new(Context::new(&MODULI[1..], 8)?))
                .err(),
            Some(crate::Error::InvalidContext)
        );

        for i in 1..MODULI.len() {
            let child = Arc::new(Context::new(&MODULI[..MODULI.len() - i], 8)?);
            assert_eq!(context.niterations_to(&child).ok(), Some(i));
            assert_eq!(context.context_at_level(i)?, child);
        }
        assert!(context.context_at_level(MODULI.len()).is_err());

        Ok(())
    }

    #[test]
    fn sub_basis_indices() -> Result<(), Box<dyn Error>> {
        let context = Context::new(MODULI, 8)?;
        let sub = Context::new(&[MODULI[3], MODULI[0]], 8)?;
        assert_eq!(sub.indices_in(&context), Some(vec![3, 0]));
        assert_eq!(context.indices_in(&sub), None);
        Ok(())
    }
}
