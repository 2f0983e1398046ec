//! Key switching with a special modulus.
//!
//! A key switching key from a secret `s'` to a secret `s` holds, for every
//! ciphertext modulus `q_i`, a pair `(b_i, a_i)` modulo `Q P` such that
//! `b_i + a_i s = P g_i s' + e_i`, where `g_i` is the CRT basis element which
//! is 1 modulo `q_i` and 0 modulo the other ciphertext moduli.
//!
//! To switch a polynomial `c` at level `l`, it is decomposed into its RNS
//! digits `d_i = [c]_{q_i}`, each lifted to the moduli `q_0, ..., q_(L - l), P`.
//! The inner products `(sum d_i b_i, sum d_i a_i)` then satisfy
//! `sum d_i b_i + (sum d_i a_i) s = P c s' + small`, and dividing by `P` with
//! rounding yields a pair decrypting to `c s'` under `s`, with an additional
//! noise that is reduced by a factor `P`.
//!
//! The pairs `(b_i, a_i)` may be obtained either from the secret key `s`, in
//! which case `a_i` is uniform and generated from a seed, or as encryptions
//! under the public key of `s`. The latter is what allows a party to produce
//! re-encryption keys towards a public key it does not own the secret of.

use crate::proto::pre::KeySwitchingKey as KeySwitchingKeyProto;
use crate::{CryptoContext, Error, Result};
use fhe_math::rq::{traits::TryConvertFrom, Poly, Representation};
use fhe_traits::{DeserializeWithContext, Serialize};
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use zeroize::Zeroizing;

use super::{PublicKey, SecretKey};

#[derive(Debug, PartialEq, Eq, Clone)]
pub(crate) struct KeySwitchingKey {
    pub(crate) par: Arc<CryptoContext>,

    /// The seed that generated the polynomials `a_i`, if any.
    pub(crate) seed: Option<<ChaCha8Rng as SeedableRng>::Seed>,

    pub(crate) c0: Box<[Poly]>,
    pub(crate) c1: Box<[Poly]>,
}

impl KeySwitchingKey {
    /// Generate a key switching key from `from` (a polynomial of the first
    /// key switching context, in Ntt representation) to `sk`.
    pub(crate) fn new<R: RngCore + CryptoRng>(
        sk: &SecretKey,
        from: &Poly,
        rng: &mut R,
    ) -> Result<Self> {
        let ctx = sk.par.ks_ctx_at_level(0)?;
        let s = sk.poly(ctx)?;
        let seed = rng.gen::<<ChaCha8Rng as SeedableRng>::Seed>();
        let c1 = Self::generate_c1(&sk.par, seed)?;

        let c0 = c1
            .iter()
            .enumerate()
            .map(|(i, a)| -> Result<Poly> {
                let mut b = Poly::small(ctx, Representation::Ntt, sk.par.variance as f32, rng)?;
                b -= &(a * s.as_ref());
                b += Self::gadget(&sk.par, from, i)?.as_ref();
                Ok(b)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            par: sk.par.clone(),
            seed: Some(seed),
            c0: c0.into_boxed_slice(),
            c1: c1.into_boxed_slice(),
        })
    }

    /// Generate a key switching key from `from` to the secret key of `pk`,
    /// without knowing that secret key.
    pub(crate) fn from_public_key<R: RngCore + CryptoRng>(
        pk: &PublicKey,
        from: &Poly,
        rng: &mut R,
    ) -> Result<Self> {
        let par = &pk.par;
        let ctx = par.ks_ctx_at_level(0)?;
        let variance = par.variance as f32;
        let mut c0 = Vec::with_capacity(par.moduli().len());
        let mut c1 = Vec::with_capacity(par.moduli().len());
        for i in 0..par.moduli().len() {
            let u = Zeroizing::new(Poly::small(
                ctx,
                Representation::Ntt,
                SecretKey::SK_VARIANCE,
                rng,
            )?);
            let mut b = Poly::small(ctx, Representation::Ntt, variance, rng)?;
            b += &(&pk.c0 * u.as_ref());
            b += Self::gadget(par, from, i)?.as_ref();
            let mut a = Poly::small(ctx, Representation::Ntt, variance, rng)?;
            a += &(&pk.c1 * u.as_ref());
            c0.push(b);
            c1.push(a);
        }

        Ok(Self {
            par: par.clone(),
            seed: None,
            c0: c0.into_boxed_slice(),
            c1: c1.into_boxed_slice(),
        })
    }

    fn generate_c1(
        par: &Arc<CryptoContext>,
        seed: <ChaCha8Rng as SeedableRng>::Seed,
    ) -> Result<Vec<Poly>> {
        let ctx = par.ks_ctx_at_level(0)?;
        let mut rng = ChaCha8Rng::from_seed(seed);
        Ok((0..par.moduli().len())
            .map(|_| {
                let mut seed_i = <ChaCha8Rng as SeedableRng>::Seed::default();
                rng.fill_bytes(&mut seed_i);
                Poly::random_from_seed(ctx, Representation::Ntt, seed_i)
            })
            .collect())
    }

    /// `P g_i from`, which is `P from` modulo `q_i` and zero elsewhere.
    fn gadget(par: &CryptoContext, from: &Poly, i: usize) -> Result<Zeroizing<Poly>> {
        let ctx = par.ks_ctx_at_level(0)?;
        if from.ctx() != ctx || from.representation() != &Representation::Ntt {
            return Err(Error::MathError(fhe_math::Error::InvalidContext));
        }
        let scalars = ctx
            .moduli_operators()
            .iter()
            .enumerate()
            .map(|(j, qj)| {
                if j == i {
                    qj.reduce(par.special_modulus())
                } else {
                    0
                }
            })
            .collect::<Vec<_>>();
        let mut g = Zeroizing::new(from.clone());
        g.mul_rns_scalars(&scalars)?;
        Ok(g)
    }

    /// Switch the key of a polynomial of the ciphertext context at `level`.
    /// Returns `(d_0, d_1)` in Ntt representation such that
    /// `d_0 + d_1 s ~ p s'`.
    pub(crate) fn key_switch(&self, p: &Poly, level: usize) -> Result<(Poly, Poly)> {
        let ctx = self.par.ctx_at_level(level)?;
        let ks_ctx = self.par.ks_ctx_at_level(level)?;
        if p.ctx() != ctx {
            return Err(Error::MathError(fhe_math::Error::InvalidContext));
        }

        let mut p = p.clone();
        p.change_representation(Representation::PowerBasis);

        let mut d0 = Poly::zero(ks_ctx, Representation::Ntt);
        let mut d1 = Poly::zero(ks_ctx, Representation::Ntt);
        for (i, (row, qi)) in p
            .coefficients()
            .outer_iter()
            .zip(ctx.moduli_operators())
            .enumerate()
        {
            let digit = qi.center_vec(&row.to_vec());
            let digit = Poly::try_convert_from(digit.as_slice(), ks_ctx, Representation::Ntt)?;
            d0 += &(&digit * &self.c0[i].project_to(ks_ctx)?);
            d1 += &(&digit * &self.c1[i].project_to(ks_ctx)?);
        }

        d0.mod_switch_down_next()?;
        d1.mod_switch_down_next()?;
        Ok((d0.project_to(ctx)?, d1.project_to(ctx)?))
    }
}

impl From<&KeySwitchingKey> for KeySwitchingKeyProto {
    fn from(value: &KeySwitchingKey) -> Self {
        let mut ksk = KeySwitchingKeyProto::default();
        for c0 in value.c0.iter() {
            ksk.c0.push(c0.to_bytes())
        }
        if let Some(seed) = value.seed {
            ksk.seed = seed.to_vec()
        } else {
            for c1 in value.c1.iter() {
                ksk.c1.push(c1.to_bytes())
            }
        }
        ksk
    }
}

impl KeySwitchingKey {
    pub(crate) fn try_from_proto(
        value: &KeySwitchingKeyProto,
        par: &Arc<CryptoContext>,
    ) -> Result<Self> {
        let ctx = par.ks_ctx_at_level(0)?;
        let count = par.moduli().len();
        if value.c0.len() != count {
            return Err(Error::SerializationError);
        }
        let c0 = value
            .c0
            .iter()
            .map(|bytes| Poly::from_bytes(bytes, ctx).map_err(|_| Error::SerializationError))
            .collect::<Result<Vec<_>>>()?;

        let (seed, c1) = if value.seed.is_empty() {
            if value.c1.len() != count {
                return Err(Error::SerializationError);
            }
            let c1 = value
                .c1
                .iter()
                .map(|bytes| Poly::from_bytes(bytes, ctx).map_err(|_| Error::SerializationError))
                .collect::<Result<Vec<_>>>()?;
            (None, c1)
        } else {
            let seed = <ChaCha8Rng as SeedableRng>::Seed::try_from(value.seed.as_slice())
                .map_err(|_| Error::SerializationError)?;
            (Some(seed), Self::generate_c1(par, seed)?)
        };

        if c0
            .iter()
            .chain(c1.iter())
            .any(|p| p.representation() != &Representation::Ntt)
        {
            return Err(Error::SerializationError);
        }

        Ok(Self {
            par: par.clone(),
            seed,
            c0: c0.into_boxed_slice(),
            c1: c1.into_boxed_slice(),
        })
    }
}
