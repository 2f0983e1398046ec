//! Summation of the slots of a ciphertext.

use crate::{Ciphertext, Error, EvalSumKey, Feature, Result};

/// Sums the slots of a packed ciphertext: afterwards, every slot of the batch
/// holds the sum of all the slots of the batch.
pub fn eval_sum(ct: &Ciphertext, key: &EvalSumKey) -> Result<Ciphertext> {
    ct.par.require(Feature::AdvancedShe)?;
    if ct.par != key.par {
        return Err(Error::ParametersMismatch);
    }
    if ct.key_id != key.key_id {
        return Err(Error::KeyMismatch {
            expected: key.key_id,
            found: ct.key_id,
        });
    }

    let mut out = ct.clone();
    for gk in key.keys.iter() {
        let rotated = gk.apply(&out)?;
        out.c
            .iter_mut()
            .zip(rotated.c.iter())
            .for_each(|(oi, ri)| *oi += ri);
    }
    Ok(out)
}
