// Re-encryption of a CKKS ciphertext from Bob's key to Alice's key, with
// values that are not exactly representable.

mod util;

use fhe_pre::{
    eval_add, eval_mult, re_encrypt, CryptoContextBuilder, Encoding, EvalSumKey, KeyPair,
    Plaintext, ReEncryptionKey, RelinearizationKey, Scheme, SecurityLevel,
};
use fhe_traits::{FheDecrypter, FheEncoder, FheEncrypter};
use rand::thread_rng;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    util::init_tracing();
    let mut rng = thread_rng();

    let cc = CryptoContextBuilder::new(Scheme::Ckks)
        .set_multiplicative_depth(2)
        .set_scaling_mod_size(50)
        .set_batch_size(8)
        .set_security_level(SecurityLevel::Classic128)
        .build_arc()?;
    println!("CKKS CryptoContext generated.");

    let alice = KeyPair::generate(&cc, &mut rng)?;
    let alice_rk = RelinearizationKey::new(&alice.secret_key, &mut rng)?;
    let _alice_sum = EvalSumKey::new(&alice.secret_key, &mut rng)?;
    let bob = KeyPair::generate(&cc, &mut rng)?;
    let _bob_rk = RelinearizationKey::new(&bob.secret_key, &mut rng)?;
    let _bob_sum = EvalSumKey::new(&bob.secret_key, &mut rng)?;

    let vec_a = [0.5, 2.2, 3.3];
    let vec_b = [4.4, 5.5, 6.6];
    let pt_a = Plaintext::try_encode(&vec_a as &[f64], Encoding::ckks_packed(), &cc)?;
    let pt_b = Plaintext::try_encode(&vec_b as &[f64], Encoding::ckks_packed(), &cc)?;
    let ct_a = alice.public_key.try_encrypt(&pt_a, &mut rng)?;
    let ct_b = bob.public_key.try_encrypt(&pt_b, &mut rng)?;

    let rk = ReEncryptionKey::new(&bob.secret_key, &alice.public_key, &mut rng)?;
    let ct_b_switched = re_encrypt(&ct_b, &rk)?;

    let ct_add = eval_add(&ct_a, &ct_b_switched)?;
    let ct_mul = eval_mult(&ct_a, &ct_b_switched, &alice_rk)?;

    let mut pt_add = alice.secret_key.try_decrypt(&ct_add)?;
    pt_add.set_length(vec_a.len());
    let mut pt_mul = alice.secret_key.try_decrypt(&ct_mul)?;
    pt_mul.set_length(vec_a.len());

    println!("Add result: {pt_add}");
    println!("Mul result: {pt_mul}");
    Ok(())
}
