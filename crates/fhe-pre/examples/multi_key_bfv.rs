// Two parties encrypt integer vectors under their own BFV key pairs. Bob's
// ciphertext is re-encrypted to Alice's key, then combined with hers and
// decrypted by Alice.

mod util;

use console::style;
use fhe_pre::{
    eval_add, eval_mult, re_encrypt, CryptoContextBuilder, Encoding, EvalSumKey, KeyPair,
    Plaintext, ReEncryptionKey, RelinearizationKey, Scheme, SecurityLevel,
};
use fhe_traits::{FheDecrypter, FheEncoder, FheEncrypter};
use rand::thread_rng;
use std::error::Error;
use util::timeit::timeit;

fn main() -> Result<(), Box<dyn Error>> {
    util::init_tracing();
    let mut rng = thread_rng();

    println!("{}", style("=== Multi-key BFV ===").green().bold());
    let cc = timeit!(
        "Context generation",
        CryptoContextBuilder::new(Scheme::Bfv)
            .set_plaintext_modulus(65537)
            .set_multiplicative_depth(2)
            .set_security_level(SecurityLevel::Classic128)
            .build_arc()?
    );
    util::print_context(&cc);

    let alice = timeit!("Key generation (Alice)", KeyPair::generate(&cc, &mut rng)?);
    let alice_rk = RelinearizationKey::new(&alice.secret_key, &mut rng)?;
    let _alice_sum = EvalSumKey::new(&alice.secret_key, &mut rng)?;
    let bob = timeit!("Key generation (Bob)", KeyPair::generate(&cc, &mut rng)?);
    let _bob_rk = RelinearizationKey::new(&bob.secret_key, &mut rng)?;
    let _bob_sum = EvalSumKey::new(&bob.secret_key, &mut rng)?;

    let pt_a = Plaintext::try_encode(&[1i64, 2, 3] as &[i64], Encoding::packed(), &cc)?;
    let pt_b = Plaintext::try_encode(&[4i64, 0, 6] as &[i64], Encoding::packed(), &cc)?;
    let ct_a = alice.public_key.try_encrypt(&pt_a, &mut rng)?;
    let ct_b = bob.public_key.try_encrypt(&pt_b, &mut rng)?;

    let rk = timeit!(
        "Re-encryption key generation",
        ReEncryptionKey::new(&bob.secret_key, &alice.public_key, &mut rng)?
    );
    let ct_b_switched = timeit!("Re-encryption", re_encrypt(&ct_b, &rk)?);

    let ct_add = eval_add(&ct_a, &ct_b_switched)?;
    let ct_mul = timeit!("Multiplication", eval_mult(&ct_a, &ct_b_switched, &alice_rk)?);

    let mut pt_add = alice.secret_key.try_decrypt(&ct_add)?;
    let mut pt_mul = alice.secret_key.try_decrypt(&ct_mul)?;
    pt_add.set_length(3);
    pt_mul.set_length(3);

    println!("Add result: {pt_add}");
    println!("Mul result: {pt_mul}");
    Ok(())
}
