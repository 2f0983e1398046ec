use fhe_pre::{
    eval_add, eval_mult, eval_sum, re_encrypt, Ciphertext, CryptoContext, CryptoContextBuilder,
    Encoding, Error, EvalSumKey, KeyPair, Plaintext, ReEncryptionKey, RelinearizationKey, Scheme,
    SecurityLevel,
};
use fhe_traits::{
    DeserializeParametrized, FheDecoder, FheDecrypter, FheEncoder, FheEncrypter, Serialize,
};
use rand::thread_rng;
use std::{error::Error as StdError, sync::Arc};

fn bfv_context() -> Result<Arc<CryptoContext>, Error> {
    CryptoContextBuilder::new(Scheme::Bfv)
        .set_plaintext_modulus(65537)
        .set_multiplicative_depth(2)
        .set_security_level(SecurityLevel::Classic128)
        .build_arc()
}

fn ckks_context() -> Result<Arc<CryptoContext>, Error> {
    CryptoContextBuilder::new(Scheme::Ckks)
        .set_multiplicative_depth(2)
        .set_scaling_mod_size(50)
        .set_batch_size(8)
        .set_security_level(SecurityLevel::Classic128)
        .build_arc()
}

/// Bob's ciphertext is moved to Alice's key and combined with Alice's own.
fn add_and_mul(
    cc: &Arc<CryptoContext>,
    a: &Plaintext,
    b: &Plaintext,
) -> Result<(Plaintext, Plaintext), Box<dyn StdError>> {
    let mut rng = thread_rng();
    let alice = KeyPair::generate(cc, &mut rng)?;
    let bob = KeyPair::generate(cc, &mut rng)?;
    let relin = RelinearizationKey::new(&alice.secret_key, &mut rng)?;

    let ct_a = alice.public_key.try_encrypt(a, &mut rng)?;
    let ct_b = bob.public_key.try_encrypt(b, &mut rng)?;
    let rk = ReEncryptionKey::new(&bob.secret_key, &alice.public_key, &mut rng)?;
    let ct_b = re_encrypt(&ct_b, &rk)?;
    assert_eq!(ct_b.key_id(), alice.key_id());
    assert!(matches!(
        bob.secret_key.try_decrypt(&ct_b),
        Err(Error::KeyMismatch { .. })
    ));

    let mut sum = alice.secret_key.try_decrypt(&eval_add(&ct_a, &ct_b)?)?;
    let mut product = alice
        .secret_key
        .try_decrypt(&eval_mult(&ct_a, &ct_b, &relin)?)?;
    sum.set_length(3);
    product.set_length(3);
    Ok((sum, product))
}

#[test]
fn bfv_multi_key() -> Result<(), Box<dyn StdError>> {
    let cc = bfv_context()?;
    let a = Plaintext::try_encode(&[1i64, 2, 3] as &[i64], Encoding::packed(), &cc)?;
    let b = Plaintext::try_encode(&[4i64, 0, 6] as &[i64], Encoding::packed(), &cc)?;
    let (sum, product) = add_and_mul(&cc, &a, &b)?;

    assert_eq!(Vec::<i64>::try_decode(&sum, Encoding::packed())?, [5, 2, 9]);
    assert_eq!(Vec::<i64>::try_decode(&product, Encoding::packed())?, [4, 0, 18]);
    assert_eq!(sum.to_string(), "( 5 2 9 ... )");
    Ok(())
}

#[test]
fn ckks_multi_key() -> Result<(), Box<dyn StdError>> {
    let cc = ckks_context()?;
    for (a, b) in [
        ([1.0, 2.0, 3.0], [4.0, 0.0, 6.0]),
        ([0.5, 2.2, 3.3], [4.4, 5.5, 6.6]),
    ] {
        let pa = Plaintext::try_encode(&a as &[f64], Encoding::ckks_packed(), &cc)?;
        let pb = Plaintext::try_encode(&b as &[f64], Encoding::ckks_packed(), &cc)?;
        let (sum, product) = add_and_mul(&cc, &pa, &pb)?;

        let sum = Vec::<f64>::try_decode(&sum, Encoding::ckks_packed())?;
        let product = Vec::<f64>::try_decode(&product, Encoding::ckks_packed())?;
        assert_eq!(sum.len(), 3);
        for i in 0..3 {
            assert!((sum[i] - (a[i] + b[i])).abs() < 1e-6);
            assert!((product[i] - a[i] * b[i]).abs() < 1e-6);
        }
    }
    Ok(())
}

#[test]
fn ciphertexts_hide_the_plaintext() -> Result<(), Box<dyn StdError>> {
    let mut rng = thread_rng();
    let cc = bfv_context()?;
    let kp = KeyPair::generate(&cc, &mut rng)?;
    let pt = Plaintext::try_encode(&[1u64, 2, 3] as &[u64], Encoding::packed(), &cc)?;

    let ct1 = kp.public_key.try_encrypt(&pt, &mut rng)?;
    let ct2 = kp.public_key.try_encrypt(&pt, &mut rng)?;
    assert_ne!(ct1, ct2);
    assert_ne!(ct1.to_bytes(), ct2.to_bytes());

    let other = KeyPair::generate(&cc, &mut rng)?;
    assert_eq!(
        other.secret_key.try_decrypt(&ct1).err(),
        Some(Error::KeyMismatch {
            expected: other.key_id(),
            found: kp.key_id(),
        })
    );
    Ok(())
}

#[test]
fn proxy_workflow_over_bytes() -> Result<(), Box<dyn StdError>> {
    let mut rng = thread_rng();
    let cc = bfv_context()?;
    let alice = KeyPair::generate(&cc, &mut rng)?;
    let bob = KeyPair::generate(&cc, &mut rng)?;
    let pt = Plaintext::try_encode(&[42u64, 7] as &[u64], Encoding::packed(), &cc)?;

    // The proxy only ever sees serialized keys and ciphertexts.
    let ct = alice.public_key.try_encrypt(&pt, &mut rng)?.to_bytes();
    let rk = ReEncryptionKey::new(&alice.secret_key, &bob.public_key, &mut rng)?.to_bytes();
    let proxied = re_encrypt(
        &Ciphertext::from_bytes(&ct, &cc)?,
        &ReEncryptionKey::from_bytes(&rk, &cc)?,
    )?
    .to_bytes();

    let mut decrypted = bob
        .secret_key
        .try_decrypt(&Ciphertext::from_bytes(&proxied, &cc)?)?;
    decrypted.set_length(2);
    assert_eq!(Vec::<u64>::try_decode(&decrypted, Encoding::packed())?, [42, 7]);
    Ok(())
}

#[test]
fn depth_is_enforced() -> Result<(), Box<dyn StdError>> {
    let mut rng = thread_rng();
    let cc = bfv_context()?;
    let alice = KeyPair::generate(&cc, &mut rng)?;
    let bob = KeyPair::generate(&cc, &mut rng)?;
    let relin = RelinearizationKey::new(&bob.secret_key, &mut rng)?;
    let sum_key = EvalSumKey::new(&bob.secret_key, &mut rng)?;
    let rk = ReEncryptionKey::new(&alice.secret_key, &bob.public_key, &mut rng)?;

    let pt = Plaintext::try_encode(&[3u64, 4] as &[u64], Encoding::packed(), &cc)?;
    let ct = re_encrypt(&alice.public_key.try_encrypt(&pt, &mut rng)?, &rk)?;
    let squared = eval_mult(&ct, &ct, &relin)?;
    assert_eq!(squared.depth(), 2);
    assert_eq!(
        eval_mult(&squared, &ct, &relin).err(),
        Some(Error::DepthExceeded {
            required: 3,
            available: 2
        })
    );

    // Slot summation is a rotation and does not consume depth.
    let summed = eval_sum(&squared, &sum_key)?;
    assert_eq!(summed.depth(), 2);
    let decoded =
        Vec::<u64>::try_decode(&bob.secret_key.try_decrypt(&summed)?, Encoding::packed())?;
    assert!(decoded.iter().all(|v| *v == 25));
    Ok(())
}

#[test]
fn vectors_beyond_capacity_are_rejected() -> Result<(), Box<dyn StdError>> {
    let cc = bfv_context()?;
    let values = vec![1u64; cc.batch_size() + 1];
    assert!(matches!(
        Plaintext::try_encode(values.as_slice(), Encoding::packed(), &cc),
        Err(Error::EncodingError(_))
    ));

    let cc = ckks_context()?;
    assert_eq!(cc.batch_size(), 8);
    assert!(matches!(
        Plaintext::try_encode(&[0.5; 9] as &[f64], Encoding::ckks_packed(), &cc),
        Err(Error::EncodingError(_))
    ));

    let mut pt = Plaintext::try_encode(&[0.5; 8] as &[f64], Encoding::ckks_packed(), &cc)?;
    pt.set_length(100_000);
    assert_eq!(pt.len(), 8);
    assert_eq!(Vec::<f64>::try_decode(&pt, Encoding::ckks_packed())?.len(), 8);
    Ok(())
}
