use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fhe_pre::{
    eval_mult, re_encrypt, CryptoContext, CryptoContextBuilder, Encoding, KeyPair, Plaintext,
    ReEncryptionKey, RelinearizationKey, Scheme,
};
use fhe_traits::{FheEncoder, FheEncrypter};
use rand::thread_rng;
use std::{sync::Arc, time::Duration};

fn contexts() -> Vec<Arc<CryptoContext>> {
    vec![
        CryptoContextBuilder::new(Scheme::Bfv)
            .set_plaintext_modulus(65537)
            .set_multiplicative_depth(2)
            .build_arc()
            .unwrap(),
        CryptoContextBuilder::new(Scheme::Ckks)
            .set_multiplicative_depth(2)
            .set_scaling_mod_size(50)
            .set_batch_size(8)
            .build_arc()
            .unwrap(),
    ]
}

fn encode(cc: &Arc<CryptoContext>) -> Plaintext {
    match cc.scheme() {
        Scheme::Bfv => Plaintext::try_encode(&[1u64, 2, 3] as &[u64], Encoding::packed(), cc),
        Scheme::Ckks => {
            Plaintext::try_encode(&[1.0, 2.0, 3.0] as &[f64], Encoding::ckks_packed(), cc)
        }
    }
    .unwrap()
}

pub fn pre_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pre");
    group.sample_size(10);
    group.warm_up_time(Duration::from_millis(500));
    let mut rng = thread_rng();

    for cc in contexts() {
        let name = format!("{:?}/{}", cc.scheme(), cc.degree());
        let alice = KeyPair::generate(&cc, &mut rng).unwrap();
        let bob = KeyPair::generate(&cc, &mut rng).unwrap();
        let rk = ReEncryptionKey::new(&alice.secret_key, &bob.public_key, &mut rng).unwrap();
        let relin = RelinearizationKey::new(&bob.secret_key, &mut rng).unwrap();
        let pt = encode(&cc);
        let ct = alice.public_key.try_encrypt(&pt, &mut rng).unwrap();
        let ct_bob = re_encrypt(&ct, &rk).unwrap();

        group.bench_function(BenchmarkId::new("keygen", &name), |b| {
            b.iter(|| KeyPair::generate(&cc, &mut rng).unwrap())
        });

        group.bench_function(BenchmarkId::new("rekeygen", &name), |b| {
            b.iter(|| ReEncryptionKey::new(&alice.secret_key, &bob.public_key, &mut rng).unwrap())
        });

        group.bench_function(BenchmarkId::new("encrypt", &name), |b| {
            b.iter(|| alice.public_key.try_encrypt(&pt, &mut rng).unwrap())
        });

        group.bench_function(BenchmarkId::new("re_encrypt", &name), |b| {
            b.iter(|| re_encrypt(&ct, &rk).unwrap())
        });

        group.bench_function(BenchmarkId::new("eval_mult", &name), |b| {
            b.iter(|| eval_mult(&ct_bob, &ct_bob, &relin).unwrap())
        });
    }

    group.finish();
}

criterion_group!(pre, pre_benchmark);
criterion_main!(pre);
