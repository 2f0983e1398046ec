use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fhe_math::{
    rns::ScalingFactor,
    rq::{scaler::Scaler, Context, Poly, Representation},
    zq::primes::generate_prime,
};
use num_bigint::BigUint;
use rand::thread_rng;
use std::{sync::Arc, time::Duration};

fn moduli(count: usize, degree: usize) -> Vec<u64> {
    let mut moduli = Vec::with_capacity(count);
    let mut upper_bound = 1u64 << 62;
    while moduli.len() < count {
        if let Some(p) = generate_prime(62, 2 * degree as u64, upper_bound) {
            moduli.push(p);
            upper_bound = p;
        }
    }
    moduli
}

pub fn rq_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("rq");
    group.sample_size(20);
    group.warm_up_time(Duration::from_millis(500));
    let mut rng = thread_rng();

    for degree in [1024usize, 8192] {
        let ctx = Arc::new(Context::new(&moduli(3, degree), degree).unwrap());
        let p = Poly::random(&ctx, Representation::Ntt, &mut rng);
        let q = Poly::random(&ctx, Representation::Ntt, &mut rng);

        group.bench_function(BenchmarkId::new("mul", degree), |b| b.iter(|| &p * &q));

        group.bench_function(BenchmarkId::new("ntt_roundtrip", degree), |b| {
            b.iter(|| {
                let mut r = p.clone();
                r.change_representation(Representation::PowerBasis);
                r.change_representation(Representation::Ntt);
                r
            })
        });

        group.bench_function(BenchmarkId::new("mod_switch_down_next", degree), |b| {
            b.iter(|| {
                let mut r = p.clone();
                r.mod_switch_down_next().unwrap();
                r
            })
        });

        let to = Arc::new(Context::new(&moduli(5, degree), degree).unwrap());
        let scaler = Scaler::new(
            &ctx,
            &to,
            ScalingFactor::new(&BigUint::from(65537u64), ctx.modulus()),
        )
        .unwrap();
        group.bench_function(BenchmarkId::new("scale", degree), |b| {
            b.iter(|| scaler.scale(&p).unwrap())
        });
    }

    group.finish();
}

criterion_group!(rq, rq_benchmark);
criterion_main!(rq);
