use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ecm::ecm_singlethreaded;
use rug::Integer;

pub fn ecm_f6_benchmark(c: &mut Criterion) {
    let fermat = Integer::from(Integer::u_pow_u(2, 2u32.pow(6))) + 1;
    let b1 = 10000;
    let b2 = 100 * b1;
    c.bench_function("ecm F_6", |b| {
        b.iter(|| ecm_singlethreaded(black_box(&fermat), black_box(&None), black_box(b1), black_box(b2), black_box(&None)))
    });
}

criterion_group!(benches, ecm_f6_benchmark);
criterion_main!(benches);
