#[macro_use]
extern crate criterion;
extern crate mandelfarm;

use criterion::Criterion;
use mandelfarm::kernel::{compute, compute_parallel};

fn strip_serial(c: &mut Criterion) {
    c.bench_function("compute 800x20 strip", |b| {
        b.iter(|| compute(-2.5, -0.05, 1.0, 0.0, 800, 20, 1000))
    });
}

fn strip_parallel(c: &mut Criterion) {
    c.bench_function("compute_parallel 800x20 strip, 4 threads", |b| {
        b.iter(|| compute_parallel((-2.5, -0.05, 1.0, 0.0), 800, 20, 1000, 4))
    });
}

criterion_group!(benches, strip_serial, strip_parallel);
criterion_main!(benches);
