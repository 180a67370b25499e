#[macro_use]
extern crate criterion;
extern crate escapetime;

use criterion::Criterion;
use escapetime::{render, Fractal, RenderConfig};

fn config(fractal: Fractal, threads: usize) -> RenderConfig {
    RenderConfig {
        width: 200,
        height: 150,
        max_iterations: 200,
        threads,
        ..RenderConfig::new(fractal)
    }
}

fn direct(c: &mut Criterion) {
    c.bench_function("mandelbrot 200x150", |b| {
        let config = config(Fractal::Mandelbrot, 1);
        b.iter(|| render(&config).unwrap())
    });
    c.bench_function("burningship 200x150", |b| {
        let config = config(Fractal::BurningShip, 1);
        b.iter(|| render(&config).unwrap())
    });
}

fn density(c: &mut Criterion) {
    c.bench_function("buddhabrot 200x150", |b| {
        let config = config(Fractal::Buddhabrot, 1);
        b.iter(|| render(&config).unwrap())
    });
    c.bench_function("buddhabrot 200x150, 4 threads", |b| {
        let config = config(Fractal::Buddhabrot, 4);
        b.iter(|| render(&config).unwrap())
    });
}

criterion_group!(benches, direct, density);
criterion_main!(benches);
