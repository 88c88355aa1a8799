//! Benchmarks for line searches and a full gradient-based run.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use optkit::convergence::{DeltaX, MaxIterations};
use optkit::line_search::{ArithmeticMean, Backtracking, DscPowell, GoldenSection, LineSearch};
use optkit::optimizer::{GradientBased, OptimizationMethod};
use optkit::search_direction::{Bfgs, SteepestDescent};

fn quartic(x: &[f64]) -> f64 {
    x.iter()
        .enumerate()
        .map(|(i, v)| (v - i as f64).powi(4) + (v - i as f64).powi(2))
        .sum()
}

fn bench_line_searches(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_search");
    let x = vec![-1.0; 4];
    let direction = vec![0.5; 4];

    let mut searches: Vec<(&str, Box<dyn LineSearch>)> = vec![
        ("golden_section", Box::new(GoldenSection::new(1e-8, 1.0))),
        ("dsc_powell", Box::new(DscPowell::default())),
        ("arithmetic_mean", Box::new(ArithmeticMean::default())),
        ("backtracking", Box::new(Backtracking::default())),
    ];
    for (name, search) in searches.iter_mut() {
        group.bench_function(*name, |b| {
            b.iter(|| {
                let mut f = |p: &[f64]| quartic(p);
                search.find_alpha_star(&mut f, black_box(&x), black_box(&direction))
            });
        });
    }
    group.finish();
}

fn bench_gradient_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("gradient_based");
    for dimension in [2usize, 8, 32].iter() {
        let start = vec![3.0; *dimension];
        group.bench_with_input(BenchmarkId::new("bfgs", dimension), dimension, |b, _| {
            b.iter(|| {
                let mut method = GradientBased::new()
                    .with_objective(quartic)
                    .with_search_direction(Bfgs::new())
                    .with_line_search(GoldenSection::new(1e-8, 1.0))
                    .with_convergence(DeltaX::new(1e-8))
                    .with_convergence(MaxIterations::new(200));
                method.run(Some(black_box(&start))).unwrap()
            });
        });
        group.bench_with_input(
            BenchmarkId::new("steepest_descent", dimension),
            dimension,
            |b, _| {
                b.iter(|| {
                    let mut method = GradientBased::new()
                        .with_objective(quartic)
                        .with_search_direction(SteepestDescent::new())
                        .with_line_search(DscPowell::default())
                        .with_convergence(DeltaX::new(1e-8))
                        .with_convergence(MaxIterations::new(200));
                    method.run(Some(black_box(&start))).unwrap()
                });
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_line_searches, bench_gradient_run);
criterion_main!(benches);
