//! Benchmarks for population scoring, threshold derivation and triage.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;
use vulntriage::config::{CutMode, DEFAULT_QUANTILES};
use vulntriage::scoring::ReferenceMonth;
use vulntriage::{derive_thresholds, score_population, triage_select, PipelineConfig, Record};

fn create_population(size: usize) -> Vec<Record> {
    (0..size)
        .map(|i| {
            // Deterministic spread without a random source
            let k = (i * 7919 % 1000) as f64;
            Record::new()
                .with_field("_id", format!("v{i}"))
                .with_field("cvss", k / 100.0)
                .with_field("epss", (k * 37.0 % 1000.0) / 1000.0)
                .with_field("companyCriticality", (i % 11) as f64)
                .with_field("date", format!("{}-{:02}", 2015 + i % 10, 1 + i % 12))
        })
        .collect()
}

fn config() -> PipelineConfig {
    PipelineConfig::default().with_reference(ReferenceMonth::new(2025, 6))
}

fn bench_score_population(c: &mut Criterion) {
    let mut group = c.benchmark_group("score_population");
    for size in [100, 1_000, 10_000] {
        let records = create_population(size);
        group.bench_with_input(BenchmarkId::new("kmeans", size), &records, |b, records| {
            b.iter(|| score_population(black_box(records), &config()))
        });
        let legacy = PipelineConfig::legacy().with_reference(ReferenceMonth::new(2025, 6));
        group.bench_with_input(BenchmarkId::new("legacy", size), &records, |b, records| {
            b.iter(|| score_population(black_box(records), &legacy))
        });
    }
    group.finish();
}

fn bench_thresholds(c: &mut Criterion) {
    let scores: Vec<f64> = (0..10_000)
        .map(|i| ((i * 7919 % 10_000) as f64 / 1_000.0) - 5.0)
        .collect();
    c.bench_function("derive_thresholds_kmeans_10k", |b| {
        b.iter(|| derive_thresholds(black_box(&scores), CutMode::Kmeans, DEFAULT_QUANTILES, 6))
    });
    c.bench_function("derive_thresholds_quantiles_10k", |b| {
        b.iter(|| derive_thresholds(black_box(&scores), CutMode::Quantiles, DEFAULT_QUANTILES, 6))
    });
}

fn bench_triage(c: &mut Criterion) {
    let records = create_population(5_000);
    c.bench_function("triage_select_5k_cap_50", |b| {
        b.iter(|| triage_select(black_box(&records), 50, true, &config()))
    });
}

criterion_group!(benches, bench_score_population, bench_thresholds, bench_triage);
criterion_main!(benches);
