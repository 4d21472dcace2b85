//! Pipeline throughput benchmarks.
//!
//! Measures:
//! - Single-record validation through a full loan pipeline
//! - Early exit cost when a halting stage fails first
//! - Batch validation at several batch sizes

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use gauntlet::prelude::*;

fn loan_pipeline() -> ValidationPipeline<Record> {
    let blocklist = Arc::new(BlocklistService::with_subjects(
        "blocklist",
        ["mallory", "trudy"],
        "fraud",
    ));

    ValidationPipeline::builder()
        .add(RequiredFields::new(["applicant", "email", "amount", "income"]))
        .add(
            FieldRules::new(Vec::new())
                .with_name("Format")
                .rule(
                    FieldRule::new("email")
                        .with_type(FieldType::String)
                        .with_constraint(Constraint::NotEmpty),
                )
                .rule(FieldRule::new("amount").with_type(FieldType::Float).with_range(1_000.0, 50_000.0)),
        )
        .add(FieldComparison::new("amount", Comparison::Le, "income"))
        .add(RiskScreen::new("applicant", blocklist))
        .build()
}

fn application(i: usize) -> Record {
    Record::new()
        .with("applicant", format!("applicant-{}", i))
        .with("email", format!("applicant-{}@example.com", i))
        .with("amount", (i % 60_000) as i64)
        .with("income", 40_000.0)
}

fn bench_single(c: &mut Criterion) {
    let mut group = c.benchmark_group("single");
    let pipeline = loan_pipeline();

    let valid = application(12_000);
    group.bench_function("all_stages", |b| b.iter(|| pipeline.validate(black_box(&valid))));

    let incomplete = Record::new().with("applicant", "ada");
    group.bench_function("halted_first_stage", |b| {
        b.iter(|| pipeline.validate(black_box(&incomplete)))
    });

    group.bench_function("traced", |b| b.iter(|| pipeline.validate_traced(black_box(&valid))));

    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let pipeline = loan_pipeline();

    for size in [100, 1_000, 10_000] {
        let records: Vec<Record> = (0..size).map(application).collect();
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("parallel", size), &records, |b, records| {
            b.iter(|| pipeline.validate_batch(black_box(records)))
        });

        group.bench_with_input(BenchmarkId::new("serial", size), &records, |b, records| {
            b.iter(|| {
                records
                    .iter()
                    .map(|record| pipeline.validate(black_box(record)))
                    .collect::<Vec<_>>()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single, bench_batch);
criterion_main!(benches);
