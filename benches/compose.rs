//! Benchmarks for statement composition.

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tagsql::{Composer, MutationSet, SqlValue, Statement, Template, Value, batch, join, stmt};

/// Benchmark flat templates with scalar parameters.
fn bench_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat");
    let composer = Composer::default();

    group.bench_function("select_two_params", |b| {
        b.iter(|| {
            black_box(
                composer
                    .compose(
                        stmt!(
                            "SELECT * FROM {} WHERE \"email\" = {} AND \"role\" = {}",
                            Value::table("User"),
                            "a@b.com",
                            "owner"
                        ),
                        None,
                    )
                    .unwrap(),
            )
        })
    });

    group.bench_function("update_tracked", |b| {
        b.iter(|| {
            let mut changed = MutationSet::new();
            black_box(
                composer
                    .compose(
                        stmt!(
                            "UPDATE {} SET \"qty\" = {} WHERE \"id\" = {}",
                            Value::table("Stock"),
                            3,
                            11
                        ),
                        Some(&mut changed),
                    )
                    .unwrap(),
            );
            black_box(changed)
        })
    });

    group.finish();
}

/// Benchmark nested statement flattening at increasing depth.
fn bench_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested");
    let composer = Composer::default();

    for depth in [1usize, 5, 20] {
        let mut inner = Statement::from_sql("\"d\" = $1", vec![SqlValue::Int(0)]);
        for i in 1..depth {
            inner = composer
                .compose(stmt!("\"d\" = {} AND ({})", i as i64, inner), None)
                .unwrap();
        }

        group.bench_with_input(BenchmarkId::from_parameter(depth), &inner, |b, inner| {
            b.iter(|| {
                black_box(
                    composer
                        .compose(stmt!("SELECT * FROM {} WHERE {}", Value::table("T"), inner.clone()), None)
                        .unwrap(),
                )
            })
        });
    }

    group.finish();
}

/// Benchmark multi-row batch expansion.
fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");
    let composer = Composer::default();

    for rows in [10usize, 100, 1000] {
        let data: Vec<Vec<Value>> = (0..rows)
            .map(|i| vec![Value::from(i as i64), Value::from("name"), Value::from(true)])
            .collect();

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| {
                let template = Template::new(
                    vec!["INSERT INTO ", " (\"id\", \"name\", \"active\") VALUES ", ""],
                    vec![Value::table("User"), batch(data.clone())],
                );
                black_box(composer.compose(template, None).unwrap())
            })
        });
    }

    group.finish();
}

/// Benchmark joining predicate fragments.
fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join");

    for count in [2usize, 10, 50] {
        let parts: Vec<Statement> = (0..count)
            .map(|i| Statement::from_sql("\"c\" = $1", vec![SqlValue::Int(i as i64)]))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), &parts, |b, parts| {
            b.iter(|| black_box(join(parts.clone(), " AND ")))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_flat, bench_nested, bench_batch, bench_join);
criterion_main!(benches);
