//! Regression and preparation performance benchmarks.
//!
//! Measures OLS fitting (dominated by the normal-equation inverse) and a
//! full preparation pass over synthetic survey-style data.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use assay::prepare::{build_final_dataset, MissingStrategy};
use assay::{ols_regression, Adjustments, AssayConfig, ColumnInfo, PrepDecisions, Row, Value};

const GROUPS: [&str; 4] = ["north", "south", "east", "west"];

/// Generate rows with `predictors` numeric columns, one factor and an outcome.
fn generate_rows(rows: usize, predictors: usize) -> Vec<Row> {
    (0..rows)
        .map(|i| {
            let mut r: Row = (0..predictors)
                .map(|p| {
                    let x = ((i * (p + 3)) % 97) as f64 / 10.0;
                    (format!("x{}", p), Value::from(x))
                })
                .collect();
            let y: f64 = r.values().filter_map(Value::as_f64).sum::<f64>() + (i % 7) as f64;
            r.insert("region".to_string(), Value::from(GROUPS[i % GROUPS.len()]));
            r.insert(
                "y".to_string(),
                if i % 50 == 0 { Value::Missing } else { Value::from(y) },
            );
            r
        })
        .collect()
}

fn columns(predictors: usize) -> Vec<ColumnInfo> {
    let mut columns: Vec<ColumnInfo> = (0..predictors)
        .map(|p| ColumnInfo::numeric(format!("x{}", p)))
        .collect();
    columns.push(ColumnInfo::categorical("region"));
    columns.push(ColumnInfo::numeric("y").with_missing_pct(2.0));
    columns
}

fn bench_ols(c: &mut Criterion) {
    let mut group = c.benchmark_group("ols_regression");
    let config = AssayConfig::default();

    for (rows, predictors) in [(100, 3), (1_000, 5), (5_000, 10)] {
        let data = generate_rows(rows, predictors);
        let cols = columns(predictors);
        let mut names: Vec<String> = (0..predictors).map(|p| format!("x{}", p)).collect();
        names.push("region".to_string());

        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(
            BenchmarkId::new(format!("{}_predictors", predictors), rows),
            &data,
            |b, data| {
                b.iter(|| ols_regression(black_box(data), "y", &names, &cols, &config))
            },
        );
    }
    group.finish();
}

fn bench_prepare(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_final_dataset");
    let decisions = PrepDecisions::new()
        .with_missing_strategy(MissingStrategy::ImputeMedian)
        .remove_duplicates();
    let adjustments = Adjustments::new().excluding_outliers("benchmark");

    for rows in [1_000, 10_000] {
        let data = generate_rows(rows, 5);
        let cols = columns(5);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| build_final_dataset(black_box(data), &cols, &decisions, &adjustments, Some("y")))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_ols, bench_prepare);
criterion_main!(benches);
