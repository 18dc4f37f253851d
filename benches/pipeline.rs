//! Throughput of the in-memory stages on a synthetic clean dataset.

use std::hint::black_box;

use chrono::{Duration, NaiveDate};
use criterion::{Criterion, criterion_group, criterion_main};

use collision_pipeline::modeling::build_star_schema;
use collision_pipeline::observability::NoopObserver;
use collision_pipeline::processing::{curate, quality_check};
use collision_pipeline::types::{DataSet, DataType, Field, Schema, Value};

const N: usize = 50_000;
const SEVERITIES: &[&str] = &["Slight", "Serious", "Fatal"];
const DAYS: &[&str] = &[
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

fn make_clean(n: usize) -> DataSet {
    let start = NaiveDate::from_ymd_opt(2023, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let schema = Schema::new(vec![
        Field::new("collision_id", DataType::Utf8),
        Field::new("longitude", DataType::Float32),
        Field::new("latitude", DataType::Float32),
        Field::new("day_of_week", DataType::Utf8),
        Field::new("collision_severity", DataType::Utf8),
        Field::new("collision_datetime", DataType::DateTime),
    ]);
    let rows = (0..n)
        .map(|i| {
            let at = start + Duration::minutes((i as i64 * 37) % (365 * 24 * 60));
            vec![
                Value::Utf8(format!("2023{i:09}")),
                Value::Float32(-3.0 + (i % 500) as f32 * 0.01),
                Value::Float32(51.0 + (i % 300) as f32 * 0.01),
                Value::Utf8(DAYS[i % DAYS.len()].to_string()),
                Value::Utf8(SEVERITIES[i % SEVERITIES.len()].to_string()),
                Value::DateTime(at),
            ]
        })
        .collect();
    DataSet::new(schema, rows)
}

fn bench_stages(c: &mut Criterion) {
    let clean = make_clean(N);
    let curated = curate(&clean, &NoopObserver).expect("curate");
    let filtered = quality_check(&curated, &NoopObserver).expect("quality");

    c.bench_function("stages/curate", |b| {
        b.iter(|| black_box(curate(black_box(&clean), &NoopObserver)))
    });
    c.bench_function("stages/quality_check", |b| {
        b.iter(|| black_box(quality_check(black_box(&curated), &NoopObserver)))
    });
    c.bench_function("stages/build_star_schema", |b| {
        b.iter(|| black_box(build_star_schema(black_box(&filtered), &NoopObserver)))
    });
}

criterion_group!(benches, bench_stages);
criterion_main!(benches);
