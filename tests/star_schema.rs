use std::sync::Mutex;

use collision_pipeline::ingestion::ingest_raw_csv;
use collision_pipeline::mapping::CodeMappings;
use collision_pipeline::modeling::build_star_schema;
use collision_pipeline::observability::{NoopObserver, PipelineObserver, Stage, StageMetric};
use collision_pipeline::processing::{clean, curate, quality_check};
use collision_pipeline::types::{DataSet, Value};

const RAW: &str = "tests/fixtures/dft-road-casualty-statistics-collision-2023.csv";
const CODES: &str = "tests/fixtures/codes";

#[derive(Default)]
struct Metrics(Mutex<Vec<StageMetric>>);

impl PipelineObserver for Metrics {
    fn on_metric(&self, metric: &StageMetric) {
        self.0.lock().unwrap().push(metric.clone());
    }
}

fn curated() -> DataSet {
    let raw = ingest_raw_csv(RAW).unwrap();
    let mappings = CodeMappings::load_standard(CODES).unwrap();
    let cleaned = clean(&raw, &mappings, &NoopObserver).unwrap();
    curate(&cleaned, &NoopObserver).unwrap()
}

fn column(ds: &DataSet, name: &str) -> Vec<Value> {
    ds.column_values(name).unwrap().into_iter().cloned().collect()
}

#[test]
fn quality_rules_drop_duplicate_and_out_of_window_rows() {
    let metrics = Metrics::default();
    let filtered = quality_check(&curated(), &metrics).unwrap();

    assert_eq!(filtered.row_count(), 4);
    let removed: Vec<(String, usize)> = metrics
        .0
        .lock()
        .unwrap()
        .iter()
        .map(|m| (m.step.clone(), m.rows_removed()))
        .collect();
    assert_eq!(removed.len(), 5);
    assert_eq!(removed.iter().map(|(_, n)| n).sum::<usize>(), 2);
    assert!(metrics.0.lock().unwrap().iter().all(|m| m.stage == Stage::Quality));

    // Keep-last: the 17:30 record of the duplicated id survives.
    let times = column(&filtered, "collision_time");
    assert_eq!(times.last(), Some(&Value::Utf8("17:30".into())));
}

#[test]
fn star_schema_from_fixture() {
    let input = quality_check(&curated(), &NoopObserver).unwrap();
    let metrics = Metrics::default();
    let star = build_star_schema(&input, &metrics).unwrap();

    assert_eq!(
        column(&star.dim_date, "date_key"),
        vec![Value::Int64(20230101), Value::Int64(20230204), Value::Int64(20230315)]
    );
    assert_eq!(
        column(&star.dim_date, "is_weekend"),
        vec![Value::Bool(true), Value::Bool(true), Value::Bool(false)]
    );
    assert_eq!(
        column(&star.dim_time, "time_key"),
        vec![Value::Int64(1), Value::Int64(815), Value::Int64(1730), Value::Int64(2359)]
    );
    assert_eq!(
        column(&star.dim_severity, "severity_description"),
        vec![
            Value::Utf8("Slight".into()),
            Value::Utf8("Serious".into()),
            Value::Utf8("Fatal".into()),
        ]
    );
    assert_eq!(
        column(&star.dim_location, "lon_bucket"),
        vec![Value::Float64(-2.24), Value::Float64(-1.55), Value::Float64(-0.13)]
    );

    assert_eq!(star.fact.row_count(), 4);
    assert_eq!(
        column(&star.fact, "collision_key"),
        (1..=4).map(Value::Int64).collect::<Vec<_>>()
    );
    assert_eq!(
        column(&star.fact, "location_key"),
        vec![Value::Int64(3), Value::Int64(1), Value::Int64(3), Value::Int64(2)]
    );
    assert_eq!(
        column(&star.fact, "severity_key"),
        vec![Value::Int64(1), Value::Int64(2), Value::Int64(3), Value::Int64(1)]
    );
    assert!(column(&star.fact, "collision_count").iter().all(|v| *v == Value::Int32(1)));

    let steps: Vec<String> = metrics.0.lock().unwrap().iter().map(|m| m.step.clone()).collect();
    assert_eq!(
        steps,
        vec![
            "build_dim_date",
            "build_dim_time",
            "build_dim_severity",
            "build_dim_location",
            "build_fact",
        ]
    );
}

#[test]
fn modeling_is_deterministic() {
    let input = quality_check(&curated(), &NoopObserver).unwrap();
    let first = build_star_schema(&input, &NoopObserver).unwrap();
    let second = build_star_schema(&input, &NoopObserver).unwrap();
    assert_eq!(first, second);
}
