use chrono::NaiveDate;
use collision_pipeline::PipelineError;
use collision_pipeline::store::{CsvStore, TableStore, WriteMode};
use collision_pipeline::types::{DataSet, DataType, Field, Schema, Value};

fn sample() -> DataSet {
    DataSet::new(
        Schema::new(vec![
            Field::new("id", DataType::Int32),
            Field::new("name", DataType::Utf8),
            Field::new("lat", DataType::Float32),
            Field::new("weekend", DataType::Bool),
            Field::new("at", DataType::DateTime),
        ]),
        vec![
            vec![
                Value::Int32(1),
                Value::Utf8("Leeds, West Yorkshire".into()),
                Value::Float32(53.8008),
                Value::Bool(true),
                Value::DateTime(
                    NaiveDate::from_ymd_opt(2023, 1, 1)
                        .unwrap()
                        .and_hms_opt(17, 30, 0)
                        .unwrap(),
                ),
            ],
            vec![Value::Int32(2), Value::Null, Value::Null, Value::Bool(false), Value::Null],
        ],
    )
}

#[test]
fn replace_round_trips_types_and_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvStore::open(dir.path().join("tables")).unwrap();

    assert!(!store.has_table("sample").unwrap());
    store.write_table("sample", &sample(), WriteMode::Replace).unwrap();
    assert!(store.has_table("sample").unwrap());
    assert!(dir.path().join("tables/sample.schema.json").is_file());
    assert_eq!(store.read_table("sample").unwrap(), sample());
}

#[test]
fn append_adds_rows_without_header() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvStore::open(dir.path()).unwrap();

    store.write_table("sample", &sample(), WriteMode::Append).unwrap();
    store.write_table("sample", &sample(), WriteMode::Append).unwrap();

    let ds = store.read_table("sample").unwrap();
    assert_eq!(ds.row_count(), 4);
    assert_eq!(ds.rows[2], sample().rows[0]);
}

#[test]
fn append_rejects_different_schema() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvStore::open(dir.path()).unwrap();
    store.write_table("sample", &sample(), WriteMode::Replace).unwrap();

    let other = sample().select(&["id", "name"]).unwrap();
    let err = store.write_table("sample", &other, WriteMode::Append).unwrap_err();
    assert!(matches!(err, PipelineError::SchemaMismatch { .. }));
}

#[test]
fn reading_unknown_table_fails() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvStore::open(dir.path()).unwrap();
    assert!(matches!(
        store.read_table("collisions_fact").unwrap_err(),
        PipelineError::TableNotFound { .. }
    ));
}
