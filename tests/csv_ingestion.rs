use collision_pipeline::PipelineError;
use collision_pipeline::ingestion::csv::{ingest_csv_from_path, ingest_csv_from_reader};
use collision_pipeline::mapping::{Code, load_code_to_name_map};
use collision_pipeline::types::{DataType, Field, Schema, Value};

fn codes_schema() -> Schema {
    Schema::new(vec![
        Field::new("Code", DataType::Utf8),
        Field::new("Name", DataType::Utf8),
    ])
}

fn time_dim_schema() -> Schema {
    Schema::new(vec![
        Field::new("time_key", DataType::Int64),
        Field::new("hour", DataType::Int32),
        Field::new("minute", DataType::Int32),
    ])
}

#[test]
fn ingest_csv_from_path_happy_path() {
    let ds = ingest_csv_from_path("tests/fixtures/codes/uk-la-codes.csv", &codes_schema()).unwrap();

    assert_eq!(ds.row_count(), 3);
    assert_eq!(
        ds.rows[0],
        vec![
            Value::Utf8("E09000033".to_string()),
            Value::Utf8("Westminster".to_string()),
        ]
    );
}

#[test]
fn ingest_csv_allows_reordered_columns() {
    let input = "minute,time_key,hour\n15,815,8\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let ds = ingest_csv_from_reader(&mut rdr, &time_dim_schema()).unwrap();
    assert_eq!(ds.row_count(), 1);
    assert_eq!(
        ds.rows[0],
        vec![Value::Int64(815), Value::Int32(8), Value::Int32(15)]
    );
}

#[test]
fn ingest_csv_errors_on_missing_required_column() {
    let input = "time_key,hour\n815,8\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let err = ingest_csv_from_reader(&mut rdr, &time_dim_schema()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("schema mismatch"));
    assert!(msg.contains("missing required column 'minute'"));
}

#[test]
fn ingest_csv_errors_on_type_parse() {
    let input = "time_key,hour,minute\n815,eight,15\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let err = ingest_csv_from_reader(&mut rdr, &time_dim_schema()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("failed to parse value"));
    assert!(msg.contains("column 'hour'"));
}

#[test]
fn reference_codes_parse_numeric_and_alphanumeric_keys() {
    let police = load_code_to_name_map(
        "tests/fixtures/codes/uk-police-force-codes.csv",
        "Code",
        "Name",
    )
    .unwrap();
    assert_eq!(police.len(), 4);
    assert_eq!(police[&Code::Int(13)], "West Yorkshire");

    let lsoa = load_code_to_name_map("tests/fixtures/codes/uk-lsoa-codes.csv", "Code", "Name").unwrap();
    assert_eq!(lsoa[&Code::Text("E01005131".to_string())], "Manchester 054C");
}

#[test]
fn reference_codes_require_named_columns() {
    let err = load_code_to_name_map("tests/fixtures/codes/uk-lad-codes.csv", "Code", "Label").unwrap_err();
    assert!(matches!(err, PipelineError::ReferenceData { .. }));
    assert!(err.to_string().contains("missing column 'Label'"));
}
