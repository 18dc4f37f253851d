use chrono::NaiveDate;
use collision_pipeline::ingestion::{
    MetadataCheck, create_ingestion_metadata, ingest_raw_csv, raw_collisions_schema, validate_metadata,
};
use collision_pipeline::types::{DataType, Value};

const RAW: &str = "tests/fixtures/dft-road-casualty-statistics-collision-2023.csv";

#[test]
fn ingest_raw_fixture_combines_date_and_time() {
    let ds = ingest_raw_csv(RAW).unwrap();

    assert_eq!(ds.shape(), (6, raw_collisions_schema().len()));
    assert!(ds.schema.index_of("date").is_none());
    assert!(ds.schema.index_of("time").is_none());

    let dt_idx = ds.column_index("collision_datetime").unwrap();
    assert_eq!(ds.schema.fields[dt_idx].data_type, DataType::DateTime);
    assert_eq!(
        ds.rows[1][dt_idx],
        Value::DateTime(
            NaiveDate::from_ymd_opt(2023, 2, 4)
                .unwrap()
                .and_hms_opt(23, 59, 0)
                .unwrap()
        )
    );

    let id_idx = ds.column_index("collision_index").unwrap();
    assert_eq!(ds.rows[0][id_idx], Value::Utf8("2023010419171".to_string()));
    let slight_idx = ds.column_index("collision_adjusted_severity_slight").unwrap();
    assert_eq!(ds.rows[2][slight_idx], Value::Null);
}

#[test]
fn ingest_raw_errors_when_time_column_missing() {
    let input = "collision_index,date\n1,01/01/2023\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());

    let err = collision_pipeline::ingestion::raw::ingest_raw_from_reader(&mut rdr).unwrap_err();
    assert!(err.to_string().contains("missing required column 'time'"));
}

#[test]
fn same_file_twice_is_accepted_but_unchanged() {
    let first = create_ingestion_metadata(RAW).unwrap();
    let mut second = create_ingestion_metadata(RAW).unwrap();
    second.ingested_at = first.ingested_at + chrono::Duration::seconds(1);

    match validate_metadata(second, Some(&first)) {
        MetadataCheck::Accepted { changed, metadata } => {
            assert!(!changed);
            assert_eq!(metadata.file_hash, first.file_hash);
            assert_eq!(metadata.dataset_name, "dft-road-casualty-statistics-collision-2023.csv");
        }
        other => panic!("unexpected check: {other:?}"),
    }
}
