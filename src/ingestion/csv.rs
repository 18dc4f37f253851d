//! CSV reading and writing for [`DataSet`]s.

use std::io;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, DataType, Schema, Value};

/// Accepted timestamp layouts, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M",
];

/// Ingest a CSV file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - CSV must have headers.
/// - Headers must contain all schema fields (order can differ).
/// - Each value is parsed according to the schema field type.
pub fn ingest_csv_from_path(path: impl AsRef<Path>, schema: &Schema) -> PipelineResult<DataSet> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: io::Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
) -> PipelineResult<DataSet> {
    let headers = rdr.headers()?.clone();

    // Map schema fields -> CSV column indexes (allows re-ordered CSV columns).
    let mut col_idxs = Vec::with_capacity(schema.fields.len());
    for field in &schema.fields {
        match headers.iter().position(|h| h.trim() == field.name) {
            Some(idx) => col_idxs.push(idx),
            None => {
                return Err(PipelineError::SchemaMismatch {
                    message: format!(
                        "missing required column '{field}'. headers={:?}",
                        headers.iter().collect::<Vec<_>>(),
                        field = field.name
                    ),
                });
            }
        }
    }

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // Report 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;

        let mut row: Vec<Value> = Vec::with_capacity(schema.fields.len());
        for (field, &csv_idx) in schema.fields.iter().zip(col_idxs.iter()) {
            let raw = record.get(csv_idx).unwrap_or("");
            row.push(parse_typed_value(user_row, &field.name, field.data_type, raw)?);
        }
        rows.push(row);
    }

    Ok(DataSet::new(schema.clone(), rows))
}

/// Write a dataset as CSV (header row + one record per row; nulls are empty cells).
pub fn write_csv_to_path(path: impl AsRef<Path>, dataset: &DataSet) -> PipelineResult<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    write_csv_to_writer(&mut wtr, dataset)?;
    wtr.flush()?;
    Ok(())
}

/// Write a dataset into an existing CSV writer.
pub fn write_csv_to_writer<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    dataset: &DataSet,
) -> PipelineResult<()> {
    wtr.write_record(dataset.schema.field_names())?;
    for row in &dataset.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    Ok(())
}

/// Parse one raw cell according to `data_type`. Empty cells are [`Value::Null`].
pub fn parse_typed_value(
    row: usize,
    column: &str,
    data_type: DataType,
    raw: &str,
) -> PipelineResult<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    let parse_error = |message: String| PipelineError::ParseError {
        row,
        column: column.to_owned(),
        raw: raw.to_owned(),
        message,
    };

    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(trimmed.to_owned())),
        DataType::Int64 => trimmed
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| parse_error(e.to_string())),
        DataType::Int32 => trimmed
            .parse::<i32>()
            .map(Value::Int32)
            .map_err(|e| parse_error(e.to_string())),
        DataType::Float64 => trimmed
            .parse::<f64>()
            .map(Value::Float64)
            .map_err(|e| parse_error(e.to_string())),
        DataType::Float32 => trimmed
            .parse::<f32>()
            .map(Value::Float32)
            .map_err(|e| parse_error(e.to_string())),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool).map_err(parse_error),
        DataType::DateTime => parse_datetime(trimmed).map(Value::DateTime).map_err(parse_error),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err("expected bool (true/false/1/0/yes/no)".to_string()),
    }
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, String> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| format!("expected datetime (one of {DATETIME_FORMATS:?})"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{ingest_csv_from_reader, write_csv_to_writer};
    use crate::types::{DataType, Field, Schema, Value};

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int32),
            Field::new("lat", DataType::Float32),
            Field::new("at", DataType::DateTime),
            Field::new("weekend", DataType::Bool),
        ])
    }

    #[test]
    fn parses_narrow_types_and_datetimes() {
        let input = "id,lat,at,weekend\n7,51.5,2023-05-01T08:15,false\n8,,2023-05-02 10:00:00,true\n";
        let mut rdr = csv::ReaderBuilder::new().from_reader(input.as_bytes());

        let ds = ingest_csv_from_reader(&mut rdr, &schema()).unwrap();
        let at = NaiveDate::from_ymd_opt(2023, 5, 1)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap();
        assert_eq!(
            ds.rows[0],
            vec![
                Value::Int32(7),
                Value::Float32(51.5),
                Value::DateTime(at),
                Value::Bool(false)
            ]
        );
        assert_eq!(ds.rows[1][1], Value::Null);
    }

    #[test]
    fn bad_datetime_reports_row_and_column() {
        let input = "id,lat,at,weekend\n7,51.5,yesterday,false\n";
        let mut rdr = csv::ReaderBuilder::new().from_reader(input.as_bytes());

        let msg = ingest_csv_from_reader(&mut rdr, &schema())
            .unwrap_err()
            .to_string();
        assert!(msg.contains("row 2"));
        assert!(msg.contains("column 'at'"));
    }

    #[test]
    fn written_csv_reads_back_identically() {
        let input = "id,lat,at,weekend\n7,51.5,2023-05-01 08:15:00,false\n8,,2023-05-02 10:00:00,true\n";
        let mut rdr = csv::ReaderBuilder::new().from_reader(input.as_bytes());
        let ds = ingest_csv_from_reader(&mut rdr, &schema()).unwrap();

        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_csv_to_writer(&mut wtr, &ds).unwrap();
        let bytes = wtr.into_inner().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), input);
    }
}
