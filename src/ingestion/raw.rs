//! The raw collisions extract: schema and source-file reader.
//!
//! The published extract carries separate `date` (`dd/mm/YYYY`) and `time` (`HH:MM`)
//! columns. They are combined into `collision_datetime` and dropped.

use std::io;
use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::csv::parse_typed_value;

const DATE_FORMAT: &str = "%d/%m/%Y";
const TIME_FORMAT: &str = "%H:%M";

const RAW_COLUMNS: &[(&str, DataType)] = &[
    ("collision_index", DataType::Utf8),
    ("collision_year", DataType::Int64),
    ("collision_ref_no", DataType::Utf8),
    ("location_easting_osgr", DataType::Float64),
    ("location_northing_osgr", DataType::Float64),
    ("longitude", DataType::Float64),
    ("latitude", DataType::Float64),
    ("police_force", DataType::Int64),
    ("collision_severity", DataType::Int64),
    ("number_of_vehicles", DataType::Int64),
    ("number_of_casualties", DataType::Int64),
    ("day_of_week", DataType::Int64),
    ("local_authority_district", DataType::Int64),
    ("local_authority_ons_district", DataType::Utf8),
    ("local_authority_highway", DataType::Utf8),
    ("local_authority_highway_current", DataType::Utf8),
    ("first_road_class", DataType::Int64),
    ("first_road_number", DataType::Int64),
    ("road_type", DataType::Int64),
    ("speed_limit", DataType::Int64),
    ("junction_detail_historic", DataType::Int64),
    ("junction_detail", DataType::Int64),
    ("junction_control", DataType::Int64),
    ("second_road_class", DataType::Int64),
    ("second_road_number", DataType::Int64),
    ("pedestrian_crossing_human_control_historic", DataType::Int64),
    ("pedestrian_crossing_physical_facilities_historic", DataType::Int64),
    ("pedestrian_crossing", DataType::Int64),
    ("light_conditions", DataType::Int64),
    ("weather_conditions", DataType::Int64),
    ("road_surface_conditions", DataType::Int64),
    ("special_conditions_at_site", DataType::Int64),
    ("carriageway_hazards_historic", DataType::Int64),
    ("carriageway_hazards", DataType::Int64),
    ("urban_or_rural_area", DataType::Int64),
    ("did_police_officer_attend_scene_of_accident", DataType::Int64),
    ("trunk_road_flag", DataType::Int64),
    ("lsoa_of_accident_location", DataType::Utf8),
    ("enhanced_severity_collision", DataType::Int64),
    ("collision_injury_based", DataType::Int64),
    ("collision_adjusted_severity_serious", DataType::Float64),
    ("collision_adjusted_severity_slight", DataType::Float64),
    ("collision_datetime", DataType::DateTime),
];

/// Schema of the `collisions_raw` table.
pub fn raw_collisions_schema() -> Schema {
    Schema::new(
        RAW_COLUMNS
            .iter()
            .map(|(name, data_type)| Field::new(*name, *data_type))
            .collect(),
    )
}

/// Read the published source CSV into the raw schema.
pub fn ingest_raw_csv(path: impl AsRef<Path>) -> PipelineResult<DataSet> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let ds = ingest_raw_from_reader(&mut rdr)?;
    info!(rows = ds.row_count(), path = %path.display(), "read raw collisions extract");
    Ok(ds)
}

/// Read source CSV records (with `date`/`time` columns) into the raw schema.
pub fn ingest_raw_from_reader<R: io::Read>(rdr: &mut csv::Reader<R>) -> PipelineResult<DataSet> {
    let schema = raw_collisions_schema();
    let headers = rdr.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| PipelineError::SchemaMismatch {
                message: format!(
                    "missing required column '{name}'. headers={:?}",
                    headers.iter().collect::<Vec<_>>()
                ),
            })
    };

    let date_idx = find("date")?;
    let time_idx = find("time")?;
    let col_idxs = schema
        .fields
        .iter()
        .filter(|f| f.name != "collision_datetime")
        .map(|f| find(&f.name))
        .collect::<PipelineResult<Vec<_>>>()?;

    let mut rows = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        let user_row = row_idx0 + 2;
        let record = result?;

        let mut row = Vec::with_capacity(schema.len());
        for (field, &idx) in schema.fields.iter().zip(col_idxs.iter()) {
            let raw = record.get(idx).unwrap_or("");
            row.push(parse_typed_value(user_row, &field.name, field.data_type, raw)?);
        }
        row.push(combine_date_time(
            user_row,
            record.get(date_idx).unwrap_or(""),
            record.get(time_idx).unwrap_or(""),
        )?);
        rows.push(row);
    }

    Ok(DataSet::new(schema, rows))
}

fn combine_date_time(row: usize, date: &str, time: &str) -> PipelineResult<Value> {
    let (date, time) = (date.trim(), time.trim());
    if date.is_empty() || time.is_empty() {
        return Ok(Value::Null);
    }
    let err = |column: &str, raw: &str, e: chrono::ParseError| PipelineError::ParseError {
        row,
        column: column.to_string(),
        raw: raw.to_string(),
        message: e.to_string(),
    };
    let d = NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|e| err("date", date, e))?;
    let t = NaiveTime::parse_from_str(time, TIME_FORMAT).map_err(|e| err("time", time, e))?;
    Ok(Value::DateTime(d.and_time(t)))
}
