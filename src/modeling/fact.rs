//! Collision fact table and its referential-integrity check.

use std::collections::{BTreeSet, HashSet};

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::processing::ID_COLUMN;
use crate::types::{DataSet, DataType, Field, Schema, Value, ValueKey};

use super::keys::{LocationIndex, date_key, hour_minute, location_bucket, severity_key, time_key};

/// Foreign-key columns of the fact table, each named after its dimension's key.
pub const FACT_KEYS: &[&str] = &["date_key", "time_key", "severity_key", "location_key"];

/// Schema of `collisions_fact`; `collision_id` keeps its curated type.
pub fn fact_schema(id_type: DataType) -> Schema {
    Schema::new(vec![
        Field::new("collision_key", DataType::Int64),
        Field::new(ID_COLUMN, id_type),
        Field::new("date_key", DataType::Int64),
        Field::new("time_key", DataType::Int64),
        Field::new("severity_key", DataType::Int64),
        Field::new("location_key", DataType::Int64),
        Field::new("collision_count", DataType::Int32),
    ])
}

/// One fact row per curated row, keys re-derived from the row itself.
///
/// `collision_key` is the 1-based row position; `collision_count` is always 1.
/// Null inputs leave the corresponding key null for validation to report.
pub fn build_fact(curated: &DataSet, locations: &LocationIndex) -> PipelineResult<DataSet> {
    let id_idx = curated.column_index(ID_COLUMN)?;
    let dt_idx = curated.column_index("collision_datetime")?;
    let severity_idx = curated.column_index("collision_severity")?;
    let lon_idx = curated.column_index("longitude")?;
    let lat_idx = curated.column_index("latitude")?;

    let mut unknown = BTreeSet::new();
    let mut rows = Vec::with_capacity(curated.row_count());
    for (position, row) in curated.rows.iter().enumerate() {
        let dt = row[dt_idx].as_datetime();
        let date = dt.map_or(Value::Null, |dt| Value::Int64(date_key(dt.date())));
        let time = dt.map_or(Value::Null, |dt| {
            let (hour, minute) = hour_minute(dt);
            Value::Int64(time_key(hour, minute))
        });

        let severity = match row[severity_idx].as_str() {
            Some(label) => match severity_key(label) {
                Some(key) => Value::Int64(key),
                None => {
                    unknown.insert(label.to_string());
                    Value::Null
                }
            },
            None => Value::Null,
        };

        let location = location_bucket(&row[lon_idx], &row[lat_idx])
            .and_then(|b| locations.key(b))
            .map_or(Value::Null, Value::Int64);

        rows.push(vec![
            Value::Int64(position as i64 + 1),
            row[id_idx].clone(),
            date,
            time,
            severity,
            location,
            Value::Int32(1),
        ]);
    }

    if !unknown.is_empty() {
        return Err(PipelineError::UnknownSeverity { values: unknown });
    }
    let id_type = curated.schema.fields[id_idx].data_type;
    Ok(DataSet::new(fact_schema(id_type), rows))
}

/// Inner-join every fact row against each `(dimension name, dimension)` on the shared key
/// column (the dimension's first column).
///
/// Returns the number of fact rows that survive every join, which equals the fact row
/// count; any fact row without a matching dimension row is an error.
pub fn check_referential_integrity(
    fact: &DataSet,
    dimensions: &[(&str, &DataSet)],
) -> PipelineResult<usize> {
    let mut matched = vec![true; fact.row_count()];

    for (name, dimension) in dimensions {
        let Some(key_field) = dimension.schema.fields.first() else {
            return Err(PipelineError::SchemaMismatch {
                message: format!("dimension '{name}' has no columns"),
            });
        };
        let key = key_field.name.as_str();
        let fact_idx = fact.column_index(key)?;
        let dim_idx = dimension.column_index(key)?;

        let keys: HashSet<ValueKey> = dimension
            .rows
            .iter()
            .filter(|row| !row[dim_idx].is_null())
            .map(|row| row[dim_idx].key())
            .collect();

        let mut missing = 0;
        for (row, ok) in fact.rows.iter().zip(matched.iter_mut()) {
            let value = &row[fact_idx];
            if value.is_null() || !keys.contains(&value.key()) {
                *ok = false;
                missing += 1;
            }
        }
        if missing > 0 {
            return Err(PipelineError::ReferentialIntegrity {
                dimension: name.to_string(),
                key: key.to_string(),
                missing,
            });
        }
    }

    let preserved = matched.iter().filter(|ok| **ok).count();
    debug!(rows = preserved, "fact keys resolved against all dimensions");
    Ok(preserved)
}
