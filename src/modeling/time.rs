//! Time dimension: one row per distinct `(hour, minute)`.

use std::collections::BTreeSet;

use crate::error::PipelineResult;
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::keys::{hour_minute, time_key};

/// Schema of `collisions_dim_time`.
pub fn dim_time_schema() -> Schema {
    Schema::new(vec![
        Field::new("time_key", DataType::Int64),
        Field::new("hour", DataType::Int32),
        Field::new("minute", DataType::Int32),
    ])
}

/// Distinct `(hour, minute)` pairs of `collision_datetime`, ascending.
pub fn build_dim_time(curated: &DataSet) -> PipelineResult<DataSet> {
    let dt_idx = curated.column_index("collision_datetime")?;

    let mut times = BTreeSet::new();
    let mut has_null = false;
    for row in &curated.rows {
        match row[dt_idx].as_datetime() {
            Some(dt) => {
                times.insert(hour_minute(dt));
            }
            None => has_null = true,
        }
    }

    let mut rows: Vec<Vec<Value>> = times
        .into_iter()
        .map(|(hour, minute)| {
            vec![
                Value::Int64(time_key(hour, minute)),
                Value::Int32(hour as i32),
                Value::Int32(minute as i32),
            ]
        })
        .collect();
    if has_null {
        rows.push(vec![Value::Null; 3]);
    }

    Ok(DataSet::new(dim_time_schema(), rows))
}
