//! Location dimension: coordinates bucketed onto a ~1 km grid.

use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::keys::{LocationIndex, bucket_value};

/// Schema of `collisions_dim_location`.
pub fn dim_location_schema() -> Schema {
    Schema::new(vec![
        Field::new("location_key", DataType::Int64),
        Field::new("lon_bucket", DataType::Float64),
        Field::new("lat_bucket", DataType::Float64),
    ])
}

/// One row per bucket of `index`, keyed densely in `(lon_bucket, lat_bucket)` order.
///
/// Rows without coordinates add a single all-null row.
pub fn build_dim_location(index: &LocationIndex) -> DataSet {
    let mut rows: Vec<Vec<Value>> = index
        .iter()
        .map(|((lon, lat), key)| {
            vec![
                Value::Int64(key),
                Value::Float64(bucket_value(lon)),
                Value::Float64(bucket_value(lat)),
            ]
        })
        .collect();
    if index.has_missing() {
        rows.push(vec![Value::Null; 3]);
    }
    DataSet::new(dim_location_schema(), rows)
}
