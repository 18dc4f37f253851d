//! Severity dimension.

use std::collections::BTreeSet;

use crate::error::{PipelineError, PipelineResult};
use crate::processing::severity_group;
use crate::types::{DataSet, DataType, Field, Schema, Value};

use super::keys::severity_key;

/// Schema of `collisions_dim_severity`.
pub fn dim_severity_schema() -> Schema {
    Schema::new(vec![
        Field::new("severity_key", DataType::Int64),
        Field::new("severity_description", DataType::Utf8),
        Field::new("severity_group", DataType::Utf8),
    ])
}

/// One row per distinct `collision_severity` label, in first-seen order.
///
/// Keys come from the static severity map; a label outside it is fatal.
pub fn build_dim_severity(curated: &DataSet) -> PipelineResult<DataSet> {
    let idx = curated.column_index("collision_severity")?;

    let mut seen = BTreeSet::new();
    let mut unknown = BTreeSet::new();
    let mut rows = Vec::new();
    for value in curated.rows.iter().map(|row| &row[idx]) {
        if !seen.insert(value.key()) {
            continue;
        }
        let Some(label) = value.as_str() else {
            rows.push(vec![Value::Null; 3]);
            continue;
        };
        match (severity_key(label), severity_group(label)) {
            (Some(key), Some(group)) => rows.push(vec![
                Value::Int64(key),
                Value::Utf8(label.to_string()),
                Value::Utf8(group.to_string()),
            ]),
            _ => {
                unknown.insert(label.to_string());
            }
        }
    }

    if !unknown.is_empty() {
        return Err(PipelineError::UnknownSeverity { values: unknown });
    }
    Ok(DataSet::new(dim_severity_schema(), rows))
}
