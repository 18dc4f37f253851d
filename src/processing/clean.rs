//! Raw → clean transformation.
//!
//! Steps, in order: rename columns, replace categorical codes with labels, normalize the
//! integer-coded road number / speed limit columns, strip string whitespace, narrow
//! numeric storage types. Every step reports an IN/OUT shape metric.

use std::collections::{BTreeSet, HashMap};

use tracing::{info, info_span, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::mapping::{Code, CodeMappings};
use crate::observability::{PipelineObserver, Stage, StageMetric};
use crate::types::{DataSet, DataType, Value};

/// Identifier column name in the source extract.
pub const SOURCE_ID_COLUMN: &str = "collision_index";
/// Identifier column name from the clean layer onwards.
pub const ID_COLUMN: &str = "collision_id";

/// Integer-coded columns kept as text, with their sentinel labels.
const SPECIAL_CODES: &[(&str, &[(i64, &str)])] = &[
    ("first_road_number", &[(-1, "Unknown"), (0, "Unclassified")]),
    ("speed_limit", &[(-1, "Unknown"), (99, "Unknown")]),
    ("second_road_number", &[(-1, "Unknown"), (0, "Unclassified")]),
];

/// Clean the raw collisions dataset.
///
/// The input is left untouched; the returned dataset has lower-case column names,
/// labels instead of codes, trimmed strings and 32-bit numeric columns.
pub fn clean(
    raw: &DataSet,
    mappings: &CodeMappings,
    observer: &dyn PipelineObserver,
) -> PipelineResult<DataSet> {
    let span = info_span!("clean", rows = raw.row_count());
    let _enter = span.enter();
    info!("start cleaning dataset");

    let renamed = rename_columns(raw)?;
    report(observer, "rename_columns", raw, &renamed, String::new());

    let mapped = normalize_codes(&renamed, mappings)?;
    report(observer, "normalize_codes", &renamed, &mapped, String::new());

    let special = normalize_special_codes(&mapped)?;
    report(observer, "normalize_special_codes", &mapped, &special, String::new());

    let stripped = strip_whitespace(&special);
    report(observer, "strip_whitespace", &special, &stripped, String::new());

    let (cast, narrowed) = cast_columns(&stripped)?;
    report(
        observer,
        "cast_columns",
        &stripped,
        &cast,
        format!("narrowed columns {narrowed:?}"),
    );

    info!(rows = cast.row_count(), "successfully cleaned dataset");
    Ok(cast)
}

fn report(observer: &dyn PipelineObserver, step: &str, before: &DataSet, after: &DataSet, message: String) {
    observer.on_metric(&StageMetric::new(
        Stage::Clean,
        step,
        before.shape(),
        after.shape(),
        message,
    ));
}

/// Trim and lower-case column names; rename the source identifier to [`ID_COLUMN`].
pub fn rename_columns(ds: &DataSet) -> PipelineResult<DataSet> {
    let mut schema = ds.schema.clone();
    for field in &mut schema.fields {
        let name = field.name.trim().to_lowercase();
        field.name = if name == SOURCE_ID_COLUMN {
            ID_COLUMN.to_string()
        } else {
            name
        };
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in schema.field_names() {
        *counts.entry(name).or_default() += 1;
    }
    let mut duplicates: Vec<String> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| name.to_string())
        .collect();
    if !duplicates.is_empty() {
        duplicates.sort();
        return Err(PipelineError::DuplicateColumns {
            columns: duplicates,
        });
    }

    Ok(DataSet::new(schema, ds.rows.clone()))
}

/// Replace codes with labels for every column that has a mapping table.
///
/// Nulls stay null. Any other value without a mapping fails with the full set of
/// unmapped values for that column. Mapped columns absent from the dataset are skipped.
pub fn normalize_codes(ds: &DataSet, mappings: &CodeMappings) -> PipelineResult<DataSet> {
    let mut out = ds.clone();
    for column in mappings.columns() {
        let Some(idx) = out.schema.index_of(column) else {
            warn!(column, "mapped column not present in dataset, skipping");
            continue;
        };

        let mut unmapped = BTreeSet::new();
        for row in &mut out.rows {
            if row[idx].is_null() {
                continue;
            }
            let label = Code::from_value(&row[idx]).and_then(|code| mappings.label(column, &code));
            match label {
                Some(label) => row[idx] = Value::Utf8(label.to_string()),
                None => {
                    unmapped.insert(row[idx].to_string());
                }
            }
        }

        if !unmapped.is_empty() {
            return Err(PipelineError::UnmappedCodes {
                column: column.to_string(),
                values: unmapped,
            });
        }
        out.schema.fields[idx].data_type = DataType::Utf8;
    }
    Ok(out)
}

/// Turn road numbers and speed limits into text, overlaying their sentinel labels.
///
/// Values that cannot be read as integers (and nulls) fail the step.
pub fn normalize_special_codes(ds: &DataSet) -> PipelineResult<DataSet> {
    let mut out = ds.clone();
    for (column, sentinels) in SPECIAL_CODES {
        let Some(idx) = out.schema.index_of(column) else {
            warn!(column, "special-coded column not present in dataset, skipping");
            continue;
        };

        let mut nulls = 0usize;
        for row in &mut out.rows {
            row[idx] = match integer_code(&row[idx]) {
                Some(code) => {
                    let label = sentinels
                        .iter()
                        .find(|(sentinel, _)| *sentinel == code)
                        .map(|(_, label)| (*label).to_string())
                        .unwrap_or_else(|| code.to_string());
                    Value::Utf8(label)
                }
                None => {
                    nulls += 1;
                    Value::Null
                }
            };
        }

        if nulls > 0 {
            return Err(PipelineError::NullIntroduced {
                column: (*column).to_string(),
                count: nulls,
            });
        }
        out.schema.fields[idx].data_type = DataType::Utf8;
    }
    Ok(out)
}

fn integer_code(value: &Value) -> Option<i64> {
    match value {
        Value::Int64(_) | Value::Int32(_) => value.as_i64(),
        Value::Float64(_) | Value::Float32(_) => value
            .as_f64()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64),
        Value::Utf8(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Trim surrounding whitespace from every string value.
pub fn strip_whitespace(ds: &DataSet) -> DataSet {
    ds.map_rows(|row| {
        row.iter()
            .map(|v| match v {
                Value::Utf8(s) => Value::Utf8(s.trim().to_string()),
                other => other.clone(),
            })
            .collect()
    })
}

/// Narrow 64-bit integers to `Int32` and 64-bit floats to `Float32`.
///
/// This is a storage-size reduction; an integer outside the 32-bit range fails with
/// [`PipelineError::Narrowing`] and a finite float that overflows `f32` with
/// [`PipelineError::FloatNarrowing`]. Precision loss is accepted. NaN and infinities pass
/// through unchanged. Returns the dataset and the names of narrowed columns.
pub fn cast_columns(ds: &DataSet) -> PipelineResult<(DataSet, Vec<String>)> {
    let mut out = ds.clone();
    let mut narrowed = Vec::new();

    for idx in 0..out.schema.len() {
        let field = &mut out.schema.fields[idx];
        match field.data_type {
            DataType::Int64 => {
                for row in &mut out.rows {
                    if let Value::Int64(v) = row[idx] {
                        let narrow = i32::try_from(v).map_err(|_| PipelineError::Narrowing {
                            column: field.name.clone(),
                            value: v,
                        })?;
                        row[idx] = Value::Int32(narrow);
                    }
                }
                field.data_type = DataType::Int32;
                narrowed.push(field.name.clone());
            }
            DataType::Float64 => {
                for row in &mut out.rows {
                    if let Value::Float64(v) = row[idx] {
                        let narrow = v as f32;
                        if v.is_finite() && !narrow.is_finite() {
                            return Err(PipelineError::FloatNarrowing {
                                column: field.name.clone(),
                                value: v,
                            });
                        }
                        row[idx] = Value::Float32(narrow);
                    }
                }
                field.data_type = DataType::Float32;
                narrowed.push(field.name.clone());
            }
            _ => {}
        }
    }
    Ok((out, narrowed))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{cast_columns, normalize_codes, normalize_special_codes, rename_columns};
    use crate::error::PipelineError;
    use crate::mapping::{Code, CodeMappings};
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn single_column(name: &str, data_type: DataType, values: Vec<Value>) -> DataSet {
        DataSet::new(
            Schema::new(vec![Field::new(name, data_type)]),
            values.into_iter().map(|v| vec![v]).collect(),
        )
    }

    #[test]
    fn rename_trims_lowercases_and_renames_identifier() {
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new(" Collision_Index ", DataType::Utf8),
                Field::new("Speed_Limit", DataType::Int64),
            ]),
            vec![],
        );
        let out = rename_columns(&ds).unwrap();
        assert_eq!(
            out.schema.field_names().collect::<Vec<_>>(),
            vec!["collision_id", "speed_limit"]
        );
    }

    #[test]
    fn rename_rejects_colliding_names() {
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new("Latitude", DataType::Float64),
                Field::new("latitude ", DataType::Float64),
            ]),
            vec![],
        );
        let err = rename_columns(&ds).unwrap_err();
        match err {
            PipelineError::DuplicateColumns { columns } => assert_eq!(columns, vec!["latitude"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn codes_map_to_labels_and_nulls_stay_null() {
        let ds = single_column(
            "collision_severity",
            DataType::Int64,
            vec![Value::Int64(1), Value::Null, Value::Int64(3)],
        );
        let out = normalize_codes(&ds, &CodeMappings::builtin()).unwrap();
        assert_eq!(out.schema.fields[0].data_type, DataType::Utf8);
        assert_eq!(
            out.rows,
            vec![
                vec![Value::Utf8("Fatal".into())],
                vec![Value::Null],
                vec![Value::Utf8("Slight".into())],
            ]
        );
    }

    #[test]
    fn unmapped_codes_are_collected_as_a_set() {
        let ds = single_column(
            "collision_severity",
            DataType::Int64,
            vec![Value::Int64(42), Value::Int64(1), Value::Int64(42), Value::Int64(8)],
        );
        let err = normalize_codes(&ds, &CodeMappings::builtin()).unwrap_err();
        match err {
            PipelineError::UnmappedCodes { column, values } => {
                assert_eq!(column, "collision_severity");
                assert_eq!(
                    values.into_iter().collect::<Vec<_>>(),
                    vec!["42".to_string(), "8".to_string()]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn text_codes_use_text_tables() {
        let table = BTreeMap::from([(Code::Text("E09000033".into()), "Westminster".to_string())]);
        let mappings = CodeMappings::new().with_column("local_authority_highway", table);
        let ds = single_column(
            "local_authority_highway",
            DataType::Utf8,
            vec![Value::Utf8("E09000033".into())],
        );
        let out = normalize_codes(&ds, &mappings).unwrap();
        assert_eq!(out.rows[0][0], Value::Utf8("Westminster".into()));
    }

    #[test]
    fn speed_limit_sentinels_overlay_decimal_strings() {
        let ds = single_column(
            "speed_limit",
            DataType::Int64,
            vec![Value::Int64(-1), Value::Int64(99), Value::Int64(30)],
        );
        let out = normalize_special_codes(&ds).unwrap();
        assert_eq!(
            out.rows,
            vec![
                vec![Value::Utf8("Unknown".into())],
                vec![Value::Utf8("Unknown".into())],
                vec![Value::Utf8("30".into())],
            ]
        );
    }

    #[test]
    fn road_number_zero_is_unclassified_and_null_fails() {
        let ds = single_column(
            "first_road_number",
            DataType::Int64,
            vec![Value::Int64(0), Value::Int64(4)],
        );
        let out = normalize_special_codes(&ds).unwrap();
        assert_eq!(out.rows[0][0], Value::Utf8("Unclassified".into()));
        assert_eq!(out.rows[1][0], Value::Utf8("4".into()));

        let ds = single_column(
            "second_road_number",
            DataType::Int64,
            vec![Value::Int64(0), Value::Null],
        );
        let err = normalize_special_codes(&ds).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::NullIntroduced { ref column, count: 1 } if column == "second_road_number"
        ));
    }

    #[test]
    fn cast_narrows_and_rejects_overflow() {
        let ds = DataSet::new(
            Schema::new(vec![
                Field::new("n", DataType::Int64),
                Field::new("x", DataType::Float64),
            ]),
            vec![vec![Value::Int64(5), Value::Float64(0.5)]],
        );
        let (out, narrowed) = cast_columns(&ds).unwrap();
        assert_eq!(out.rows[0], vec![Value::Int32(5), Value::Float32(0.5)]);
        assert_eq!(narrowed, vec!["n".to_string(), "x".to_string()]);

        let big = single_column("n", DataType::Int64, vec![Value::Int64(i64::from(i32::MAX) + 1)]);
        assert!(matches!(
            cast_columns(&big).unwrap_err(),
            PipelineError::Narrowing { .. }
        ));
    }

    #[test]
    fn cast_rejects_float_overflow_but_keeps_nan() {
        let big = single_column("x", DataType::Float64, vec![Value::Float64(1e300)]);
        assert!(matches!(
            cast_columns(&big).unwrap_err(),
            PipelineError::FloatNarrowing { ref column, .. } if column == "x"
        ));

        let nan = single_column("x", DataType::Float64, vec![Value::Float64(f64::NAN)]);
        let (out, _) = cast_columns(&nan).unwrap();
        assert!(out.rows[0][0].is_missing());
    }
}
