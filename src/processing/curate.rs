//! Clean → curated transformation: business attributes derived per row.

use std::collections::BTreeSet;

use tracing::{info, info_span};

use crate::error::{PipelineError, PipelineResult};
use crate::observability::{PipelineObserver, Stage, StageMetric};
use crate::types::{DataSet, DataType, Field, Value};

const WEEKEND_DAYS: &[&str] = &["Sunday", "Saturday"];

/// Severity label → severity group.
pub const SEVERITY_GROUPS: &[(&str, &str)] = &[
    ("Slight", "low"),
    ("Serious", "medium"),
    ("Fatal", "high"),
];

/// Group for a severity label, if the label is one of the known severities.
pub fn severity_group(label: &str) -> Option<&'static str> {
    SEVERITY_GROUPS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, group)| *group)
}

/// Append `is_weekend_day`, `collision_time`, `collision_year_month` and `severity_group`.
///
/// No rows are filtered. A `collision_severity` label outside the known severities fails
/// the stage with every offending label; a null severity yields a null group.
pub fn curate(clean: &DataSet, observer: &dyn PipelineObserver) -> PipelineResult<DataSet> {
    let span = info_span!("curate", rows = clean.row_count());
    let _enter = span.enter();
    info!("start derive business data");

    let day_idx = clean.column_index("day_of_week")?;
    let dt_idx = clean.column_index("collision_datetime")?;
    let severity_idx = clean.column_index("collision_severity")?;

    let unknown: BTreeSet<String> = clean
        .rows
        .iter()
        .filter(|row| !row[severity_idx].is_null())
        .filter(|row| {
            row[severity_idx]
                .as_str()
                .and_then(severity_group)
                .is_none()
        })
        .map(|row| row[severity_idx].to_string())
        .collect();
    if !unknown.is_empty() {
        return Err(PipelineError::UnknownSeverity { values: unknown });
    }

    let curated = clean
        .with_column(Field::new("is_weekend_day", DataType::Bool), |row| {
            let weekend = row[day_idx]
                .as_str()
                .is_some_and(|day| WEEKEND_DAYS.contains(&day));
            Ok(Value::Bool(weekend))
        })?
        .with_column(Field::new("collision_time", DataType::Utf8), |row| {
            Ok(format_datetime(&row[dt_idx], "%H:%M"))
        })?
        .with_column(Field::new("collision_year_month", DataType::Utf8), |row| {
            Ok(format_datetime(&row[dt_idx], "%Y-%m"))
        })?
        .with_column(Field::new("severity_group", DataType::Utf8), |row| {
            Ok(row[severity_idx]
                .as_str()
                .and_then(severity_group)
                .map_or(Value::Null, |g| Value::Utf8(g.to_string())))
        })?;

    observer.on_metric(&StageMetric::new(
        Stage::Curate,
        "derive_business_columns",
        clean.shape(),
        curated.shape(),
        String::new(),
    ));
    info!("successfully derived business data");
    Ok(curated)
}

fn format_datetime(value: &Value, fmt: &str) -> Value {
    value
        .as_datetime()
        .map_or(Value::Null, |dt| Value::Utf8(dt.format(fmt).to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{curate, severity_group};
    use crate::error::PipelineError;
    use crate::observability::NoopObserver;
    use crate::types::{DataSet, DataType, Field, Schema, Value};

    fn clean_rows(rows: Vec<(&str, Option<(i32, u32, u32, u32, u32)>, &str)>) -> DataSet {
        let schema = Schema::new(vec![
            Field::new("day_of_week", DataType::Utf8),
            Field::new("collision_datetime", DataType::DateTime),
            Field::new("collision_severity", DataType::Utf8),
        ]);
        let rows = rows
            .into_iter()
            .map(|(day, dt, severity)| {
                let dt = dt.map_or(Value::Null, |(y, m, d, h, min)| {
                    Value::DateTime(
                        NaiveDate::from_ymd_opt(y, m, d)
                            .unwrap()
                            .and_hms_opt(h, min, 0)
                            .unwrap(),
                    )
                });
                vec![Value::Utf8(day.into()), dt, Value::Utf8(severity.into())]
            })
            .collect();
        DataSet::new(schema, rows)
    }

    #[test]
    fn derives_weekend_time_month_and_group() {
        let ds = clean_rows(vec![
            ("Sunday", Some((2023, 5, 1, 8, 15)), "Slight"),
            ("Wednesday", Some((2023, 12, 31, 23, 59)), "Fatal"),
        ]);
        let out = curate(&ds, &NoopObserver).unwrap();

        assert_eq!(out.column_count(), 7);
        assert_eq!(
            out.rows[0][3..].to_vec(),
            vec![
                Value::Bool(true),
                Value::Utf8("08:15".into()),
                Value::Utf8("2023-05".into()),
                Value::Utf8("low".into()),
            ]
        );
        assert_eq!(out.rows[1][3], Value::Bool(false));
        assert_eq!(out.rows[1][6], Value::Utf8("high".into()));
        assert_eq!(ds.column_count(), 3);
    }

    #[test]
    fn null_datetime_yields_null_derivations() {
        let ds = clean_rows(vec![("Saturday", None, "Serious")]);
        let out = curate(&ds, &NoopObserver).unwrap();
        assert_eq!(out.rows[0][4], Value::Null);
        assert_eq!(out.rows[0][5], Value::Null);
        assert_eq!(out.rows[0][6], Value::Utf8("medium".into()));
    }

    #[test]
    fn unknown_severity_fails_with_all_labels() {
        let ds = clean_rows(vec![
            ("Sunday", None, "Minor"),
            ("Sunday", None, "Slight"),
            ("Sunday", None, "Severe"),
        ]);
        match curate(&ds, &NoopObserver).unwrap_err() {
            PipelineError::UnknownSeverity { values } => {
                assert_eq!(values.len(), 2);
                assert!(values.contains("Minor") && values.contains("Severe"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn severity_group_map() {
        assert_eq!(severity_group("Serious"), Some("medium"));
        assert_eq!(severity_group("serious"), None);
    }
}
