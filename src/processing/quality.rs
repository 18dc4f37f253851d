//! Data-quality rules: row filters that report how many rows they removed.
//!
//! Rules never fail on data; rows that break a rule are dropped and counted. The only
//! error is a rule naming a column the dataset does not have.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::ops::Bound;

use chrono::NaiveDate;
use tracing::{info, info_span};

use crate::error::PipelineResult;
use crate::observability::{PipelineObserver, Stage, StageMetric};
use crate::processing::clean::ID_COLUMN;
use crate::types::{DataSet, Value, ValueKey};

/// Which occurrence of a duplicated subset survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Keep {
    /// The first row in dataset order wins.
    First,
    /// The last row in dataset order wins.
    #[default]
    Last,
}

/// One row-filtering rule.
#[derive(Debug, Clone, PartialEq)]
pub enum QualityRule {
    /// Drop rows with a null or NaN in any of `columns`.
    NotNull { columns: Vec<String> },
    /// Drop rows whose `columns` values repeat, keeping one occurrence.
    NotDuplicate { columns: Vec<String>, keep: Keep },
    /// Drop rows whose `column` value falls outside the bounds (nulls included).
    InRange {
        column: String,
        lower: Bound<Value>,
        upper: Bound<Value>,
    },
}

/// Result of applying one rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    /// Rows that passed the rule.
    pub dataset: DataSet,
    /// Number of rows dropped.
    pub removed: usize,
    /// Metric text describing the rule and the removed count.
    pub message: String,
}

impl QualityRule {
    /// Not-null rule over `columns`.
    pub fn not_null(columns: &[&str]) -> Self {
        QualityRule::NotNull {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    /// Not-duplicate rule over `columns`.
    pub fn not_duplicate(columns: &[&str], keep: Keep) -> Self {
        QualityRule::NotDuplicate {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            keep,
        }
    }

    /// Inclusive range rule `min <= value <= max`.
    pub fn in_range(column: &str, min: Value, max: Value) -> Self {
        QualityRule::InRange {
            column: column.to_string(),
            lower: Bound::Included(min),
            upper: Bound::Included(max),
        }
    }

    /// Half-open range rule `min <= value < max`.
    pub fn in_half_open_range(column: &str, min: Value, max: Value) -> Self {
        QualityRule::InRange {
            column: column.to_string(),
            lower: Bound::Included(min),
            upper: Bound::Excluded(max),
        }
    }

    /// Short rule name used in metrics.
    pub fn name(&self) -> &'static str {
        match self {
            QualityRule::NotNull { .. } => "null",
            QualityRule::NotDuplicate { .. } => "duplicate",
            QualityRule::InRange { .. } => "in range",
        }
    }

    /// Apply the rule, returning the surviving rows and the removed count.
    pub fn apply(&self, ds: &DataSet) -> PipelineResult<RuleOutcome> {
        let dataset = match self {
            QualityRule::NotNull { columns } => {
                let idxs = indexes(ds, columns)?;
                ds.filter_rows(|row| idxs.iter().all(|&i| !row[i].is_missing()))
            }
            QualityRule::NotDuplicate { columns, keep } => {
                let idxs = indexes(ds, columns)?;
                drop_duplicates(ds, &idxs, *keep)
            }
            QualityRule::InRange {
                column,
                lower,
                upper,
            } => {
                let idx = ds.column_index(column)?;
                ds.filter_rows(|row| within(&row[idx], lower, upper))
            }
        };

        let removed = ds.row_count() - dataset.row_count();
        let message = format!("{removed} rows were removed after {self}");
        Ok(RuleOutcome {
            dataset,
            removed,
            message,
        })
    }
}

impl fmt::Display for QualityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityRule::NotNull { columns } | QualityRule::NotDuplicate { columns, .. } => {
                write!(f, "'{}' quality check for columns {columns:?}", self.name())
            }
            QualityRule::InRange { column, .. } => {
                write!(f, "'{}' quality check for column '{column}'", self.name())
            }
        }
    }
}

fn indexes(ds: &DataSet, columns: &[String]) -> PipelineResult<Vec<usize>> {
    columns.iter().map(|c| ds.column_index(c)).collect()
}

fn drop_duplicates(ds: &DataSet, idxs: &[usize], keep: Keep) -> DataSet {
    let key = |row: &[Value]| -> Vec<ValueKey> { idxs.iter().map(|&i| row[i].key()).collect() };

    let mut seen = HashSet::with_capacity(ds.row_count());
    let mut keep_row = vec![false; ds.row_count()];
    let order: Box<dyn Iterator<Item = usize>> = match keep {
        Keep::First => Box::new(0..ds.row_count()),
        Keep::Last => Box::new((0..ds.row_count()).rev()),
    };
    for i in order {
        keep_row[i] = seen.insert(key(ds.rows[i].as_slice()));
    }

    let rows = ds
        .rows
        .iter()
        .zip(keep_row)
        .filter(|(_, kept)| *kept)
        .map(|(row, _)| row.clone())
        .collect();
    DataSet::new(ds.schema.clone(), rows)
}

fn within(value: &Value, lower: &Bound<Value>, upper: &Bound<Value>) -> bool {
    let above = match lower {
        Bound::Included(min) => matches!(compare(value, min), Some(Ordering::Greater | Ordering::Equal)),
        Bound::Excluded(min) => matches!(compare(value, min), Some(Ordering::Greater)),
        Bound::Unbounded => !value.is_null(),
    };
    let below = match upper {
        Bound::Included(max) => matches!(compare(value, max), Some(Ordering::Less | Ordering::Equal)),
        Bound::Excluded(max) => matches!(compare(value, max), Some(Ordering::Less)),
        Bound::Unbounded => !value.is_null(),
    };
    above && below
}

/// Ordering between comparable values: numbers with numbers, timestamps with
/// timestamps, strings with strings. Anything else (including nulls) is unordered.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
        (Value::Utf8(x), Value::Utf8(y)) => Some(x.cmp(y)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

/// The fixed rule sequence for the collisions dataset.
pub fn collision_rules() -> Vec<QualityRule> {
    let midnight = |year| {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map_or(Value::Null, Value::DateTime)
    };
    vec![
        QualityRule::not_null(&[ID_COLUMN]),
        QualityRule::not_duplicate(&[ID_COLUMN], Keep::Last),
        QualityRule::in_range("latitude", Value::Float64(-90.0), Value::Float64(90.0)),
        QualityRule::in_range("longitude", Value::Float64(-180.0), Value::Float64(180.0)),
        QualityRule::in_half_open_range("collision_datetime", midnight(2023), midnight(2024)),
    ]
}

/// Apply `rules` in order, reporting one metric per rule.
pub fn apply_rules(
    ds: &DataSet,
    rules: &[QualityRule],
    observer: &dyn PipelineObserver,
) -> PipelineResult<DataSet> {
    let mut current = ds.clone();
    for rule in rules {
        let outcome = rule.apply(&current)?;
        observer.on_metric(&StageMetric::new(
            Stage::Quality,
            rule.name(),
            current.shape(),
            outcome.dataset.shape(),
            outcome.message,
        ));
        current = outcome.dataset;
    }
    Ok(current)
}

/// Apply [`collision_rules`] to the collisions dataset.
pub fn quality_check(ds: &DataSet, observer: &dyn PipelineObserver) -> PipelineResult<DataSet> {
    let span = info_span!("quality_check", rows = ds.row_count());
    let _enter = span.enter();

    let out = apply_rules(ds, &collision_rules(), observer)?;
    info!(
        rows_in = ds.row_count(),
        rows_out = out.row_count(),
        "quality rules applied"
    );
    Ok(out)
}
