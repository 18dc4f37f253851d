//! Post-build null/duplicate checks for dimension and fact datasets.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::types::DataSet;

/// Which columns the duplicate check inspects.
///
/// Every column in scope is checked independently for repeated values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateScope {
    /// Every column of the dataset.
    AllColumns,
    /// A single column (typically the surrogate key).
    OneColumn(String),
    /// An explicit list of columns.
    ColumnSubset(Vec<String>),
}

impl DuplicateScope {
    /// Scope over one column.
    pub fn column(name: impl Into<String>) -> Self {
        DuplicateScope::OneColumn(name.into())
    }

    fn columns<'a>(&'a self, dataset: &'a DataSet) -> Vec<&'a str> {
        match self {
            DuplicateScope::AllColumns => dataset.schema.field_names().collect(),
            DuplicateScope::OneColumn(name) => vec![name.as_str()],
            DuplicateScope::ColumnSubset(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

/// Columns containing at least one null or NaN, in schema order.
pub fn null_columns(dataset: &DataSet) -> Vec<String> {
    dataset
        .schema
        .fields
        .iter()
        .enumerate()
        .filter(|(idx, _)| dataset.rows.iter().any(|row| row[*idx].is_missing()))
        .map(|(_, f)| f.name.clone())
        .collect()
}

/// Columns in `scope` containing a repeated value, in scope order.
pub fn duplicate_columns(dataset: &DataSet, scope: &DuplicateScope) -> PipelineResult<Vec<String>> {
    let mut out = Vec::new();
    for name in scope.columns(dataset) {
        let idx = dataset.column_index(name)?;
        let mut seen = HashSet::with_capacity(dataset.row_count());
        if !dataset.rows.iter().all(|row| seen.insert(row[idx].key())) {
            out.push(name.to_string());
        }
    }
    Ok(out)
}

/// Check `dataset` for nulls (any column) and duplicates (columns in `scope`).
///
/// Both checks always run so the error names every offending column. On success the
/// dataset is handed back unchanged.
pub fn validate(
    name: &str,
    dataset: DataSet,
    scope: &DuplicateScope,
) -> PipelineResult<DataSet> {
    let null_columns = null_columns(&dataset);
    let duplicate_columns = duplicate_columns(&dataset, scope)?;

    if !null_columns.is_empty() || !duplicate_columns.is_empty() {
        return Err(PipelineError::Validation {
            dataset: name.to_string(),
            null_columns,
            duplicate_columns,
        });
    }
    debug!(dataset = name, rows = dataset.row_count(), "validated");
    Ok(dataset)
}
