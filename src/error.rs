use std::collections::BTreeSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::observability::Severity;

/// Convenience result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Error type returned by every pipeline stage and collaborator.
///
/// A single enum is shared across ingestion, transformation, modeling and persistence so
/// that the orchestrator can report any failure through one observer interface.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (config, schema sidecar) error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input does not conform to the expected schema.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// A stage referenced a column the dataset does not have.
    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    /// Renaming (or deriving) produced the same column name more than once.
    #[error("duplicate column names {columns:?}")]
    DuplicateColumns { columns: Vec<String> },

    /// Non-null categorical codes with no entry in the column's code mapping.
    #[error("column '{column}' contains unmapped values {values:?}")]
    UnmappedCodes {
        column: String,
        values: BTreeSet<String>,
    },

    /// Severity labels outside the fixed severity enumeration.
    #[error("unknown collision severity labels {values:?}")]
    UnknownSeverity { values: BTreeSet<String> },

    /// A normalization step produced nulls where none are allowed.
    #[error("column '{column}' contains {count} null values after normalization")]
    NullIntroduced { column: String, count: usize },

    /// A value does not fit the narrowed storage type.
    #[error("column '{column}' value {value} does not fit in a 32-bit integer")]
    Narrowing { column: String, value: i64 },

    /// A finite float overflows the 32-bit float range.
    #[error("column '{column}' value {value} does not fit in a 32-bit float")]
    FloatNarrowing { column: String, value: f64 },

    /// Post-build validation found nulls and/or duplicates.
    #[error(
        "validation of '{dataset}' failed: null values in columns {null_columns:?}, duplicate values in columns {duplicate_columns:?}"
    )]
    Validation {
        dataset: String,
        null_columns: Vec<String>,
        duplicate_columns: Vec<String>,
    },

    /// Fact rows whose derived key has no matching dimension row.
    #[error("{missing} fact rows have a '{key}' with no matching row in dimension '{dimension}'")]
    ReferentialIntegrity {
        dimension: String,
        key: String,
        missing: usize,
    },

    /// A table was requested that the store does not hold.
    #[error("table '{name}' not found")]
    TableNotFound { name: String },

    /// A reference (code lookup) file is malformed.
    #[error("invalid reference data in {}: {message}", path.display())]
    ReferenceData { path: PathBuf, message: String },
}

impl PipelineError {
    /// Severity used for observer callbacks and alert thresholds.
    ///
    /// Infrastructure failures are critical; data and contract failures are errors.
    pub fn severity(&self) -> Severity {
        match self {
            PipelineError::Io(_) | PipelineError::Csv(_) => Severity::Critical,
            _ => Severity::Error,
        }
    }
}
