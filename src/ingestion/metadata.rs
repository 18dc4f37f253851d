//! Ingestion metadata used as a change-detection gate.
//!
//! Callers hash the source file before ingesting it and compare against the last recorded
//! metadata; an unchanged hash means downstream stages can be skipped.

use std::fs::File;
use std::io;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// One ingestion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionMetadata {
    /// Source file name (no directory).
    pub dataset_name: String,
    /// Lower-case hex SHA-256 of the file contents.
    pub file_hash: String,
    /// Local time the metadata was created.
    pub ingested_at: NaiveDateTime,
}

/// Outcome of comparing new metadata against the last recorded one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataCheck {
    /// New metadata is consistent; `changed` is false when the file hash is identical.
    Accepted {
        metadata: IngestionMetadata,
        changed: bool,
    },
    /// New metadata is inconsistent with the recorded one.
    Rejected { reason: String },
}

impl MetadataCheck {
    /// `true` if downstream stages should run.
    pub fn should_run(&self) -> bool {
        matches!(self, MetadataCheck::Accepted { changed: true, .. })
    }
}

/// Hash `path` and stamp it with the current local time.
pub fn create_ingestion_metadata(path: impl AsRef<Path>) -> PipelineResult<IngestionMetadata> {
    let path = path.as_ref();
    let dataset_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| PipelineError::SchemaMismatch {
            message: format!("'{}' is not a file path", path.display()),
        })?;

    info!(file = %dataset_name, "creating ingestion metadata");
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;

    Ok(IngestionMetadata {
        dataset_name,
        file_hash: hex::encode(hasher.finalize()),
        ingested_at: Local::now().naive_local(),
    })
}

/// Compare `new` against the most recent recorded metadata.
///
/// With nothing recorded the new metadata is accepted as changed.
pub fn validate_metadata(
    new: IngestionMetadata,
    current: Option<&IngestionMetadata>,
) -> MetadataCheck {
    let Some(current) = current else {
        return MetadataCheck::Accepted {
            metadata: new,
            changed: true,
        };
    };

    if new.dataset_name != current.dataset_name {
        warn!("metadata invalid: different dataset being compared");
        return MetadataCheck::Rejected {
            reason: format!(
                "dataset '{}' compared against '{}'",
                new.dataset_name, current.dataset_name
            ),
        };
    }
    if new.ingested_at <= current.ingested_at {
        warn!("metadata invalid: ingestion date inconsistency");
        return MetadataCheck::Rejected {
            reason: format!(
                "ingested_at {} is not after {}",
                new.ingested_at, current.ingested_at
            ),
        };
    }

    let changed = new.file_hash != current.file_hash;
    if changed {
        info!("metadata valid");
    } else {
        info!("metadata valid and unchanged");
    }
    MetadataCheck::Accepted {
        metadata: new,
        changed,
    }
}

/// Schema of the `ingestion_metadata` table.
pub fn metadata_schema() -> Schema {
    Schema::new(vec![
        Field::new("dataset_name", DataType::Utf8),
        Field::new("file_hash", DataType::Utf8),
        Field::new("ingested_at", DataType::DateTime),
    ])
}

/// Single-row dataset for appending to the metadata table.
pub fn metadata_to_dataset(metadata: &IngestionMetadata) -> DataSet {
    DataSet::new(
        metadata_schema(),
        vec![vec![
            Value::Utf8(metadata.dataset_name.clone()),
            Value::Utf8(metadata.file_hash.clone()),
            Value::DateTime(metadata.ingested_at),
        ]],
    )
}

/// Latest metadata for `dataset_name` in the metadata table, if any.
///
/// Rows with nulls or wrong types are skipped.
pub fn latest_metadata(table: &DataSet, dataset_name: &str) -> PipelineResult<Option<IngestionMetadata>> {
    let name_idx = table.column_index("dataset_name")?;
    let hash_idx = table.column_index("file_hash")?;
    let at_idx = table.column_index("ingested_at")?;

    let latest = table
        .rows
        .iter()
        .filter_map(|row| {
            let name = row[name_idx].as_str()?;
            if name != dataset_name {
                return None;
            }
            Some(IngestionMetadata {
                dataset_name: name.to_string(),
                file_hash: row[hash_idx].as_str()?.to_string(),
                ingested_at: row[at_idx].as_datetime()?,
            })
        })
        .max_by_key(|m| m.ingested_at);
    Ok(latest)
}
