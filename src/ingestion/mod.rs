//! Reading source files and persisted tables into [`crate::types::DataSet`]s.
//!
//! - [`raw`]: the published collisions extract (combines `date`/`time` into one timestamp)
//! - [`csv`]: schema-driven CSV reader and the matching writer
//! - [`metadata`]: file-hash change detection used to gate a pipeline run

pub mod csv;
pub mod metadata;
pub mod raw;

pub use metadata::{
    IngestionMetadata, MetadataCheck, create_ingestion_metadata, latest_metadata, metadata_to_dataset,
    validate_metadata,
};
pub use raw::{ingest_raw_csv, raw_collisions_schema};
