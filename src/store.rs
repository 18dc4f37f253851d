//! Named-table persistence used between pipeline stages.
//!
//! Stages never open files themselves: they read their input table from a [`TableStore`]
//! and write their output back to it.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::error::{PipelineError, PipelineResult};
use crate::ingestion::csv::{ingest_csv_from_path, write_csv_to_path};
use crate::types::{DataSet, Schema};

/// How [`TableStore::write_table`] treats an existing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Truncate and overwrite.
    #[default]
    Replace,
    /// Add rows; the schema must match the stored one exactly.
    Append,
}

/// A collection of named tables.
pub trait TableStore: Send + Sync {
    /// Read a whole table.
    fn read_table(&self, name: &str) -> PipelineResult<DataSet>;

    /// Write `dataset` under `name`.
    fn write_table(&self, name: &str, dataset: &DataSet, mode: WriteMode) -> PipelineResult<()>;

    /// Whether `name` exists.
    fn has_table(&self, name: &str) -> PipelineResult<bool>;
}

fn ensure_same_schema(name: &str, stored: &Schema, incoming: &Schema) -> PipelineResult<()> {
    if stored != incoming {
        return Err(PipelineError::SchemaMismatch {
            message: format!(
                "cannot append to '{name}': stored columns {:?}, incoming {:?}",
                stored.field_names().collect::<Vec<_>>(),
                incoming.field_names().collect::<Vec<_>>()
            ),
        });
    }
    Ok(())
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, DataSet>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all stored tables, sorted.
    pub fn table_names(&self) -> Vec<String> {
        let tables = self.tables.read().unwrap_or_else(|p| p.into_inner());
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        names
    }
}

impl TableStore for MemoryStore {
    fn read_table(&self, name: &str) -> PipelineResult<DataSet> {
        let tables = self.tables.read().unwrap_or_else(|p| p.into_inner());
        tables
            .get(name)
            .cloned()
            .ok_or_else(|| PipelineError::TableNotFound {
                name: name.to_string(),
            })
    }

    fn write_table(&self, name: &str, dataset: &DataSet, mode: WriteMode) -> PipelineResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(|p| p.into_inner());
        match (mode, tables.get_mut(name)) {
            (WriteMode::Append, Some(existing)) => {
                ensure_same_schema(name, &existing.schema, &dataset.schema)?;
                existing.rows.extend(dataset.rows.iter().cloned());
            }
            _ => {
                tables.insert(name.to_string(), dataset.clone());
            }
        }
        debug!(table = name, rows = dataset.row_count(), ?mode, "table written");
        Ok(())
    }

    fn has_table(&self, name: &str) -> PipelineResult<bool> {
        let tables = self.tables.read().unwrap_or_else(|p| p.into_inner());
        Ok(tables.contains_key(name))
    }
}

/// Directory of `<name>.csv` files, each with a `<name>.schema.json` sidecar carrying
/// column types.
#[derive(Debug, Clone)]
pub struct CsvStore {
    root: PathBuf,
}

impl CsvStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> PipelineResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.csv"))
    }

    fn schema_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.schema.json"))
    }

    fn read_schema(&self, name: &str) -> PipelineResult<Schema> {
        let file = File::open(self.schema_path(name))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl TableStore for CsvStore {
    fn read_table(&self, name: &str) -> PipelineResult<DataSet> {
        if !self.has_table(name)? {
            return Err(PipelineError::TableNotFound {
                name: name.to_string(),
            });
        }
        let schema = self.read_schema(name)?;
        ingest_csv_from_path(self.data_path(name), &schema)
    }

    fn write_table(&self, name: &str, dataset: &DataSet, mode: WriteMode) -> PipelineResult<()> {
        let data_path = self.data_path(name);
        let append = mode == WriteMode::Append && self.has_table(name)?;

        if append {
            ensure_same_schema(name, &self.read_schema(name)?, &dataset.schema)?;
            let file = fs::OpenOptions::new().append(true).open(&data_path)?;
            let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
            for row in &dataset.rows {
                wtr.write_record(row.iter().map(ToString::to_string))?;
            }
            wtr.flush()?;
        } else {
            write_csv_to_path(&data_path, dataset)?;
            let schema_file = File::create(self.schema_path(name))?;
            serde_json::to_writer_pretty(schema_file, &dataset.schema)?;
        }

        debug!(
            table = name,
            rows = dataset.row_count(),
            path = %data_path.display(),
            ?mode,
            "table written"
        );
        Ok(())
    }

    fn has_table(&self, name: &str) -> PipelineResult<bool> {
        Ok(self.data_path(name).is_file() && self.schema_path(name).is_file())
    }
}
