//! Pipeline configuration: directories, table names and alerting.
//!
//! Loaded from a JSON file (every field optional) or taken from [`Default`]. The
//! `COLLISION_PIPELINE_DATA_DIR` environment variable overrides `data_dir` in both cases.

use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PipelineResult;
use crate::observability::Severity;

/// Environment variable overriding [`PipelineConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "COLLISION_PIPELINE_DATA_DIR";

/// Names of the tables the pipeline reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub raw: String,
    pub metadata: String,
    pub clean: String,
    pub curated: String,
    pub dim_date: String,
    pub dim_time: String,
    pub dim_severity: String,
    pub dim_location: String,
    pub fact: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            raw: "collisions_raw".to_string(),
            metadata: "ingestion_metadata".to_string(),
            clean: "collisions_clean".to_string(),
            curated: "collisions_curated".to_string(),
            dim_date: "collisions_dim_date".to_string(),
            dim_time: "collisions_dim_time".to_string(),
            dim_severity: "collisions_dim_severity".to_string(),
            dim_location: "collisions_dim_location".to_string(),
            fact: "collisions_fact".to_string(),
        }
    }
}

impl TableNames {
    /// Store table name for a star-schema table as named by
    /// [`crate::modeling::StarSchema::tables`].
    pub fn star_table(&self, logical: &str) -> Option<&str> {
        let name = match logical {
            "dim_date" => &self.dim_date,
            "dim_time" => &self.dim_time,
            "dim_severity" => &self.dim_severity,
            "dim_location" => &self.dim_location,
            "fact" => &self.fact,
            _ => return None,
        };
        Some(name.as_str())
    }
}

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root of the table store.
    pub data_dir: PathBuf,
    /// Directory holding the reference code CSVs.
    pub codes_dir: PathBuf,
    /// Raw source extract.
    pub raw_file: PathBuf,
    /// Run the quality rules between curation and modeling.
    pub apply_quality_rules: bool,
    /// Run downstream stages even when the raw file is unchanged.
    pub force_ingest: bool,
    pub table_names: TableNames,
    /// Failures at or above this severity are raised as alerts.
    pub alert_at_or_above: Severity,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            codes_dir: PathBuf::from("data/codes"),
            raw_file: PathBuf::from("data/raw/dft-road-casualty-statistics-collision-2023.csv"),
            apply_quality_rules: true,
            force_ingest: false,
            table_names: TableNames::default(),
            alert_at_or_above: Severity::Critical,
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config file, then apply environment overrides.
    pub fn from_path(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        debug!(path = %path.display(), "loaded pipeline config");
        Ok(config.with_env_overrides())
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply `COLLISION_PIPELINE_DATA_DIR` if set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        match env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => self.with_data_dir(dir),
            _ => self,
        }
    }

    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }
}
