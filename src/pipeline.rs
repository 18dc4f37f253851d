//! Stage orchestration over a [`TableStore`].
//!
//! Each stage reads its input table, runs the pure transformation and replaces its output
//! table:
//!
//! | stage      | reads                | writes                              |
//! |------------|----------------------|-------------------------------------|
//! | `ingest`   | raw CSV file         | `collisions_raw`, `ingestion_metadata` (append) |
//! | `clean`    | `collisions_raw`     | `collisions_clean`                  |
//! | `curate`   | `collisions_clean`   | `collisions_curated`                |
//! | `model`    | `collisions_curated` | four dimension tables, `collisions_fact` |
//!
//! Failures are reported to the observer (`on_failure`, plus `on_alert` at or above the
//! configured severity) and then returned.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineResult;
use crate::ingestion::{
    MetadataCheck, create_ingestion_metadata, ingest_raw_csv, latest_metadata, metadata_to_dataset,
    validate_metadata,
};
use crate::mapping::CodeMappings;
use crate::modeling::{StarSchema, build_star_schema};
use crate::observability::{PipelineObserver, Stage, StageMetric, TracingObserver};
use crate::processing::{clean, curate, quality_check};
use crate::store::{CsvStore, TableStore, WriteMode};
use crate::types::DataSet;

/// Result of [`Pipeline::run_all`].
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every stage ran and the star schema was written.
    Completed(Box<StarSchema>),
    /// The ingestion gate stopped the run before any downstream stage.
    Skipped { reason: String },
}

/// Runs pipeline stages against a table store.
pub struct Pipeline<S> {
    store: S,
    mappings: CodeMappings,
    observer: Arc<dyn PipelineObserver>,
    config: PipelineConfig,
}

impl<S> fmt::Debug for Pipeline<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("mapped_columns", &self.mappings.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Pipeline<CsvStore> {
    /// CSV-backed pipeline rooted at `config.data_dir`, with reference codes loaded from
    /// `config.codes_dir`.
    pub fn from_config(config: PipelineConfig) -> PipelineResult<Self> {
        let store = CsvStore::open(&config.data_dir)?;
        let mappings = CodeMappings::load_standard(&config.codes_dir)?;
        Ok(Self::new(store, mappings, config))
    }
}

impl<S: TableStore> Pipeline<S> {
    /// Pipeline reporting through [`TracingObserver`].
    pub fn new(store: S, mappings: CodeMappings, config: PipelineConfig) -> Self {
        Self {
            store,
            mappings,
            observer: Arc::new(TracingObserver),
            config,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Hash the raw file, compare against the last recorded ingestion and, when the file
    /// changed (or `force_ingest` is set), load it into the raw table and record the new
    /// metadata.
    ///
    /// A rejected or unchanged file writes nothing; the returned check says which.
    pub fn ingest(&self, path: impl AsRef<Path>) -> PipelineResult<MetadataCheck> {
        let path = path.as_ref();
        self.observed(Stage::Ingest, || {
            let names = &self.config.table_names;
            let metadata = create_ingestion_metadata(path)?;

            let current = if self.store.has_table(&names.metadata)? {
                let table = self.store.read_table(&names.metadata)?;
                latest_metadata(&table, &metadata.dataset_name)?
            } else {
                None
            };

            let dataset_name = metadata.dataset_name.clone();
            let check = validate_metadata(metadata, current.as_ref());
            let record = match &check {
                MetadataCheck::Rejected { reason } => {
                    warn!(%reason, "ingestion rejected");
                    None
                }
                MetadataCheck::Accepted { changed: false, .. } if !self.config.force_ingest => {
                    info!("raw file unchanged, nothing ingested");
                    None
                }
                MetadataCheck::Accepted { metadata, .. } => Some(metadata_to_dataset(metadata)),
            };
            let Some(record) = record else {
                return Ok(check);
            };

            info!(file = %path.display(), "ingesting raw file");
            let raw = ingest_raw_csv(path)?;
            self.store.write_table(&names.raw, &raw, WriteMode::Replace)?;
            self.store.write_table(&names.metadata, &record, WriteMode::Append)?;

            self.observer.on_metric(&StageMetric::new(
                Stage::Ingest,
                "ingest_raw",
                (0, 0),
                raw.shape(),
                dataset_name,
            ));
            Ok(check)
        })
    }

    /// Raw table → clean table.
    pub fn clean(&self) -> PipelineResult<DataSet> {
        self.observed(Stage::Clean, || {
            let names = &self.config.table_names;
            let raw = self.store.read_table(&names.raw)?;
            let cleaned = clean(&raw, &self.mappings, self.observer.as_ref())?;
            self.store.write_table(&names.clean, &cleaned, WriteMode::Replace)?;
            Ok(cleaned)
        })
    }

    /// Clean table → curated table.
    pub fn curate(&self) -> PipelineResult<DataSet> {
        self.observed(Stage::Curate, || {
            let names = &self.config.table_names;
            let cleaned = self.store.read_table(&names.clean)?;
            let curated = curate(&cleaned, self.observer.as_ref())?;
            self.store.write_table(&names.curated, &curated, WriteMode::Replace)?;
            Ok(curated)
        })
    }

    /// Curated table → star schema, filtered by the quality rules first when
    /// `apply_quality_rules` is set.
    ///
    /// No table is written unless every dimension and the fact table validated.
    pub fn model(&self) -> PipelineResult<StarSchema> {
        let names = &self.config.table_names;
        let curated = self.observed(Stage::Model, || self.store.read_table(&names.curated))?;

        let input = if self.config.apply_quality_rules {
            self.observed(Stage::Quality, || {
                quality_check(&curated, self.observer.as_ref())
            })?
        } else {
            curated
        };

        self.observed(Stage::Model, || {
            let star = build_star_schema(&input, self.observer.as_ref())?;
            for (logical, table) in star.tables() {
                let Some(name) = names.star_table(logical) else {
                    continue;
                };
                self.store.write_table(name, table, WriteMode::Replace)?;
            }
            Ok(star)
        })
    }

    /// Ingest then, unless the gate stops the run, clean, curate and model.
    pub fn run_all(&self, path: impl AsRef<Path>) -> PipelineResult<RunOutcome> {
        match self.ingest(path)? {
            MetadataCheck::Rejected { reason } => {
                return Ok(RunOutcome::Skipped { reason });
            }
            MetadataCheck::Accepted { changed: false, .. } if !self.config.force_ingest => {
                return Ok(RunOutcome::Skipped {
                    reason: "raw file unchanged since last ingestion".to_string(),
                });
            }
            MetadataCheck::Accepted { .. } => {}
        }

        self.clean()?;
        self.curate()?;
        let star = self.model()?;
        info!(fact_rows = star.fact.row_count(), "pipeline run complete");
        Ok(RunOutcome::Completed(Box::new(star)))
    }

    fn observed<T>(&self, stage: Stage, run: impl FnOnce() -> PipelineResult<T>) -> PipelineResult<T> {
        let result = run();
        if let Err(e) = &result {
            let severity = e.severity();
            self.observer.on_failure(stage, severity, e);
            if severity >= self.config.alert_at_or_above {
                self.observer.on_alert(stage, severity, e);
            }
        }
        result
    }
}
