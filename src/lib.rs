//! `collision-pipeline` turns the published road-collision extract into a validated star
//! schema.
//!
//! Data moves through the pipeline as an in-memory, row-major [`types::DataSet`] whose
//! cells are typed [`types::Value`]s. Each stage is a plain function from dataset to
//! dataset; only [`pipeline::Pipeline`] touches storage.
//!
//! ## Stages
//!
//! 1. **Ingest** ([`ingestion`]): read the raw CSV, merge `date` + `time` into
//!    `collision_datetime`, and gate the run on the file's SHA-256 hash.
//! 2. **Clean** ([`processing::clean()`]): normalize column names, map categorical codes to
//!    labels (failing on any unmapped code), resolve special sentinel codes, strip
//!    whitespace and narrow numeric types.
//! 3. **Curate** ([`processing::curate()`]): derive `is_weekend_day`, `collision_time`,
//!    `collision_year_month` and `severity_group`.
//! 4. **Quality** ([`processing::quality_check()`]): drop null/duplicate/out-of-range rows,
//!    reporting how many each rule removed.
//! 5. **Model** ([`modeling::build_star_schema`]): date, time, severity and location
//!    dimensions plus the collision fact table, each validated by [`validate::validate`].
//!
//! ## Example: reference codes to labels
//!
//! ```rust
//! use collision_pipeline::mapping::{Code, CodeMappings};
//!
//! let mappings = CodeMappings::builtin();
//! assert_eq!(mappings.label("collision_severity", &Code::Int(1)), Some("Fatal"));
//! assert_eq!(mappings.label("collision_severity", &Code::Int(9)), None);
//! ```
//!
//! ## Example: run against an in-memory store
//!
//! ```no_run
//! use collision_pipeline::config::PipelineConfig;
//! use collision_pipeline::mapping::CodeMappings;
//! use collision_pipeline::pipeline::{Pipeline, RunOutcome};
//! use collision_pipeline::store::MemoryStore;
//!
//! # fn main() -> collision_pipeline::PipelineResult<()> {
//! let mappings = CodeMappings::load_standard("data/codes")?;
//! let pipeline = Pipeline::new(MemoryStore::new(), mappings, PipelineConfig::default());
//! if let RunOutcome::Completed(star) = pipeline.run_all("data/raw/collisions-2023.csv")? {
//!     println!("fact rows={}", star.fact.row_count());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: schema + in-memory dataset types
//! - [`mapping`]: categorical code → label tables
//! - [`ingestion`]: raw CSV reader, typed CSV reader/writer, ingestion metadata
//! - [`processing`]: clean, curate and quality stages
//! - [`modeling`]: star-schema builders
//! - [`validate`]: null/duplicate checks
//! - [`store`]: named-table persistence
//! - [`pipeline`]: stage orchestration
//! - [`config`], [`logging`], [`observability`]: runtime settings, log output, metrics
//! - [`error`]: error type shared by every module

pub mod config;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod mapping;
pub mod modeling;
pub mod observability;
pub mod pipeline;
pub mod processing;
pub mod store;
pub mod types;
pub mod validate;

pub use error::{PipelineError, PipelineResult};
