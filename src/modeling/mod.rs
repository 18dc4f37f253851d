//! Curated dataset → star schema.
//!
//! Four dimensions (date, time, severity, location) and one collision fact table. Each
//! table is validated on its surrogate key before it is handed back, and the fact table
//! is checked against every dimension so no row can drop out of a join.

pub mod date;
pub mod fact;
pub mod keys;
pub mod location;
pub mod severity;
pub mod time;

use tracing::{info, info_span};

use crate::error::PipelineResult;
use crate::observability::{PipelineObserver, Stage, StageMetric};
use crate::types::DataSet;
use crate::validate::{DuplicateScope, validate};

pub use date::build_dim_date;
pub use fact::{build_fact, check_referential_integrity};
pub use keys::LocationIndex;
pub use location::build_dim_location;
pub use severity::build_dim_severity;
pub use time::build_dim_time;

/// Validated dimension and fact tables of one modeling run.
#[derive(Debug, Clone, PartialEq)]
pub struct StarSchema {
    pub dim_date: DataSet,
    pub dim_time: DataSet,
    pub dim_severity: DataSet,
    pub dim_location: DataSet,
    pub fact: DataSet,
}

impl StarSchema {
    /// Tables paired with their logical names, dimensions first.
    pub fn tables(&self) -> [(&'static str, &DataSet); 5] {
        [
            ("dim_date", &self.dim_date),
            ("dim_time", &self.dim_time),
            ("dim_severity", &self.dim_severity),
            ("dim_location", &self.dim_location),
            ("fact", &self.fact),
        ]
    }
}

/// Build, validate and cross-check every star-schema table from `curated`.
///
/// Nothing is returned unless all five tables pass.
pub fn build_star_schema(
    curated: &DataSet,
    observer: &dyn PipelineObserver,
) -> PipelineResult<StarSchema> {
    let span = info_span!("model", rows = curated.row_count());
    let _enter = span.enter();
    info!("start dimensional modeling");

    let shape_in = curated.shape();
    let record = |step: &str, out: &DataSet| {
        observer.on_metric(&StageMetric::new(Stage::Model, step, shape_in, out.shape(), String::new()));
    };

    let dim_date = validate("dim_date", build_dim_date(curated)?, &DuplicateScope::column("date_key"))?;
    record("build_dim_date", &dim_date);

    let dim_time = validate("dim_time", build_dim_time(curated)?, &DuplicateScope::column("time_key"))?;
    record("build_dim_time", &dim_time);

    let dim_severity = validate(
        "dim_severity",
        build_dim_severity(curated)?,
        &DuplicateScope::column("severity_key"),
    )?;
    record("build_dim_severity", &dim_severity);

    let locations = LocationIndex::build(curated)?;
    let dim_location = validate(
        "dim_location",
        build_dim_location(&locations),
        &DuplicateScope::column("location_key"),
    )?;
    record("build_dim_location", &dim_location);

    let fact = validate(
        "fact",
        build_fact(curated, &locations)?,
        &DuplicateScope::column("collision_key"),
    )?;
    let preserved = check_referential_integrity(
        &fact,
        &[
            ("dim_date", &dim_date),
            ("dim_time", &dim_time),
            ("dim_severity", &dim_severity),
            ("dim_location", &dim_location),
        ],
    )?;
    observer.on_metric(&StageMetric::new(
        Stage::Model,
        "build_fact",
        shape_in,
        fact.shape(),
        format!("{preserved} rows matched every dimension"),
    ));

    info!("successfully built star schema");
    Ok(StarSchema {
        dim_date,
        dim_time,
        dim_severity,
        dim_location,
        fact,
    })
}
