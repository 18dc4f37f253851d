//! Dataset transformations between pipeline layers.
//!
//! Every function takes its input by shared reference and returns a new dataset.
//!
//! - [`clean()`]: raw → clean (rename, code → label, special codes, strip, narrow types)
//! - [`curate()`]: clean → curated (weekend flag, time, year-month, severity group)
//! - [`quality_check()`]: not-null / not-duplicate / in-range row filters with metrics
//!
//! ## Example: curate then filter
//!
//! ```rust
//! use chrono::NaiveDate;
//! use collision_pipeline::observability::NoopObserver;
//! use collision_pipeline::processing::{curate, QualityRule};
//! use collision_pipeline::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let at = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap().and_hms_opt(8, 15, 0).unwrap();
//! let clean = DataSet::new(
//!     Schema::new(vec![
//!         Field::new("day_of_week", DataType::Utf8),
//!         Field::new("collision_datetime", DataType::DateTime),
//!         Field::new("collision_severity", DataType::Utf8),
//!     ]),
//!     vec![vec![
//!         Value::Utf8("Monday".into()),
//!         Value::DateTime(at),
//!         Value::Utf8("Slight".into()),
//!     ]],
//! );
//!
//! let curated = curate(&clean, &NoopObserver).unwrap();
//! let rule = QualityRule::not_null(&["collision_datetime"]);
//! assert_eq!(rule.apply(&curated).unwrap().removed, 0);
//! ```

pub mod clean;
pub mod curate;
pub mod quality;

pub use clean::{ID_COLUMN, clean};
pub use curate::{curate, severity_group};
pub use quality::{Keep, QualityRule, RuleOutcome, apply_rules, collision_rules, quality_check};
