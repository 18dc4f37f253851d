//! Surrogate key derivation shared by the dimension builders and the fact builder.
//!
//! The fact table re-derives each key from the curated row with these same functions.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::PipelineResult;
use crate::types::{DataSet, Value};

/// Severity label → `severity_key`.
pub const SEVERITY_KEYS: &[(&str, i64)] = &[("Slight", 1), ("Serious", 2), ("Fatal", 3)];

/// Decimal places kept when bucketing coordinates (~1 km grid cell).
pub const BUCKET_PRECISION: i32 = 2;

/// `YYYYMMDD` as an integer.
pub fn date_key(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}

/// `hour * 100 + minute` (08:15 → 815, 00:01 → 1).
pub fn time_key(hour: u32, minute: u32) -> i64 {
    i64::from(hour) * 100 + i64::from(minute)
}

/// `(hour, minute)` of a timestamp.
pub fn hour_minute(dt: NaiveDateTime) -> (u32, u32) {
    (dt.hour(), dt.minute())
}

/// Key for a severity label, `None` for labels outside [`SEVERITY_KEYS`].
pub fn severity_key(label: &str) -> Option<i64> {
    SEVERITY_KEYS
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, key)| *key)
}

/// Coordinate rounded half-to-even to [`BUCKET_PRECISION`] decimals, kept as an integer
/// count of hundredths so buckets hash and sort exactly.
pub fn bucket(coordinate: f64) -> i64 {
    let scale = 10f64.powi(BUCKET_PRECISION);
    (coordinate * scale).round_ties_even() as i64
}

/// Bucket back to its decimal value.
pub fn bucket_value(bucket: i64) -> f64 {
    bucket as f64 / 10f64.powi(BUCKET_PRECISION)
}

/// `(lon_bucket, lat_bucket)` for a row's coordinates; `None` if either is null or not finite.
pub fn location_bucket(longitude: &Value, latitude: &Value) -> Option<(i64, i64)> {
    let finite = |v: &Value| v.as_f64().filter(|c| c.is_finite());
    Some((bucket(finite(longitude)?), bucket(finite(latitude)?)))
}

/// Dense 1-based `location_key` assignment over the sorted distinct buckets of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationIndex {
    keys: BTreeMap<(i64, i64), i64>,
    has_missing: bool,
}

impl LocationIndex {
    /// Index the `longitude`/`latitude` buckets of `ds`.
    pub fn build(ds: &DataSet) -> PipelineResult<Self> {
        let lon_idx = ds.column_index("longitude")?;
        let lat_idx = ds.column_index("latitude")?;

        let mut has_missing = false;
        let mut buckets = BTreeSet::new();
        for row in &ds.rows {
            match location_bucket(&row[lon_idx], &row[lat_idx]) {
                Some(b) => {
                    buckets.insert(b);
                }
                None => has_missing = true,
            }
        }

        let keys = buckets.into_iter().zip(1..).collect();
        Ok(Self { keys, has_missing })
    }

    /// Key of a bucket.
    pub fn key(&self, bucket: (i64, i64)) -> Option<i64> {
        self.keys.get(&bucket).copied()
    }

    /// Buckets with their keys, in key order.
    pub fn iter(&self) -> impl Iterator<Item = ((i64, i64), i64)> + '_ {
        self.keys.iter().map(|(b, k)| (*b, *k))
    }

    /// Whether some row had no usable coordinates.
    pub fn has_missing(&self) -> bool {
        self.has_missing
    }

    /// Number of distinct buckets.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `true` when no bucket was indexed.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
