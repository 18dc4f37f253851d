//! Core data model types shared by every pipeline stage.
//!
//! Stages exchange an in-memory [`DataSet`] described by a [`Schema`] (a list of typed
//! [`Field`]s). A stage never mutates its input; it builds and returns a new dataset.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 32-bit signed integer (storage-narrowed integer columns).
    Int32,
    /// 64-bit floating point number.
    Float64,
    /// 32-bit floating point number (storage-narrowed float columns).
    Float32,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Timestamp without timezone.
    DateTime,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field/column name.
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A list of fields describing the shape of a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Returns the index of a field by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` when the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit float.
    Float64(f64),
    /// 32-bit float.
    Float32(f32),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// Timestamp without timezone.
    DateTime(NaiveDateTime),
}

/// Hashable, totally ordered projection of a [`Value`].
///
/// Floats compare by bit pattern so that duplicate detection is well defined.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKey {
    Null,
    Int(i64),
    Float(u64),
    Bool(bool),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `true` for [`Value::Null`] and NaN floats.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float64(v) => v.is_nan(),
            Value::Float32(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Integer view of the value (both integer widths).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            Value::Int32(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Numeric view of the value (integers and floats).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int64(v) => Some(*v as f64),
            Value::Int32(v) => Some(f64::from(*v)),
            Value::Float64(v) => Some(*v),
            Value::Float32(v) => Some(f64::from(*v)),
            _ => None,
        }
    }

    /// String view of a [`Value::Utf8`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Timestamp view of a [`Value::DateTime`].
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Hash/equality key for this value.
    ///
    /// Both integer widths share one key space, as do both float widths (widened to f64).
    pub fn key(&self) -> ValueKey {
        match self {
            Value::Null => ValueKey::Null,
            Value::Int64(v) => ValueKey::Int(*v),
            Value::Int32(v) => ValueKey::Int(i64::from(*v)),
            Value::Float64(v) => ValueKey::Float(v.to_bits()),
            Value::Float32(v) => ValueKey::Float(f64::from(*v).to_bits()),
            Value::Bool(v) => ValueKey::Bool(*v),
            Value::Utf8(s) => ValueKey::Text(s.clone()),
            Value::DateTime(dt) => ValueKey::DateTime(*dt),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Utf8(s) => f.write_str(s),
            Value::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

/// Canonical text form of [`Value::DateTime`] values.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns in the dataset.
    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    /// `(rows, columns)`, for shape metrics.
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    /// Index of `name`, or [`PipelineError::MissingColumn`].
    pub fn column_index(&self, name: &str) -> PipelineResult<usize> {
        self.schema
            .index_of(name)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: name.to_string(),
            })
    }

    /// Borrow every value of one column, in row order.
    pub fn column_values(&self, name: &str) -> PipelineResult<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Create a new dataset containing only rows that match `predicate`.
    ///
    /// The returned dataset preserves the original schema.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Create a new dataset by applying `mapper` to every row.
    ///
    /// The returned dataset preserves the original schema.
    ///
    /// # Panics
    ///
    /// Panics if `mapper` returns a row with a different length than the schema field count.
    pub fn map_rows<F>(&self, mut mapper: F) -> Self
    where
        F: FnMut(&[Value]) -> Vec<Value>,
    {
        let expected_len = self.schema.fields.len();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let out = mapper(row.as_slice());
                assert!(
                    out.len() == expected_len,
                    "mapped row length {} does not match schema length {}",
                    out.len(),
                    expected_len
                );
                out
            })
            .collect();

        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Returns a new dataset with `field` appended, filled row-by-row from `derive`.
    pub fn with_column<F>(&self, field: Field, mut derive: F) -> PipelineResult<Self>
    where
        F: FnMut(&[Value]) -> PipelineResult<Value>,
    {
        if self.schema.index_of(&field.name).is_some() {
            return Err(PipelineError::DuplicateColumns {
                columns: vec![field.name],
            });
        }
        let mut rows = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let value = derive(row.as_slice())?;
            let mut out = Vec::with_capacity(row.len() + 1);
            out.extend(row.iter().cloned());
            out.push(value);
            rows.push(out);
        }
        let mut schema = self.schema.clone();
        schema.fields.push(field);
        Ok(Self { schema, rows })
    }

    /// Projection onto `names`, in the given order.
    pub fn select(&self, names: &[&str]) -> PipelineResult<Self> {
        let idxs = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<PipelineResult<Vec<_>>>()?;
        let schema = Schema::new(
            idxs.iter()
                .map(|&i| self.schema.fields[i].clone())
                .collect(),
        );
        let rows = self
            .rows
            .iter()
            .map(|row| idxs.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Ok(Self { schema, rows })
    }
}
