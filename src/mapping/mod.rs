//! Categorical code → label lookup tables.
//!
//! [`CodeMappings`] is built once (from the builtin tables and the reference CSV files) and
//! then passed by shared reference into the cleaning stage. It is never mutated afterwards.

mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::types::Value;

pub use builtin::builtin_tables;

/// Reference file with police force codes.
pub const POLICE_FORCE_CODES_FILE: &str = "uk-police-force-codes.csv";
/// Reference file with local authority district codes.
pub const LAD_CODES_FILE: &str = "uk-lad-codes.csv";
/// Reference file with local authority (ONS/highway) codes.
pub const LA_CODES_FILE: &str = "uk-la-codes.csv";
/// Reference file with lower-layer super output area codes.
pub const LSOA_CODES_FILE: &str = "uk-lsoa-codes.csv";

/// A categorical source code.
///
/// Most codes are signed integers; local authority and LSOA codes are alphanumeric.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Code {
    Int(i64),
    Text(String),
}

impl Code {
    /// Parse a textual code, preferring the integer form.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(v) => Code::Int(v),
            Err(_) => Code::Text(trimmed.to_string()),
        }
    }

    /// Code for a dataset value; `None` for nulls and non-categorical values.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int64(_) | Value::Int32(_) => value.as_i64().map(Code::Int),
            Value::Utf8(s) => Some(Code::parse(s)),
            _ => None,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Int(v) => write!(f, "{v}"),
            Code::Text(s) => f.write_str(s),
        }
    }
}

/// Read-only lookup `column name → (code → label)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeMappings {
    columns: BTreeMap<String, BTreeMap<Code, String>>,
}

impl CodeMappings {
    /// An empty lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the static categorical tables (no reference files).
    pub fn builtin() -> Self {
        Self {
            columns: builtin_tables(),
        }
    }

    /// Builtin tables plus the four reference-file tables found in `codes_dir`.
    pub fn load_standard(codes_dir: impl AsRef<Path>) -> PipelineResult<Self> {
        let dir = codes_dir.as_ref();
        let police = load_code_to_name_map(dir.join(POLICE_FORCE_CODES_FILE), "Code", "Name")?;
        let lad = load_code_to_name_map(dir.join(LAD_CODES_FILE), "Code", "Name")?;
        let la = load_code_to_name_map(dir.join(LA_CODES_FILE), "Code", "Name")?;
        let lsoa = load_code_to_name_map(dir.join(LSOA_CODES_FILE), "Code", "Name")?;

        let mappings = Self::builtin()
            .with_column("police_force", police)
            .with_column("local_authority_district", lad)
            .with_column("local_authority_ons_district", la.clone())
            .with_column("local_authority_highway", la.clone())
            .with_column("local_authority_highway_current", la)
            .with_column("lsoa_of_accident_location", lsoa);

        info!(
            columns = mappings.columns.len(),
            dir = %dir.display(),
            "loaded code mappings"
        );
        Ok(mappings)
    }

    /// Returns a copy with `column` mapped by `table` (replacing any previous table).
    pub fn with_column(mut self, column: impl Into<String>, table: BTreeMap<Code, String>) -> Self {
        self.columns.insert(column.into(), table);
        self
    }

    /// Mapping table for a column, if any.
    pub fn get(&self, column: &str) -> Option<&BTreeMap<Code, String>> {
        self.columns.get(column)
    }

    /// Label for `code` in `column`.
    pub fn label(&self, column: &str, code: &Code) -> Option<&str> {
        self.columns
            .get(column)
            .and_then(|t| t.get(code))
            .map(String::as_str)
    }

    /// Mapped column names, sorted.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Number of mapped columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` when no column is mapped.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Read a reference CSV into a `code → name` table.
///
/// Only `key_col` and `value_col` are read; other columns are ignored. Fails if either
/// column is missing or a code appears more than once.
pub fn load_code_to_name_map(
    path: impl AsRef<Path>,
    key_col: &str,
    value_col: &str,
) -> PipelineResult<BTreeMap<Code, String>> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = rdr.headers()?.clone();

    let position = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| PipelineError::ReferenceData {
                path: path.to_path_buf(),
                message: format!(
                    "missing column '{name}'. headers={:?}",
                    headers.iter().collect::<Vec<_>>()
                ),
            })
    };
    let key_idx = position(key_col)?;
    let value_idx = position(value_col)?;

    let mut table = BTreeMap::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        let record = result?;
        let key = Code::parse(record.get(key_idx).unwrap_or(""));
        let name = record.get(value_idx).unwrap_or("").trim().to_string();
        if let Some(previous) = table.insert(key.clone(), name) {
            return Err(PipelineError::ReferenceData {
                path: path.to_path_buf(),
                message: format!(
                    "duplicate code '{key}' at row {} (previous name '{previous}')",
                    row_idx0 + 2
                ),
            });
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{Code, CodeMappings, load_code_to_name_map};
    use crate::error::PipelineError;
    use crate::types::Value;

    fn write_file(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn code_parse_prefers_integers() {
        assert_eq!(Code::parse(" 42 "), Code::Int(42));
        assert_eq!(Code::parse("-1"), Code::Int(-1));
        assert_eq!(Code::parse("E06000001"), Code::Text("E06000001".to_string()));
    }

    #[test]
    fn code_from_value_ignores_nulls_and_floats() {
        assert_eq!(Code::from_value(&Value::Int32(3)), Some(Code::Int(3)));
        assert_eq!(Code::from_value(&Value::Null), None);
        assert_eq!(Code::from_value(&Value::Float64(1.0)), None);
    }

    #[test]
    fn loads_only_requested_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "codes.csv",
            "Code,Name,Region\nE06000001,Hartlepool,North East\n1,Metropolitan Police,London\n",
        );

        let table = load_code_to_name_map(&path, "Code", "Name").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[&Code::Int(1)], "Metropolitan Police");
        assert_eq!(table[&Code::Text("E06000001".into())], "Hartlepool");
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "codes.csv", "Code,Name\n1,A\n1,B\n");

        let err = load_code_to_name_map(&path, "Code", "Name").unwrap_err();
        match err {
            PipelineError::ReferenceData { message, .. } => {
                assert!(message.contains("duplicate code '1'"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_value_column_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "codes.csv", "Code,Label\n1,A\n");

        let err = load_code_to_name_map(&path, "Code", "Name").unwrap_err();
        assert!(err.to_string().contains("missing column 'Name'"));
    }

    #[test]
    fn load_standard_shares_la_table_across_columns() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), super::POLICE_FORCE_CODES_FILE, "Code,Name\n1,Metropolitan Police\n");
        write_file(dir.path(), super::LAD_CODES_FILE, "Code,Name\n1,Westminster\n");
        write_file(dir.path(), super::LA_CODES_FILE, "Code,Name\nE09000033,Westminster\n");
        write_file(dir.path(), super::LSOA_CODES_FILE, "Code,Name\nE01004736,Westminster 018A\n");

        let mappings = CodeMappings::load_standard(dir.path()).unwrap();
        let code = Code::Text("E09000033".to_string());
        for column in [
            "local_authority_ons_district",
            "local_authority_highway",
            "local_authority_highway_current",
        ] {
            assert_eq!(mappings.label(column, &code), Some("Westminster"));
        }
        assert_eq!(mappings.label("collision_severity", &Code::Int(2)), Some("Serious"));
        assert_eq!(mappings.len(), super::builtin_tables().len() + 6);
    }
}
