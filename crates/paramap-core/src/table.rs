//! Delimited-text tables and column-role resolution.
//!
//! Column headers are matched against an ordered list of accepted aliases per
//! role, ignoring ASCII case. The first alias that matches any header wins.
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

// ── Accepted column aliases ──────────────────────────────────────────────────

/// Land-use code column of a classification table.
pub const CODE_COLUMNS: &[&str] = &["CODE", "VALUE"];
/// Species/class column of a classification table.
pub const CLASS_COLUMNS: &[&str] = &["CLASS", "SPECIESID"];
/// Species column of a parameter table.
pub const ID_COLUMNS: &[&str] = &["SPECIESID", "SPECIES", "ID", "CLASS"];
/// Parameter name column of a parameter table.
pub const KEY_COLUMNS: &[&str] = &["CONSTANT", "VARIABLE", "KEY", "NAME", "PARAM", "PARAMETER"];
/// Numeric value column of a parameter table.
pub const VALUE_COLUMNS: &[&str] = &["VALUE", "VAL", "AMOUNT"];
/// Optional uniform/spatial flag column of a parameter table.
pub const TYPE_COLUMNS: &[&str] = &["TYPE"];

/// What a resolved column is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnRole {
    Code,
    Class,
    SpeciesId,
    ParameterKey,
    Value,
    Type,
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnRole::Code => "code",
            ColumnRole::Class => "class",
            ColumnRole::SpeciesId => "species id",
            ColumnRole::ParameterKey => "parameter key",
            ColumnRole::Value => "value",
            ColumnRole::Type => "type",
        };
        f.write_str(s)
    }
}

/// Find the header for `role`.
///
/// Candidates are tried in order; each is compared to every header ignoring
/// ASCII case. Returns the index of the matching header, or
/// [`MapError::MissingColumn`] if no candidate is present.
pub fn resolve_column(
    headers: &[String],
    role: ColumnRole,
    candidates: &[&str],
    table: &str,
) -> Result<usize> {
    candidates
        .iter()
        .find_map(|cand| headers.iter().position(|h| h.eq_ignore_ascii_case(cand)))
        .ok_or_else(|| MapError::MissingColumn {
            table: table.to_string(),
            role,
            candidates: candidates.join(", "),
        })
}

// ── Table ────────────────────────────────────────────────────────────────────

/// An in-memory delimited-text table with a header row. Fields are kept verbatim.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    records: Vec<StringRecord>,
}

impl Table {
    /// Read a table, using tab as delimiter for `.tsv`/`.tab` files and comma otherwise.
    pub fn read(path: &Path) -> Result<Self> {
        Self::read_with_delimiter(path, delimiter_for(path))
    }

    pub fn read_with_delimiter(path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path).map_err(|e| MapError::io(path, e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_reader(name, file, delimiter)
    }

    /// Parse a table from any reader. `name` is used in error messages.
    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = rdr.headers()?.iter().map(String::from).collect();
        let records = rdr.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.into(),
            headers,
            records,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn header(&self, col: usize) -> &str {
        &self.headers[col]
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Field at (`row`, `col`); a short row reads as empty.
    pub fn field(&self, row: usize, col: usize) -> &str {
        self.records[row].get(col).unwrap_or("")
    }

    /// Resolve the column for `role` in this table.
    pub fn resolve(&self, role: ColumnRole, candidates: &[&str]) -> Result<usize> {
        resolve_column(&self.headers, role, candidates, &self.name)
    }

    pub(crate) fn invalid_value(&self, row: usize, col: usize) -> MapError {
        MapError::InvalidValue {
            table: self.name.clone(),
            // 1-based data row, header excluded.
            row: row + 1,
            column: self.headers[col].clone(),
            value: self.field(row, col).to_string(),
        }
    }
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("tab") => b'\t',
        _ => b',',
    }
}
