use std::path::PathBuf;

use thiserror::Error;

use crate::table::ColumnRole;

/// Every failure the mapper can report.
///
/// An unresolved code or species is not represented here: those cells keep the
/// sentinel value and are only counted in [`crate::generator::MappingReport`].
#[derive(Debug, Error)]
pub enum MapError {
    #[error("{} input(s) missing:\n  {}", .0.len(), .0.join("\n  "))]
    MissingInput(Vec<String>),

    #[error("{table}: no {role} column found (accepted, case-insensitive: {candidates})")]
    MissingColumn {
        table: String,
        role: ColumnRole,
        candidates: String,
    },

    #[error("{table}, row {row}: cannot parse {column} value {value:?}")]
    InvalidValue {
        table: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("grid of {width}x{height} cells cannot hold {len} values")]
    ShapeMismatch { width: usize, height: usize, len: usize },

    #[error("{}: {reason}", .path.display())]
    InvalidRaster { path: PathBuf, reason: String },

    #[error("unsupported grid format: {} (expected .tif, .tiff or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("operation cancelled by user")]
    Cancelled,

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T, E = MapError> = std::result::Result<T, E>;
