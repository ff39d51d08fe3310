use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

/// Everything one mapping run needs. Read once at start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Land-use raster (`.tif`, `.tiff` or `.json`).
    #[serde(default)]
    pub landuse: PathBuf,
    /// Classification table: land-use code → species/class.
    #[serde(default)]
    pub classification: PathBuf,
    /// Parameter tables: species × parameter → value.
    #[serde(default)]
    pub templates: Vec<PathBuf>,
    #[serde(default)]
    pub output_dir: PathBuf,
    /// Proceed without asking to confirm detected columns.
    #[serde(default)]
    pub auto_confirm: bool,
    /// Parameters to map. Absent: every parameter found in the templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<String>>,
    /// Field delimiter for all tables. Absent: chosen per file extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
}

impl RunConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Check that the required fields are filled in.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.landuse.as_os_str().is_empty() {
            missing.push("landuse");
        }
        if self.classification.as_os_str().is_empty() {
            missing.push("classification");
        }
        if self.templates.is_empty() {
            missing.push("templates");
        }
        if self.output_dir.as_os_str().is_empty() {
            missing.push("output_dir");
        }
        if !missing.is_empty() {
            return Err(MapError::Config(format!("missing {}", missing.join(", "))));
        }
        if let Some(d) = self.delimiter {
            if !d.is_ascii() {
                return Err(MapError::Config(format!("delimiter {d:?} is not a single ASCII character")));
            }
        }
        Ok(())
    }

    /// Delimiter as a byte, if one was configured.
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.filter(char::is_ascii).map(|c| c as u8)
    }
}
