//! Reading land-use rasters and writing parameter rasters.
//!
//! Two on-disk formats are supported, chosen by file extension:
//! GeoTIFF (`.tif`/`.tiff`) and a JSON grid document (`.json`). Output rasters
//! are written in the land-use raster's format and carry its georeferencing
//! unchanged.
pub mod geotiff;
pub mod json;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::grid::{LandUseGrid, ParameterGrid};

/// Georeferencing carried from the land-use raster to every output.
///
/// Never interpreted; written back exactly as read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixel_scale: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiepoints: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_key_directory: Option<Vec<u16>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_double_params: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_ascii_params: Option<String>,
    /// GDAL nodata value, as stored (ASCII).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodata: Option<String>,
}

/// A land-use grid together with its georeferencing.
#[derive(Debug, Clone, PartialEq)]
pub struct LandUseRaster {
    pub grid: LandUseGrid,
    pub geo: GeoMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    GeoTiff,
    Json,
}

impl RasterFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("tif" | "tiff") => Ok(RasterFormat::GeoTiff),
            Some("json") => Ok(RasterFormat::Json),
            _ => Err(MapError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::GeoTiff => "tif",
            RasterFormat::Json => "json",
        }
    }
}

/// Read a land-use raster, picking the format from the extension.
pub fn read_landuse(path: &Path) -> Result<LandUseRaster> {
    match RasterFormat::from_path(path)? {
        RasterFormat::GeoTiff => geotiff::read_landuse(path),
        RasterFormat::Json => json::read_landuse(path),
    }
}

/// Encode a parameter raster in memory. `name` is stored as the raster's item name.
pub fn encode_parameter(
    format: RasterFormat,
    name: &str,
    grid: &ParameterGrid,
    geo: &GeoMetadata,
) -> Result<Vec<u8>> {
    match format {
        RasterFormat::GeoTiff => geotiff::encode_parameter(name, grid, geo),
        RasterFormat::Json => json::encode_parameter(name, grid, geo),
    }
}

/// Encode and write a parameter raster in one go.
pub fn write_parameter(
    path: &Path,
    format: RasterFormat,
    name: &str,
    grid: &ParameterGrid,
    geo: &GeoMetadata,
) -> Result<()> {
    let bytes = encode_parameter(format, name, grid, geo)?;
    std::fs::write(path, bytes).map_err(|e| MapError::io(path, e))
}

/// Land-use codes may be stored as floats as long as they are whole numbers.
pub(crate) fn integral_code(v: f64) -> std::result::Result<i64, String> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Ok(v as i64)
    } else {
        Err(format!("land-use value {v} is not an integer code"))
    }
}

/// `<dir>/<parameter>_2D.<ext>`. Characters unsafe in file names become `_`.
pub fn output_path(dir: &Path, parameter: &str, format: RasterFormat) -> PathBuf {
    let stem: String = parameter
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') { c } else { '_' })
        .collect();
    dir.join(format!("{stem}_2D.{}", format.extension()))
}
