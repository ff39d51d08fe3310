//! JSON grid documents: `{ "name", "width", "height", "data", "geo" }`.
//!
//! Land-use `data` follows the GeoTIFF reader: integers, or floats with no
//! fractional part (`3.0`). Anything else is `InvalidRaster`.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::{integral_code, GeoMetadata, LandUseRaster};
use crate::error::{MapError, Result};
use crate::grid::{Grid, ParameterGrid};

#[derive(Deserialize)]
struct LandUseDocument {
    width: usize,
    height: usize,
    data: Vec<Number>,
    #[serde(default)]
    geo: GeoMetadata,
}

#[derive(Serialize)]
struct ParameterDocument<'a> {
    name: &'a str,
    width: usize,
    height: usize,
    data: &'a [f32],
    geo: &'a GeoMetadata,
}

pub fn read_landuse(path: &Path) -> Result<LandUseRaster> {
    let text = fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
    let doc: LandUseDocument = serde_json::from_str(&text)?;
    let invalid = |reason: String| MapError::InvalidRaster { path: path.to_path_buf(), reason };
    let codes = doc
        .data
        .iter()
        .map(|n| match n.as_i64() {
            Some(code) => Ok(code),
            None => integral_code(n.as_f64().unwrap_or(f64::NAN)),
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(invalid)?;
    let grid = Grid::from_vec(doc.width, doc.height, codes).map_err(|e| invalid(e.to_string()))?;
    Ok(LandUseRaster { grid, geo: doc.geo })
}

pub fn encode_parameter(name: &str, grid: &ParameterGrid, geo: &GeoMetadata) -> Result<Vec<u8>> {
    let doc = ParameterDocument {
        name,
        width: grid.width,
        height: grid.height,
        data: &grid.data,
        geo,
    };
    Ok(serde_json::to_vec(&doc)?)
}
