//! GeoTIFF reading and writing via the `tiff` crate.
//!
//! Land-use rasters may use any integer sample type; float samples are
//! accepted when every value is integral. Parameter rasters are written as
//! single-band `Float32` with the parameter name in `ImageDescription`.
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use tracing::debug;

use super::{integral_code, GeoMetadata, LandUseRaster};
use crate::error::{MapError, Result};
use crate::grid::{Grid, ParameterGrid};

// ── GeoTIFF tag numbers ──────────────────────────────────────────────────────

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GEO_DOUBLE_PARAMS: u16 = 34736;
const GEO_ASCII_PARAMS: u16 = 34737;
const GDAL_NODATA: u16 = 42113;

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

// ── Reading ──────────────────────────────────────────────────────────────────

pub fn read_landuse(path: &Path) -> Result<LandUseRaster> {
    let file = File::open(path).map_err(|e| MapError::io(path, e))?;
    decode_landuse(BufReader::new(file), path)
}

/// Decode a land-use GeoTIFF from any seekable reader. `path` is used in errors.
pub fn decode_landuse<R: Read + Seek>(reader: R, path: &Path) -> Result<LandUseRaster> {
    let invalid = |reason: String| MapError::InvalidRaster {
        path: path.to_path_buf(),
        reason,
    };

    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let geo = read_geo_tags(&mut decoder).map_err(invalid)?;

    let codes: Vec<i64> = match decoder.read_image()? {
        DecodingResult::U8(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::U64(v) => v
            .into_iter()
            .map(|c| i64::try_from(c).map_err(|_| invalid(format!("code {c} out of range"))))
            .collect::<Result<_>>()?,
        DecodingResult::I8(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(i64::from).collect(),
        DecodingResult::I64(v) => v,
        DecodingResult::F32(v) => integral_codes(v.into_iter().map(f64::from)).map_err(invalid)?,
        DecodingResult::F64(v) => integral_codes(v.into_iter()).map_err(invalid)?,
        #[allow(unreachable_patterns)]
        _ => return Err(invalid("unsupported sample type".into())),
    };

    let grid = Grid::from_vec(width as usize, height as usize, codes)
        .map_err(|e| invalid(format!("expected a single-band raster ({e})")))?;
    debug!(path = %path.display(), width, height, "land-use raster decoded");
    Ok(LandUseRaster { grid, geo })
}

fn integral_codes(values: impl Iterator<Item = f64>) -> std::result::Result<Vec<i64>, String> {
    values.map(integral_code).collect()
}

fn read_geo_tags<R: Read + Seek>(decoder: &mut Decoder<R>) -> std::result::Result<GeoMetadata, String> {
    let text = |e: tiff::TiffError| e.to_string();
    let f64s = |d: &mut Decoder<R>, code| -> tiff::TiffResult<Option<Vec<f64>>> {
        d.find_tag(tag(code))?.map(|v| v.into_f64_vec()).transpose()
    };
    let ascii = |d: &mut Decoder<R>, code| -> tiff::TiffResult<Option<String>> {
        d.find_tag(tag(code))?.map(|v| v.into_string()).transpose()
    };

    let geo_key_directory = match decoder.find_tag(tag(GEO_KEY_DIRECTORY)).map_err(text)? {
        Some(v) => Some(geo_keys(v.into_u32_vec().map_err(text)?)?),
        None => None,
    };

    Ok(GeoMetadata {
        pixel_scale: f64s(decoder, MODEL_PIXEL_SCALE).map_err(text)?,
        tiepoints: f64s(decoder, MODEL_TIEPOINT).map_err(text)?,
        transformation: f64s(decoder, MODEL_TRANSFORMATION).map_err(text)?,
        geo_key_directory,
        geo_double_params: f64s(decoder, GEO_DOUBLE_PARAMS).map_err(text)?,
        geo_ascii_params: ascii(decoder, GEO_ASCII_PARAMS).map_err(text)?,
        nodata: ascii(decoder, GDAL_NODATA).map_err(text)?,
    })
}

/// GeoKey directory entries are SHORTs; anything wider cannot be written back unchanged.
fn geo_keys(values: Vec<u32>) -> std::result::Result<Vec<u16>, String> {
    values
        .into_iter()
        .map(|k| u16::try_from(k).map_err(|_| format!("GeoKey directory entry {k} exceeds 16 bits")))
        .collect()
}

// ── Writing ──────────────────────────────────────────────────────────────────

pub fn encode_parameter(name: &str, grid: &ParameterGrid, geo: &GeoMetadata) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf)?;
        let mut image =
            encoder.new_image::<colortype::Gray32Float>(grid.width as u32, grid.height as u32)?;

        let dir = image.encoder();
        dir.write_tag(Tag::ImageDescription, name)?;
        if let Some(v) = &geo.pixel_scale {
            dir.write_tag(tag(MODEL_PIXEL_SCALE), v.as_slice())?;
        }
        if let Some(v) = &geo.tiepoints {
            dir.write_tag(tag(MODEL_TIEPOINT), v.as_slice())?;
        }
        if let Some(v) = &geo.transformation {
            dir.write_tag(tag(MODEL_TRANSFORMATION), v.as_slice())?;
        }
        if let Some(v) = &geo.geo_key_directory {
            dir.write_tag(tag(GEO_KEY_DIRECTORY), v.as_slice())?;
        }
        if let Some(v) = &geo.geo_double_params {
            dir.write_tag(tag(GEO_DOUBLE_PARAMS), v.as_slice())?;
        }
        if let Some(s) = &geo.geo_ascii_params {
            dir.write_tag(tag(GEO_ASCII_PARAMS), s.as_str())?;
        }
        if let Some(s) = &geo.nodata {
            dir.write_tag(tag(GDAL_NODATA), s.as_str())?;
        }

        image.write_data(&grid.data)?;
    }
    Ok(buf.into_inner())
}

/// Encode a land-use grid as a single-band `UInt32` GeoTIFF.
///
/// Negative codes and codes above `u32::MAX` are rejected.
pub fn encode_landuse(raster: &LandUseRaster) -> Result<Vec<u8>> {
    let grid = &raster.grid;
    let codes: Vec<u32> = grid
        .data
        .iter()
        .map(|&c| {
            u32::try_from(c).map_err(|_| MapError::InvalidRaster {
                path: "<memory>".into(),
                reason: format!("code {c} does not fit an unsigned 32-bit sample"),
            })
        })
        .collect::<Result<_>>()?;

    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf)?;
        let mut image =
            encoder.new_image::<colortype::Gray32>(grid.width as u32, grid.height as u32)?;
        let dir = image.encoder();
        if let Some(v) = &raster.geo.pixel_scale {
            dir.write_tag(tag(MODEL_PIXEL_SCALE), v.as_slice())?;
        }
        if let Some(v) = &raster.geo.tiepoints {
            dir.write_tag(tag(MODEL_TIEPOINT), v.as_slice())?;
        }
        if let Some(v) = &raster.geo.geo_key_directory {
            dir.write_tag(tag(GEO_KEY_DIRECTORY), v.as_slice())?;
        }
        image.write_data(&codes)?;
    }
    Ok(buf.into_inner())
}
