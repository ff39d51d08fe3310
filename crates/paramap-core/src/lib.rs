//! Land-use to parameter raster mapping.
//!
//! A land-use code grid, a classification table (code → species) and one or
//! more parameter tables (species → value per parameter) are turned into one
//! raster per parameter. Each cell holds the value of the species occupying
//! it, or [`grid::SENTINEL`] when the code or species has no entry.
pub mod config;
pub mod confirm;
pub mod error;
pub mod generator;
pub mod grid;
pub mod mapping;
pub mod pipeline;
pub mod raster;
pub mod table;
pub mod validate;

pub use config::RunConfig;
pub use confirm::{AutoConfirm, ColumnSelection, Confirm, Decision, PromptConfirm};
pub use error::{MapError, Result};
pub use generator::{generate_parameter_grid, generate_parameter_grid_with_report, MappingReport};
pub use grid::{Grid, LandUseGrid, ParameterGrid, SENTINEL};
pub use mapping::{build_code_to_species, build_species_values, CodeToSpecies, SpeciesValues};
pub use pipeline::{run, ParameterOutput, RunSummary};
pub use raster::{GeoMetadata, LandUseRaster, RasterFormat};
pub use table::{resolve_column, ColumnRole, Table};
pub use validate::validate_inputs;
