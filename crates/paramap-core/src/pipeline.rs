//! Run orchestrator: validate → load → confirm → map → write.
//!
//! Order of a run:
//!   1. Input validation (nothing is written if an input is missing)
//!   2. Land-use raster
//!   3. Classification table → code to species
//!   4. Parameter tables → one job per parameter
//!   5. Species values for every job (table errors surface here, before output)
//!   6. Grid generation and output, one file per parameter
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::confirm::{ColumnSelection, Confirm, Decision};
use crate::error::{MapError, Result};
use crate::generator::{generate_parameter_grid_with_report, MappingReport};
use crate::mapping::{
    code_to_species_with, parameter_names, species_values_with, ClassificationLayout,
    CodeToSpecies, ParameterLayout, SpeciesValues,
};
use crate::raster::{output_path, read_landuse, write_parameter, LandUseRaster, RasterFormat};
use crate::table::{Table, CLASS_COLUMNS, CODE_COLUMNS, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS};
use crate::validate::validate_inputs;

/// One written parameter raster.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterOutput {
    pub parameter: String,
    /// Parameter table the values came from.
    pub source: PathBuf,
    pub path: PathBuf,
    pub report: MappingReport,
}

/// Result of a completed run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub outputs: Vec<ParameterOutput>,
    /// Parameter tables left out at the confirmation step.
    pub skipped_tables: Vec<PathBuf>,
}

struct Job<'a> {
    parameter: String,
    source: &'a Path,
    output: PathBuf,
    values: SpeciesValues,
}

/// Run the whole mapping for `config`, asking `confirm` about every table.
pub fn run(config: &RunConfig, confirm: &mut dyn Confirm) -> Result<RunSummary> {
    config.validate()?;
    let format = RasterFormat::from_path(&config.landuse)?;

    // ── 1. Validation ───────────────────────────────────────────────────────
    let mut required: Vec<(&str, &Path)> = vec![
        ("Land-use grid", config.landuse.as_path()),
        ("Classification table", config.classification.as_path()),
    ];
    required.extend(config.templates.iter().map(|t| ("Template file", t.as_path())));
    let errors = validate_inputs(&required, &config.output_dir);
    if !errors.is_empty() {
        return Err(MapError::MissingInput(errors));
    }

    // ── 2. Land-use raster ──────────────────────────────────────────────────
    let landuse = read_landuse(&config.landuse)?;
    let (rows, cols) = landuse.grid.shape();
    info!(path = %config.landuse.display(), rows, cols, "land-use grid loaded");

    // ── 3. Classification ───────────────────────────────────────────────────
    let class_table = load_table(&config.classification, config)?;
    let class_layout = ClassificationLayout::resolve(&class_table, CODE_COLUMNS, CLASS_COLUMNS)?;
    let selection = ColumnSelection {
        context: class_table.name().to_string(),
        columns: class_layout.describe(&class_table),
    };
    if confirm.confirm(&selection, false) != Decision::Proceed {
        return Err(MapError::Cancelled);
    }
    let code_to_species = code_to_species_with(&class_table, &class_layout)?;
    info!(codes = code_to_species.len(), "land-use classes loaded");

    // ── 4. Parameter tables ─────────────────────────────────────────────────
    let mut summary = RunSummary::default();
    let mut tables: Vec<(&Path, Table, ParameterLayout)> = Vec::new();
    for path in &config.templates {
        let table = load_table(path, config)?;
        let layout = ParameterLayout::resolve(&table, ID_COLUMNS, KEY_COLUMNS, VALUE_COLUMNS)?;
        let selection = ColumnSelection {
            context: table.name().to_string(),
            columns: layout.describe(&table),
        };
        match confirm.confirm(&selection, true) {
            Decision::Proceed => tables.push((path.as_path(), table, layout)),
            Decision::Skip => {
                warn!(table = %path.display(), "parameter table skipped");
                summary.skipped_tables.push(path.clone());
            }
            Decision::Cancel => return Err(MapError::Cancelled),
        }
    }

    // ── 5. Jobs ─────────────────────────────────────────────────────────────
    let mut mapped: HashSet<String> = HashSet::new();
    let mut claimed: HashMap<PathBuf, String> = HashMap::new();
    let mut found: HashSet<String> = HashSet::new();
    let mut jobs = Vec::new();
    for (source, table, layout) in &tables {
        for parameter in parameter_names(table, layout) {
            found.insert(parameter.clone());
            if let Some(wanted) = &config.parameters {
                if !wanted.contains(&parameter) {
                    continue;
                }
            }
            if !mapped.insert(parameter.clone()) {
                warn!(%parameter, table = table.name(), "parameter already mapped from an earlier table, skipping");
                continue;
            }
            let output = output_path(&config.output_dir, &parameter, format);
            if let Some(other) = claimed.insert(output.clone(), parameter.clone()) {
                return Err(MapError::Config(format!(
                    "parameters {other:?} and {parameter:?} would both be written to {}",
                    output.display()
                )));
            }
            let values = species_values_with(table, layout, &parameter)?;
            jobs.push(Job {
                parameter,
                source: *source,
                output,
                values,
            });
        }
    }
    if let Some(wanted) = &config.parameters {
        for parameter in wanted.iter().filter(|p| !found.contains(*p)) {
            if summary.skipped_tables.is_empty() {
                warn!(%parameter, "requested parameter not found in any parameter table");
            } else {
                let skipped: Vec<String> =
                    summary.skipped_tables.iter().map(|t| t.display().to_string()).collect();
                warn!(
                    %parameter,
                    skipped = %skipped.join(", "),
                    "requested parameter not found in the confirmed parameter tables"
                );
            }
        }
    }
    if jobs.is_empty() {
        warn!("no parameters to map");
    }

    // ── 6. Generation and output ────────────────────────────────────────────
    summary.outputs = render_all(&jobs, &landuse, &code_to_species, format)?;
    Ok(summary)
}

fn load_table(path: &Path, config: &RunConfig) -> Result<Table> {
    match config.delimiter_byte() {
        Some(d) => Table::read_with_delimiter(path, d),
        None => Table::read(path),
    }
}

fn render(
    job: &Job<'_>,
    landuse: &LandUseRaster,
    code_to_species: &CodeToSpecies,
    format: RasterFormat,
) -> Result<ParameterOutput> {
    let (grid, report) = generate_parameter_grid_with_report(&landuse.grid, code_to_species, &job.values);
    write_parameter(&job.output, format, &job.parameter, &grid, &landuse.geo)?;
    info!(parameter = %job.parameter, path = %job.output.display(), "created");
    debug!(
        parameter = %job.parameter,
        unset_cells = report.unset_cells,
        unmapped_codes = report.unmapped_codes.len(),
        unresolved_species = report.unresolved_species.len(),
        "mapping report"
    );
    Ok(ParameterOutput {
        parameter: job.parameter.clone(),
        source: job.source.to_path_buf(),
        path: job.output.clone(),
        report,
    })
}

#[cfg(feature = "threading")]
fn render_all(
    jobs: &[Job<'_>],
    landuse: &LandUseRaster,
    code_to_species: &CodeToSpecies,
    format: RasterFormat,
) -> Result<Vec<ParameterOutput>> {
    use rayon::prelude::*;
    jobs.par_iter()
        .map(|job| render(job, landuse, code_to_species, format))
        .collect()
}

#[cfg(not(feature = "threading"))]
fn render_all(
    jobs: &[Job<'_>],
    landuse: &LandUseRaster,
    code_to_species: &CodeToSpecies,
    format: RasterFormat,
) -> Result<Vec<ParameterOutput>> {
    jobs.iter()
        .map(|job| render(job, landuse, code_to_species, format))
        .collect()
}
