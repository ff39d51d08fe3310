/// Parameter map generator: turns a land-use raster plus classification and
/// parameter tables into one raster per parameter.
use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use paramap_core::{run, AutoConfirm, Confirm, MapError, PromptConfirm, RunConfig, RunSummary};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "paramap",
    about = "Map species parameter tables onto a land-use raster, one output raster per parameter"
)]
struct Args {
    /// Run configuration JSON. Flags below override its fields.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Land-use raster (.tif, .tiff or .json)
    #[arg(long)]
    landuse: Option<PathBuf>,

    /// Classification table (land-use code -> species/class)
    #[arg(long)]
    classification: Option<PathBuf>,

    /// Parameter table; repeat for several
    #[arg(short, long = "template")]
    templates: Vec<PathBuf>,

    /// Output directory (created if absent)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Proceed without confirming detected columns
    #[arg(short = 'y', long)]
    auto_confirm: bool,

    /// Map only this parameter; repeat for several (default: all)
    #[arg(short, long = "parameter")]
    parameters: Vec<String>,

    /// Field delimiter for all tables (default: tab for .tsv/.tab, comma otherwise)
    #[arg(long)]
    delimiter: Option<char>,

    /// Write the run summary as JSON to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl Args {
    /// Load the config file, if any, and lay the flags over it.
    fn into_config(self) -> Result<(RunConfig, Option<PathBuf>)> {
        let mut cfg = match &self.config {
            Some(path) => RunConfig::from_json_file(path)
                .with_context(|| format!("Cannot load config {}", path.display()))?,
            None => RunConfig::default(),
        };
        if let Some(p) = self.landuse {
            cfg.landuse = p;
        }
        if let Some(p) = self.classification {
            cfg.classification = p;
        }
        if !self.templates.is_empty() {
            cfg.templates = self.templates;
        }
        if let Some(p) = self.output {
            cfg.output_dir = p;
        }
        if self.auto_confirm {
            cfg.auto_confirm = true;
        }
        if !self.parameters.is_empty() {
            cfg.parameters = Some(self.parameters);
        }
        if self.delimiter.is_some() {
            cfg.delimiter = self.delimiter;
        }
        Ok((cfg, self.summary))
    }
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let (cfg, summary_path) = Args::parse().into_config()?;

    let mut confirm: Box<dyn Confirm> = if cfg.auto_confirm {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptConfirm::new(io::stdin().lock(), io::stderr()))
    };

    let summary = match run(&cfg, confirm.as_mut()) {
        Ok(s) => s,
        Err(MapError::MissingInput(errors)) => {
            for e in &errors {
                eprintln!("  {e}");
            }
            bail!("validation failed: {} input(s) missing", errors.len());
        }
        Err(e) => return Err(e).context("parameter mapping failed"),
    };

    report(&summary);

    if let Some(path) = summary_path {
        fs::write(&path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("Write failed: {}", path.display()))?;
        info!(path = %path.display(), "summary written");
    }

    Ok(())
}

fn report(summary: &RunSummary) {
    for out in &summary.outputs {
        let r = &out.report;
        if r.is_complete() {
            info!(parameter = %out.parameter, "all cells mapped");
        } else {
            info!(
                parameter = %out.parameter,
                unset_cells = r.unset_cells,
                unmapped_codes = ?r.unmapped_codes,
                unresolved_species = ?r.unresolved_species,
                "cells left at 0.0"
            );
        }
    }
    for t in &summary.skipped_tables {
        warn!(table = %t.display(), "skipped");
    }
    info!(
        outputs = summary.outputs.len(),
        skipped = summary.skipped_tables.len(),
        "done"
    );
}
