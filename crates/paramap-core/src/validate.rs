//! Up-front input checks, run before anything is written.
use std::fs;
use std::path::Path;

use tracing::info;

/// Check that every required input exists and make sure `output_dir` exists.
///
/// `required` pairs a human-readable label with a path. Returns one message
/// per problem; an empty list means everything is in place. The output
/// directory (and its parents) is created when missing, and a failure to do
/// so is reported as a message too. Nothing here returns an error: the caller
/// decides whether a non-empty list aborts the run.
pub fn validate_inputs<P: AsRef<Path>>(required: &[(&str, P)], output_dir: &Path) -> Vec<String> {
    let mut errors = Vec::new();

    for (label, path) in required {
        let path = path.as_ref();
        if path.exists() {
            info!(input = %label, path = %path.display(), "found");
        } else {
            errors.push(format!("{label} not found: {}", path.display()));
        }
    }

    if output_dir.is_dir() {
        info!(path = %output_dir.display(), "output directory");
    } else {
        match fs::create_dir_all(output_dir) {
            Ok(()) => info!(path = %output_dir.display(), "created output directory"),
            Err(e) => errors.push(format!(
                "cannot create output directory {}: {e}",
                output_dir.display()
            )),
        }
    }

    errors
}
