//! Confirmation of detected table columns before a table is used.
//!
//! The pipeline asks a [`Confirm`] implementation about every table it is
//! about to map. [`AutoConfirm`] always proceeds; [`PromptConfirm`] asks on a
//! line-oriented terminal.
use std::io::{BufRead, Write};

use tracing::{info, warn};

/// Resolved columns of one table, shown to whoever confirms them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    /// Usually the table's file name.
    pub context: String,
    /// `(label, header)` pairs.
    pub columns: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    /// Leave this table out and carry on with the rest.
    Skip,
    /// Abort the whole run.
    Cancel,
}

pub trait Confirm {
    /// `multi_files` is true when the table is one of several that can be
    /// skipped individually; a refusal then skips rather than cancels.
    fn confirm(&mut self, selection: &ColumnSelection, multi_files: bool) -> Decision;
}

/// Proceeds without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, selection: &ColumnSelection, _multi_files: bool) -> Decision {
        for (label, header) in &selection.columns {
            info!(table = %selection.context, "{label}: {header}");
        }
        info!(table = %selection.context, "columns auto-confirmed");
        Decision::Proceed
    }
}

/// Prints the selection to `output` and reads one answer line from `input`.
///
/// `y`/`yes` proceeds. `n`/`no` skips the table when several are being
/// processed and cancels otherwise. Anything else, including end of input
/// and a failed read or write, skips.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, selection: &ColumnSelection, multi_files: bool) -> std::io::Result<String> {
        writeln!(self.output, "\nDetected columns in {}:", selection.context)?;
        for (label, header) in &selection.columns {
            writeln!(self.output, "  {label:25}: {header}")?;
        }
        let refuse = if multi_files { "skip this file" } else { "cancel" };
        writeln!(self.output, "Continue with these columns? [yes/no, no = {refuse}]")?;
        write!(self.output, ">>> ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_ascii_lowercase())
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, selection: &ColumnSelection, multi_files: bool) -> Decision {
        let answer = match self.ask(selection, multi_files) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(table = %selection.context, error = %e, "cannot read confirmation, skipping table");
                return Decision::Skip;
            }
        };
        match answer.as_str() {
            "y" | "yes" => Decision::Proceed,
            "n" | "no" if multi_files => Decision::Skip,
            "n" | "no" => Decision::Cancel,
            _ => Decision::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection() -> ColumnSelection {
        ColumnSelection {
            context: "vegetation.csv".into(),
            columns: vec![("Species ID column".into(), "SpeciesID".into())],
        }
    }

    fn answer(input: &str, multi_files: bool) -> (Decision, String) {
        let mut out = Vec::new();
        let d = PromptConfirm::new(input.as_bytes(), &mut out).confirm(&selection(), multi_files);
        (d, String::from_utf8(out).unwrap())
    }

    #[test]
    fn yes_proceeds() {
        assert_eq!(answer("yes\n", true).0, Decision::Proceed);
        assert_eq!(answer(" Y \n", false).0, Decision::Proceed);
    }

    #[test]
    fn no_skips_or_cancels_depending_on_file_count() {
        assert_eq!(answer("no\n", true).0, Decision::Skip);
        assert_eq!(answer("n\n", false).0, Decision::Cancel);
    }

    #[test]
    fn anything_else_skips() {
        assert_eq!(answer("maybe\n", false).0, Decision::Skip);
        assert_eq!(answer("", true).0, Decision::Skip);
    }

    struct Broken;

    impl std::io::Read for Broken {
        fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "terminal closed"))
        }
    }

    #[test]
    fn unreadable_input_skips_even_the_classification() {
        let mut out = Vec::new();
        let input = std::io::BufReader::new(Broken);
        assert_eq!(PromptConfirm::new(input, &mut out).confirm(&selection(), false), Decision::Skip);
        assert!(String::from_utf8(out).unwrap().contains("vegetation.csv"));
    }

    #[test]
    fn prompt_lists_columns() {
        let (_, printed) = answer("y\n", true);
        assert!(printed.contains("vegetation.csv"));
        assert!(printed.contains("SpeciesID"));
        assert!(printed.contains("skip this file"));
    }

    #[test]
    fn auto_confirm_always_proceeds() {
        assert_eq!(AutoConfirm.confirm(&selection(), false), Decision::Proceed);
    }
}
