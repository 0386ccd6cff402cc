//! Output formatting module

mod json;
mod text;

use std::path::PathBuf;

use miette::Result;
use swiftlint_core::{Diagnostic, Severity};

use crate::cli::OutputFormat;

/// Diagnostics found in one file.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

impl FileReport {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Prints `reports`. Returns true if any error-severity violation was found.
pub fn output_results(reports: &[FileReport], format: OutputFormat) -> Result<bool> {
    let has_errors = reports.iter().any(FileReport::has_errors);

    match format {
        OutputFormat::Json => json::output_json(reports)?,
        OutputFormat::Text => text::output_text(reports),
    }

    Ok(has_errors)
}
