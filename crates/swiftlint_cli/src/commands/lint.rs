//! Lint command implementation

use std::path::PathBuf;

use miette::{IntoDiagnostic, Result};
use tracing::{debug, info};

use swiftlint_core::{CancellationToken, LintRunner, Settings, SwiftLint};

use crate::cli::{OutputFormat, ToolArgs};
use crate::output::{FileReport, output_results};
use crate::utils::{Target, create_tokio_runtime, resolve_targets};

pub fn run_lint(paths: &[PathBuf], format: OutputFormat, tool: &ToolArgs) -> Result<bool> {
    let settings = tool.settings()?;
    let targets = resolve_targets(paths)?;

    let runtime = create_tokio_runtime()?;
    let reports = runtime.block_on(lint_targets(&settings, &targets))?;

    info!(
        "Linted {} target(s), {} file(s) with issues",
        targets.len(),
        reports.len()
    );
    output_results(&reports, format)
}

async fn lint_targets(settings: &Settings, targets: &[Target]) -> Result<Vec<FileReport>> {
    let swiftlint = SwiftLint::default();
    let cancel = CancellationToken::new();
    let mut reports = Vec::new();

    for target in targets {
        debug!("Linting {}", target.path().display());
        match target {
            Target::File(file) => {
                let diagnostics = swiftlint
                    .lint_file(settings, file, &target.working_dir(), &cancel)
                    .await
                    .into_diagnostic()?;
                reports.push(FileReport {
                    path: file.clone(),
                    diagnostics,
                });
            }
            Target::Directory(dir) => {
                let results = swiftlint
                    .lint_workspace(settings, dir, &cancel)
                    .await
                    .into_diagnostic()?;
                reports.extend(results.into_iter().map(|(file, diagnostics)| FileReport {
                    path: dir.join(file),
                    diagnostics,
                }));
            }
        }
    }

    Ok(reports)
}
