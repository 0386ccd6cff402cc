//! Fix command implementation

use std::path::PathBuf;

use miette::{IntoDiagnostic, Result};
use tracing::info;

use swiftlint_core::{LintRunner, Operation, Scope, SwiftLint};

use crate::cli::ToolArgs;
use crate::utils::{Target, create_tokio_runtime, resolve_targets};

pub fn run_fix(paths: &[PathBuf], format_code: bool, tool: &ToolArgs) -> Result<()> {
    let settings = tool.settings()?;
    let targets = resolve_targets(paths)?;
    let operation = if format_code {
        Operation::Format
    } else {
        Operation::Fix
    };

    let swiftlint = SwiftLint::default();
    let runtime = create_tokio_runtime()?;

    for target in &targets {
        let scope = match target {
            Target::File(file) => Scope::File(file.clone()),
            Target::Directory(dir) => Scope::Workspace(dir.clone()),
        };
        runtime
            .block_on(swiftlint.apply_fixes(&settings, operation, scope, &target.working_dir()))
            .into_diagnostic()?;
        info!("Fixed {}", target.path().display());
    }

    Ok(())
}
