//! High-level SwiftLint operations.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::invocation::{InvocationRequest, Operation, Scope};
use crate::process::{ProcessOutput, ProcessRunner, RunOptions};
use crate::violation::{Diagnostic, parse_violations, to_diagnostic};
use crate::{Error, Result, Settings};

/// Diagnostics of a workspace run, keyed by the file path as reported by
/// the tool (relative to the workspace folder or absolute).
pub type WorkspaceDiagnostics = BTreeMap<PathBuf, Vec<Diagnostic>>;

/// The operations the editor integration needs from the lint tool.
pub trait LintRunner: Send + Sync + 'static {
    /// Lints one file from `cwd`.
    fn lint_file(
        &self,
        settings: &Settings,
        file: &Path,
        cwd: &Path,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<Diagnostic>>> + Send;

    /// Lints everything under `folder`.
    fn lint_workspace(
        &self,
        settings: &Settings,
        folder: &Path,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<WorkspaceDiagnostics>> + Send;

    /// Runs a fix or format pass over `scope`.
    ///
    /// Unlike linting, a non-zero exit with stderr output is a failure.
    fn apply_fixes(
        &self,
        settings: &Settings,
        operation: Operation,
        scope: Scope,
        cwd: &Path,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Terminates all running tool processes.
    fn kill_all(&self);
}

/// [`LintRunner`] backed by the real `swiftlint` executable.
#[derive(Debug, Clone, Default)]
pub struct SwiftLint {
    runner: ProcessRunner,
}

impl SwiftLint {
    pub fn new(runner: ProcessRunner) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    async fn execute(
        &self,
        settings: &Settings,
        request: &InvocationRequest,
        cwd: &Path,
        cancel: Option<&CancellationToken>,
    ) -> Result<ProcessOutput> {
        let args = request.build_args(settings, cwd);
        let options = RunOptions {
            cwd: Some(cwd.to_path_buf()),
            toolchain: settings.toolchain().map(str::to_string),
            cancel: cancel.cloned(),
            ..Default::default()
        };

        let output = self.runner.run(&settings.path, &args, options).await?;
        if let Some(err) = tool_error(&output) {
            warn!("{}", err);
        }
        Ok(output)
    }
}

impl LintRunner for SwiftLint {
    async fn lint_file(
        &self,
        settings: &Settings,
        file: &Path,
        cwd: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<Diagnostic>> {
        let request = InvocationRequest::new(Operation::Lint, Scope::File(file.to_path_buf()));
        let output = self.execute(settings, &request, cwd, Some(cancel)).await?;

        let diagnostics: Vec<_> = parse_violations(&output.stdout)
            .iter()
            .map(to_diagnostic)
            .collect();
        debug!("{}: {} violation(s)", file.display(), diagnostics.len());
        Ok(diagnostics)
    }

    async fn lint_workspace(
        &self,
        settings: &Settings,
        folder: &Path,
        cancel: &CancellationToken,
    ) -> Result<WorkspaceDiagnostics> {
        let request =
            InvocationRequest::new(Operation::Lint, Scope::Workspace(folder.to_path_buf()));
        let output = self.execute(settings, &request, folder, Some(cancel)).await?;

        let mut by_file = WorkspaceDiagnostics::new();
        for violation in parse_violations(&output.stdout) {
            by_file
                .entry(violation.file.clone())
                .or_default()
                .push(to_diagnostic(&violation));
        }
        Ok(by_file)
    }

    async fn apply_fixes(
        &self,
        settings: &Settings,
        operation: Operation,
        scope: Scope,
        cwd: &Path,
    ) -> Result<()> {
        let request = InvocationRequest::new(operation, scope);
        let output = self.execute(settings, &request, cwd, None).await?;
        match tool_error(&output) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn kill_all(&self) {
        self.runner.kill_all();
    }
}

/// Returns [`Error::ToolReported`] for a non-zero exit with stderr content.
pub fn tool_error(output: &ProcessOutput) -> Option<Error> {
    let stderr = output.stderr.trim();
    if output.exit_code != 0 && !stderr.is_empty() {
        Some(Error::ToolReported {
            exit_code: output.exit_code,
            stderr: stderr.to_string(),
        })
    } else {
        None
    }
}
