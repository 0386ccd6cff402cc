//! Command-line assembly for SwiftLint invocations.

use std::path::{Path, PathBuf};

use crate::Settings;

/// What the tool should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Report violations as JSON.
    Lint,
    /// Apply correctable rules.
    Fix,
    /// Apply correctable rules and reformat.
    Format,
}

/// What the tool should operate on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// A single file.
    File(PathBuf),
    /// A workspace folder, used as the working directory.
    Workspace(PathBuf),
}

impl Scope {
    /// Directory the tool runs in for a workspace scope.
    pub fn workspace_dir(&self) -> Option<&Path> {
        match self {
            Scope::File(_) => None,
            Scope::Workspace(dir) => Some(dir),
        }
    }
}

/// A single planned invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub scope: Scope,
    pub operation: Operation,
    pub extra_args: Vec<String>,
}

impl InvocationRequest {
    pub fn new(operation: Operation, scope: Scope) -> Self {
        Self {
            scope,
            operation,
            extra_args: Vec::new(),
        }
    }

    /// Builds the argument list, resolving relative config search paths
    /// against `cwd`.
    ///
    /// Order: `lint [--fix] [--format] --quiet [--reporter json]
    /// [--config <path>] [<settings args>...] [<extra args>...] [<file>]`.
    pub fn build_args(&self, settings: &Settings, cwd: &Path) -> Vec<String> {
        let mut args = vec!["lint".to_string()];

        match self.operation {
            Operation::Lint => {}
            Operation::Fix => args.push("--fix".to_string()),
            Operation::Format => {
                args.push("--fix".to_string());
                args.push("--format".to_string());
            }
        }

        args.push("--quiet".to_string());

        if self.operation == Operation::Lint {
            args.push("--reporter".to_string());
            args.push("json".to_string());
        }

        if let Some(config) = explicit_config(&settings.config_search_paths, cwd) {
            args.push("--config".to_string());
            args.push(config.to_string_lossy().into_owned());
        }

        args.extend(settings.additional_parameters.iter().cloned());
        args.extend(self.extra_args.iter().cloned());

        if let Scope::File(path) = &self.scope {
            args.push(path.to_string_lossy().into_owned());
        }

        args
    }
}

/// Returns the first configured search path that exists on disk.
///
/// Only user-specified paths are considered: with an empty list the tool
/// falls back to its own discovery.
pub fn explicit_config(search_paths: &[String], cwd: &Path) -> Option<PathBuf> {
    search_paths
        .iter()
        .map(|p| cwd.join(p))
        .find(|candidate| candidate.exists())
}
