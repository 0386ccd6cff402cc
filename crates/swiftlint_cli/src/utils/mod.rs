//! CLI utility functions

use std::path::{Path, PathBuf};

use miette::{IntoDiagnostic, Result};
use tokio::runtime::Runtime;

pub fn create_tokio_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .into_diagnostic()
}

/// A path given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    File(PathBuf),
    Directory(PathBuf),
}

impl Target {
    pub fn path(&self) -> &Path {
        match self {
            Target::File(p) | Target::Directory(p) => p,
        }
    }

    /// Directory SwiftLint runs in for this target.
    pub fn working_dir(&self) -> PathBuf {
        match self {
            Target::Directory(dir) => dir.clone(),
            Target::File(file) => file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// Resolves command-line paths to absolute targets. No paths means the
/// current directory.
pub fn resolve_targets(paths: &[PathBuf]) -> Result<Vec<Target>> {
    if paths.is_empty() {
        let cwd = std::env::current_dir().into_diagnostic()?;
        return Ok(vec![Target::Directory(cwd)]);
    }

    paths
        .iter()
        .map(|path| {
            if !path.exists() {
                return Err(miette::miette!("Path not found: {}", path.display()));
            }
            let path = std::path::absolute(path).into_diagnostic()?;
            Ok(if path.is_dir() {
                Target::Directory(path)
            } else {
                Target::File(path)
            })
        })
        .collect()
}
