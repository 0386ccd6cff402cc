//! Error types for running SwiftLint.

use std::io;

use thiserror::Error;

/// Errors raised while executing the external tool.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The executable could not be launched (missing, not executable, ...).
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The run was cancelled before or during execution.
    #[error("process aborted")]
    Aborted,

    /// Reading the child's pipes or waiting for it failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors surfaced by lint, fix and format operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Process execution error.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// The tool exited non-zero and wrote to stderr.
    #[error("swiftlint exited with code {exit_code}: {stderr}")]
    ToolReported { exit_code: i32, stderr: String },

    /// The tool's JSON report could not be decoded.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Error {
    /// Returns true when the operation was cancelled.
    ///
    /// Cancellation comes from a newer request or from shutdown and is
    /// never reported to the user.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Process(ProcessError::Aborted))
    }

    /// Returns true when the tool could not be started at all.
    pub fn is_spawn(&self) -> bool {
        matches!(self, Error::Process(ProcessError::Spawn { .. }))
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;
