//! # swiftlint_core
//!
//! Editor-independent plumbing around the `swiftlint` executable.
//!
//! This crate provides:
//! - A process runner with cancellation and bulk teardown
//! - Argument assembly for lint/fix/format invocations
//! - Parsing of the JSON reporter output into point diagnostics
//! - Settings and configuration-file discovery
//!
//! ## Example
//!
//! ```rust,ignore
//! use swiftlint_core::{LintRunner, Settings, SwiftLint};
//! use tokio_util::sync::CancellationToken;
//!
//! let swiftlint = SwiftLint::default();
//! let diagnostics = swiftlint
//!     .lint_file(&Settings::default(), file, cwd, &CancellationToken::new())
//!     .await?;
//! ```

pub mod discovery;
mod error;
pub mod invocation;
pub mod process;
mod settings;
mod swiftlint;
pub mod violation;

pub use discovery::{CONFIG_FILE_NAMES, find_config_for_file, is_config_file, workspace_has_config};
pub use error::{Error, ProcessError, Result};
pub use invocation::{InvocationRequest, Operation, Scope};
pub use process::{ProcessOutput, ProcessRunner, RunOptions};
pub use settings::{SETTINGS_SECTION, Settings};
pub use swiftlint::{LintRunner, SwiftLint, WorkspaceDiagnostics, tool_error};
pub use violation::{
    DIAGNOSTIC_SOURCE, Diagnostic, Position, Severity, Violation, parse_violations, to_diagnostic,
};

pub use tokio_util::sync::CancellationToken;
