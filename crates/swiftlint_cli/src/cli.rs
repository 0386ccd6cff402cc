//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use swiftlint_core::Settings;

/// SwiftLint language server and one-shot runner
#[derive(Parser)]
#[command(name = "swiftlint-lsp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the LSP server on stdin/stdout
    Lsp,

    /// Lint files or directories
    Lint {
        /// Files or directories to lint (defaults to the current directory)
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        #[command(flatten)]
        tool: ToolArgs,
    },

    /// Correct violations in files or directories
    Fix {
        /// Files or directories to fix (defaults to the current directory)
        paths: Vec<PathBuf>,

        /// Also reformat the code
        #[arg(long)]
        format_code: bool,

        #[command(flatten)]
        tool: ToolArgs,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Options forwarded to the `swiftlint` executable.
#[derive(Debug, Clone, Args)]
pub struct ToolArgs {
    /// SwiftLint executable
    #[arg(long, value_name = "PATH", default_value = "swiftlint")]
    pub swiftlint_path: String,

    /// Configuration file; the first one that exists is used
    #[arg(long = "config", value_name = "FILE")]
    pub configs: Vec<PathBuf>,

    /// Toolchain identifier exported as TOOLCHAINS
    #[arg(long, value_name = "TOOLCHAIN")]
    pub toolchain: Option<String>,

    /// Extra arguments passed to SwiftLint
    #[arg(last = true, value_name = "EXTRA")]
    pub extra: Vec<String>,
}

impl ToolArgs {
    /// Builds tool settings. Configuration paths become absolute so they
    /// stay valid whatever directory the tool runs in.
    pub fn settings(&self) -> Result<Settings> {
        let config_search_paths = self
            .configs
            .iter()
            .map(|p| {
                std::path::absolute(p)
                    .into_diagnostic()
                    .map(|abs| abs.display().to_string())
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Settings {
            path: self.swiftlint_path.clone(),
            config_search_paths,
            additional_parameters: self.extra.clone(),
            toolchain_path: self.toolchain.clone().unwrap_or_default(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_lint() {
        let cli = Cli::parse_from([
            "swiftlint-lsp",
            "--verbose",
            "lint",
            "Sources",
            "--format",
            "json",
            "--swiftlint-path",
            "/opt/swiftlint",
            "--toolchain",
            "swift-6",
            "--",
            "--strict",
        ]);
        assert!(cli.verbose);

        let Commands::Lint {
            paths,
            format,
            tool,
        } = cli.command
        else {
            panic!("expected lint");
        };
        assert_eq!(paths, vec![PathBuf::from("Sources")]);
        assert_eq!(format, OutputFormat::Json);

        let settings = tool.settings().unwrap();
        assert_eq!(settings.path, "/opt/swiftlint");
        assert_eq!(settings.toolchain(), Some("swift-6"));
        assert_eq!(settings.additional_parameters, vec!["--strict"]);
    }

    #[test]
    fn test_config_paths_become_absolute() {
        let cli = Cli::parse_from(["swiftlint-lsp", "fix", "--config", "ci.swiftlint.yml"]);
        let Commands::Fix {
            format_code, tool, ..
        } = cli.command
        else {
            panic!("expected fix");
        };
        assert!(!format_code);

        let settings = tool.settings().unwrap();
        let expected = std::env::current_dir().unwrap().join("ci.swiftlint.yml");
        assert_eq!(settings.config_search_paths, vec![expected.display().to_string()]);
    }
}
