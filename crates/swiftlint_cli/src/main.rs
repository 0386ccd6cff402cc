//! SwiftLint LSP CLI
//!
//! Serves SwiftLint diagnostics over LSP, or lints and fixes from the shell.

mod cli;
mod commands;
mod output;
mod utils;

use std::process::ExitCode;

use clap::Parser;
use miette::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::{run_fix, run_lint, run_lsp};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    match &cli.command {
        Commands::Lsp => run_lsp().map(|_| false),
        Commands::Lint {
            paths,
            format,
            tool,
        } => run_lint(paths, *format, tool),
        Commands::Fix {
            paths,
            format_code,
            tool,
        } => run_fix(paths, *format_code, tool).map(|_| false),
    }
}
