//! `workspace/executeCommand` handler.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::lsp_types::*;
use tracing::{debug, error, info, warn};

use swiftlint_core::Operation;

use crate::Orchestrator;
use crate::orchestrator::command_label;
use crate::sink::Notifier;
use crate::state::SharedState;

pub const LINT_WORKSPACE: &str = "swiftlint.lintWorkspace";
pub const FIX_WORKSPACE: &str = "swiftlint.fixWorkspace";
pub const FIX_DOCUMENT: &str = "swiftlint.fixDocument";
pub const FORMAT_DOCUMENT: &str = "swiftlint.formatDocument";
pub const FORMAT_WORKSPACE: &str = "swiftlint.formatWorkspace";

/// Every command this server executes.
pub const COMMANDS: &[&str] = &[
    LINT_WORKSPACE,
    FIX_WORKSPACE,
    FIX_DOCUMENT,
    FORMAT_DOCUMENT,
    FORMAT_WORKSPACE,
];

/// Handles the `workspace/executeCommand` request.
///
/// Document commands take the document URI as their first argument.
pub async fn handle_execute_command(
    state: &SharedState,
    orchestrator: &Arc<Orchestrator>,
    params: ExecuteCommandParams,
) -> Result<Option<Value>> {
    debug!("Execute command: {}", params.command);

    if !COMMANDS.contains(&params.command.as_str()) {
        return Err(Error::invalid_params(format!(
            "Unknown command: {}",
            params.command
        )));
    }
    if !state.is_active() {
        info!("SwiftLint is not active, ignoring {}", params.command);
        return Ok(None);
    }

    match params.command.as_str() {
        LINT_WORKSPACE => orchestrator.lint_workspace().await,
        FIX_WORKSPACE => orchestrator.fix_workspace(Operation::Fix).await,
        FORMAT_WORKSPACE => orchestrator.fix_workspace(Operation::Format).await,
        FIX_DOCUMENT => {
            let uri = document_argument(&params.arguments)?;
            fix_document(state, orchestrator, uri, Operation::Fix).await;
        }
        FORMAT_DOCUMENT => {
            let uri = document_argument(&params.arguments)?;
            fix_document(state, orchestrator, uri, Operation::Format).await;
        }
        _ => {}
    }

    Ok(None)
}

fn document_argument(arguments: &[Value]) -> Result<Url> {
    arguments
        .first()
        .and_then(Value::as_str)
        .and_then(|s| Url::parse(s).ok())
        .ok_or_else(|| Error::invalid_params("Expected a document URI as the first argument"))
}

/// Saves, fixes, reloads and re-lints one document.
async fn fix_document(
    state: &SharedState,
    orchestrator: &Orchestrator,
    uri: Url,
    operation: Operation,
) {
    let label = command_label(operation, false);

    if let Err(e) = state.persist_document(&uri) {
        error!("Failed to save {}: {}", uri, e);
        orchestrator
            .client()
            .show_error(format!("SwiftLint {} failed: could not save {}: {}", label, uri, e))
            .await;
        return;
    }

    let before = state.document_text(&uri);
    if !orchestrator.fix_document(&uri, operation).await {
        return;
    }

    if let Some(before) = before {
        reload_buffer(orchestrator, &uri, &before).await;
    }

    let version = state.document_version(&uri);
    orchestrator.lint_document(&uri, version).await;
}

/// Pushes the file content on disk into the open buffer if it changed.
async fn reload_buffer(orchestrator: &Orchestrator, uri: &Url, before: &str) {
    let Ok(path) = uri.to_file_path() else {
        return;
    };
    let after = match tokio::fs::read_to_string(&path).await {
        Ok(text) => text,
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            return;
        }
    };
    if after == before {
        debug!("{} unchanged", path.display());
        return;
    }

    let edit = WorkspaceEdit {
        changes: Some(HashMap::from([(
            uri.clone(),
            vec![TextEdit {
                range: full_range(before),
                new_text: after,
            }],
        )])),
        ..Default::default()
    };

    match orchestrator.client().client().apply_edit(edit).await {
        Ok(response) if !response.applied => {
            warn!(
                "Editor rejected update of {}: {}",
                uri,
                response.failure_reason.unwrap_or_default()
            );
        }
        Ok(_) => {}
        Err(e) => error!("workspace/applyEdit failed: {}", e),
    }
}

/// Range covering all of `text`.
fn full_range(text: &str) -> Range {
    let line = text.matches('\n').count() as u32;
    let last_line = text.rsplit('\n').next().unwrap_or_default();
    let character = last_line.encode_utf16().count() as u32;
    Range::new(Position::new(0, 0), Position::new(line, character))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_full_range() {
        assert_eq!(full_range(""), Range::new(Position::new(0, 0), Position::new(0, 0)));
        assert_eq!(
            full_range("let a = 1\n"),
            Range::new(Position::new(0, 0), Position::new(1, 0))
        );
        assert_eq!(
            full_range("a\nlet 🎉"),
            Range::new(Position::new(0, 0), Position::new(1, 6))
        );
    }

    #[test]
    fn test_document_argument() {
        let uri = document_argument(&[json!("file:///project/App.swift")]).unwrap();
        assert_eq!(uri.path(), "/project/App.swift");

        assert!(document_argument(&[]).is_err());
        assert!(document_argument(&[json!(42)]).is_err());
        assert!(document_argument(&[json!("not a uri")]).is_err());
    }
}
