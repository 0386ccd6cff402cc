//! Document lifecycle handlers (open, change, save, close).

use std::sync::Arc;

use tower_lsp::lsp_types::*;
use tracing::{debug, error};

use crate::Orchestrator;
use crate::state::{DocumentData, SharedState};

/// Handles the `textDocument/didOpen` notification.
pub async fn handle_did_open(
    state: &SharedState,
    orchestrator: &Arc<Orchestrator>,
    params: DidOpenTextDocumentParams,
) {
    debug!("Document opened: {}", params.text_document.uri);

    let uri = params.text_document.uri;
    let version = params.text_document.version;
    match state.documents.write() {
        Ok(mut docs) => {
            docs.insert(
                uri.clone(),
                DocumentData {
                    text: params.text_document.text,
                    version,
                    dirty: false,
                },
            );
        }
        Err(e) => error!("Documents lock poisoned: {}", e),
    }

    if state.is_active() {
        orchestrator.request_lint(uri, Some(version));
    }
}

/// Handles the `textDocument/didChange` notification.
///
/// The latest edit is linted once typing pauses.
pub async fn handle_did_change(
    state: &SharedState,
    orchestrator: &Arc<Orchestrator>,
    params: DidChangeTextDocumentParams,
) {
    debug!("Document changed: {}", params.text_document.uri);

    let Some(change) = params.content_changes.into_iter().last() else {
        return;
    };
    let uri = params.text_document.uri;
    let version = params.text_document.version;

    match state.documents.write() {
        Ok(mut docs) => {
            docs.insert(
                uri.clone(),
                DocumentData {
                    text: change.text,
                    version,
                    dirty: true,
                },
            );
        }
        Err(e) => {
            error!("Documents lock poisoned: {}", e);
            return;
        }
    }

    if state.is_active() {
        orchestrator.schedule_lint(uri, Some(version));
    }
}

/// Handles the `textDocument/didSave` notification.
pub async fn handle_did_save(
    state: &SharedState,
    orchestrator: &Arc<Orchestrator>,
    params: DidSaveTextDocumentParams,
) {
    debug!("Document saved: {}", params.text_document.uri);

    let uri = params.text_document.uri;
    state.mark_saved(&uri, params.text);

    if state.is_active() {
        orchestrator.on_saved(uri);
    }
}

/// Handles the `textDocument/didClose` notification.
pub async fn handle_did_close(
    state: &SharedState,
    orchestrator: &Orchestrator,
    params: DidCloseTextDocumentParams,
) {
    debug!("Document closed: {}", params.text_document.uri);

    let uri = params.text_document.uri;
    match state.documents.write() {
        Ok(mut docs) => {
            docs.remove(&uri);
        }
        Err(e) => error!("Documents lock poisoned: {}", e),
    }

    orchestrator.on_closed(&uri);
}
