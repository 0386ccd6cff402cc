//! Watched files handler.

use std::sync::Arc;

use tower_lsp::lsp_types::*;
use tracing::{debug, info};

use swiftlint_core::is_config_file;

use super::initialize::refresh_activation;
use crate::Orchestrator;
use crate::state::SharedState;

/// Handles the `workspace/didChangeWatchedFiles` notification.
///
/// Deleted files lose their diagnostics. A created or changed
/// configuration file re-evaluates activation and re-lints the workspace.
pub async fn handle_did_change_watched_files(
    state: &SharedState,
    orchestrator: &Arc<Orchestrator>,
    params: DidChangeWatchedFilesParams,
) {
    debug!("Watched files changed: {:?}", params.changes);

    let mut deleted = Vec::new();
    let mut config_changed = false;
    for change in params.changes {
        if change.typ == FileChangeType::DELETED {
            deleted.push(change.uri.clone());
        }
        if is_config_uri(&change.uri) {
            config_changed = true;
        }
    }

    if !deleted.is_empty() {
        orchestrator.on_files_deleted(deleted).await;
    }

    if config_changed {
        info!("Configuration file changed, re-linting workspace");
        refresh_activation(state, orchestrator).await;
    }
}

fn is_config_uri(uri: &Url) -> bool {
    uri.to_file_path().is_ok_and(|path| is_config_file(&path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_config_uri() {
        let dir = tempfile::tempdir().unwrap();
        let config = Url::from_file_path(dir.path().join(".swiftlint.yml")).unwrap();
        let source = Url::from_file_path(dir.path().join("App.swift")).unwrap();

        assert!(is_config_uri(&config));
        assert!(!is_config_uri(&source));
        assert!(!is_config_uri(&Url::parse("untitled:.swiftlint.yml").unwrap()));
    }
}
