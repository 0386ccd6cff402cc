//! Initialize, configuration and shutdown handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tracing::{debug, error, info};

use swiftlint_core::CONFIG_FILE_NAMES;

use super::code_action::FIX_ALL_KIND;
use super::commands::COMMANDS;
use crate::Orchestrator;
use crate::config::{affects_settings, settings_from_value, should_activate};
use crate::state::SharedState;

const WATCHER_REGISTRATION_ID: &str = "swiftlint-watched-files";

/// Handles the `initialize` LSP request.
pub async fn handle_initialize(
    state: &SharedState,
    orchestrator: &Orchestrator,
    params: InitializeParams,
) -> Result<InitializeResult> {
    info!("SwiftLint LSP server initializing...");

    state
        .watch_files
        .store(supports_watched_files(&params), Ordering::SeqCst);

    let folders = workspace_folders(&params);
    debug!("Workspace folders: {:?}", folders);
    orchestrator.set_workspace_folders(folders);

    if let Some(settings) = params
        .initialization_options
        .as_ref()
        .and_then(settings_from_value)
    {
        orchestrator.update_settings(settings);
    }

    let active = should_activate(&orchestrator.settings(), &orchestrator.workspace_folders());
    state.set_active(active);
    info!("SwiftLint {}", if active { "active" } else { "dormant" });

    Ok(InitializeResult {
        capabilities: ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                        include_text: Some(true),
                    })),
                    ..Default::default()
                },
            )),
            code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
                code_action_kinds: Some(vec![
                    CodeActionKind::QUICKFIX,
                    CodeActionKind::new(FIX_ALL_KIND),
                ]),
                resolve_provider: Some(false),
                work_done_progress_options: Default::default(),
            })),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
                work_done_progress_options: Default::default(),
            }),
            workspace: Some(WorkspaceServerCapabilities {
                workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                    supported: Some(true),
                    change_notifications: None,
                }),
                file_operations: None,
            }),
            ..Default::default()
        },
        server_info: Some(ServerInfo {
            name: "swiftlint-lsp".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
    })
}

/// Handles the `initialized` LSP notification.
///
/// Registers file watchers when the client supports it, then lints the
/// workspace if configured to.
pub async fn handle_initialized(state: &SharedState, orchestrator: &Arc<Orchestrator>) {
    let client = orchestrator.client().client();

    if state.watch_files.load(Ordering::SeqCst) {
        let registration = watcher_registration();
        if let Err(e) = client.register_capability(vec![registration]).await {
            error!("Failed to register file watchers: {}", e);
        }
    }

    client
        .log_message(MessageType::INFO, "SwiftLint LSP server initialized!")
        .await;

    if state.is_active() && orchestrator.settings().auto_lint_workspace {
        orchestrator.request_workspace_lint();
    }
}

/// Handles the `workspace/didChangeConfiguration` notification.
///
/// Re-evaluates activation. An active server re-lints the workspace; one
/// that became dormant clears its diagnostics.
pub async fn handle_did_change_configuration(
    state: &SharedState,
    orchestrator: &Arc<Orchestrator>,
    params: DidChangeConfigurationParams,
) {
    if !affects_settings(&params.settings) {
        debug!("Configuration change does not concern SwiftLint");
        return;
    }
    let Some(settings) = settings_from_value(&params.settings) else {
        return;
    };

    info!("SwiftLint settings changed");
    orchestrator.update_settings(settings);
    refresh_activation(state, orchestrator).await;
}

/// Recomputes whether the server is active and acts on the result.
pub(crate) async fn refresh_activation(state: &SharedState, orchestrator: &Arc<Orchestrator>) {
    let active = should_activate(&orchestrator.settings(), &orchestrator.workspace_folders());
    let was_active = state.set_active(active);

    if active {
        orchestrator.request_workspace_lint();
    } else if was_active {
        info!("SwiftLint deactivated");
        orchestrator.deactivate().await;
    }
}

/// Handles the `shutdown` LSP request.
pub async fn handle_shutdown(orchestrator: &Orchestrator) -> Result<()> {
    info!("SwiftLint LSP server shutting down...");
    orchestrator.shutdown().await;
    Ok(())
}

/// True if the client can register `workspace/didChangeWatchedFiles`
/// dynamically.
fn supports_watched_files(params: &InitializeParams) -> bool {
    params
        .capabilities
        .workspace
        .as_ref()
        .and_then(|w| w.did_change_watched_files.as_ref())
        .and_then(|c| c.dynamic_registration)
        .unwrap_or(false)
}

fn workspace_folders(params: &InitializeParams) -> Vec<PathBuf> {
    let from_folders: Vec<PathBuf> = params
        .workspace_folders
        .iter()
        .flatten()
        .filter_map(|folder| folder.uri.to_file_path().ok())
        .collect();
    if !from_folders.is_empty() {
        return from_folders;
    }

    #[allow(deprecated)]
    let root = params.root_uri.as_ref().and_then(|u| u.to_file_path().ok());
    root.into_iter().collect()
}

fn watcher_registration() -> Registration {
    let mut watchers = vec![FileSystemWatcher {
        glob_pattern: GlobPattern::String("**/*.swift".to_string()),
        kind: None,
    }];
    watchers.extend(CONFIG_FILE_NAMES.iter().map(|name| FileSystemWatcher {
        glob_pattern: GlobPattern::String(format!("**/{}", name)),
        kind: None,
    }));

    let options = DidChangeWatchedFilesRegistrationOptions { watchers };
    Registration {
        id: WATCHER_REGISTRATION_ID.to_string(),
        method: "workspace/didChangeWatchedFiles".to_string(),
        register_options: serde_json::to_value(options).ok(),
    }
}
