//! SwiftLint LSP Server
//!
//! Language Server Protocol front end for SwiftLint.
//! Publishes violations as diagnostics and exposes fix/format commands.

mod config;
mod conversion;
mod debounce;
mod handler;
mod orchestrator;
mod sink;
mod state;

use std::sync::Arc;

pub use config::{affects_settings, settings_from_value, should_activate};
pub use conversion::{file_uri, rule_id, swift_document_path, to_lsp_diagnostic};
pub use debounce::{DEFAULT_DEBOUNCE_MS, DebounceTimers};
pub use handler::{
    COMMANDS, DISABLE_NEXT_LINE, FIX_ALL_KIND, FIX_DOCUMENT, FIX_WORKSPACE, FORMAT_DOCUMENT,
    FORMAT_WORKSPACE, LINT_WORKSPACE,
};
pub use orchestrator::{LintOrchestrator, failure_message};
pub use sink::{DiagnosticSink, LspClient, Notifier};

use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::info;

use swiftlint_core::SwiftLint;

use crate::state::{BackendState, SharedState};

/// The orchestrator as wired to the real tool and the editor.
pub type Orchestrator = LintOrchestrator<SwiftLint, LspClient>;

/// The LSP backend for SwiftLint.
#[derive(Clone)]
pub struct Backend {
    /// Shared state
    state: SharedState,
    orchestrator: Arc<Orchestrator>,
}

impl Backend {
    /// Creates a new backend with the given client.
    pub fn new(client: Client) -> Self {
        Self {
            state: Arc::new(BackendState::new()),
            orchestrator: Arc::new(LintOrchestrator::new(
                SwiftLint::default(),
                LspClient::new(client),
            )),
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        handler::handle_initialize(&self.state, &self.orchestrator, params).await
    }

    async fn initialized(&self, _: InitializedParams) {
        handler::handle_initialized(&self.state, &self.orchestrator).await;
    }

    async fn shutdown(&self) -> Result<()> {
        handler::handle_shutdown(&self.orchestrator).await
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        handler::handle_did_open(&self.state, &self.orchestrator, params).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        handler::handle_did_change(&self.state, &self.orchestrator, params).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        handler::handle_did_save(&self.state, &self.orchestrator, params).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        handler::handle_did_close(&self.state, &self.orchestrator, params).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        handler::handle_did_change_configuration(&self.state, &self.orchestrator, params).await;
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        handler::handle_did_change_watched_files(&self.state, &self.orchestrator, params).await;
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        handler::handle_code_action(&self.state, params).await
    }

    async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<Option<serde_json::Value>> {
        handler::handle_execute_command(&self.state, &self.orchestrator, params).await
    }
}

/// Starts the LSP server.
///
/// This function does not return unless an error occurs or the server shuts down.
pub async fn run() {
    info!("SwiftLint LSP server starting...");

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
