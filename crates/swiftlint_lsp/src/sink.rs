//! Editor-facing output: diagnostics and user notifications.

use std::collections::HashSet;

use parking_lot::Mutex;
use tower_lsp::Client;
use tower_lsp::lsp_types::{MessageType, Url};

use swiftlint_core::Diagnostic;

use crate::conversion::to_lsp_diagnostic;

/// Store of published diagnostics, keyed by document.
#[tower_lsp::async_trait]
pub trait DiagnosticSink: Send + Sync + 'static {
    /// Replaces the diagnostics of `uri`.
    async fn set(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>);

    /// Removes every diagnostic of `uri`.
    async fn delete(&self, uri: Url);

    /// Removes everything this sink has published.
    async fn dispose(&self);
}

/// User-visible messages and log lines.
#[tower_lsp::async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn show_error(&self, message: String);

    async fn log(&self, level: MessageType, message: String);
}

/// Sink and notifier backed by the LSP client connection.
pub struct LspClient {
    client: Client,
    published: Mutex<HashSet<Url>>,
}

impl LspClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            published: Mutex::new(HashSet::new()),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[tower_lsp::async_trait]
impl DiagnosticSink for LspClient {
    async fn set(&self, uri: Url, diagnostics: Vec<Diagnostic>, version: Option<i32>) {
        let lsp_diagnostics = diagnostics.iter().map(to_lsp_diagnostic).collect();
        self.published.lock().insert(uri.clone());
        self.client
            .publish_diagnostics(uri, lsp_diagnostics, version)
            .await;
    }

    async fn delete(&self, uri: Url) {
        self.published.lock().remove(&uri);
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn dispose(&self) {
        let uris: Vec<Url> = self.published.lock().drain().collect();
        for uri in uris {
            self.client.publish_diagnostics(uri, vec![], None).await;
        }
    }
}

#[tower_lsp::async_trait]
impl Notifier for LspClient {
    async fn show_error(&self, message: String) {
        self.client.show_message(MessageType::ERROR, message).await;
    }

    async fn log(&self, level: MessageType, message: String) {
        self.client.log_message(level, message).await;
    }
}
