//! LSP Backend state management.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tower_lsp::lsp_types::Url;
use tracing::{debug, error};

/// Open buffer as last reported by the editor.
#[derive(Debug, Clone)]
pub(crate) struct DocumentData {
    pub text: String,
    pub version: i32,
    /// True when the buffer has edits that are not on disk yet.
    pub dirty: bool,
}

/// Shared backend state.
pub(crate) struct BackendState {
    /// Document contents cache.
    pub documents: RwLock<HashMap<Url, DocumentData>>,
    /// Whether linting is enabled for this session.
    pub active: AtomicBool,
    /// Whether the client accepts dynamic file watcher registration.
    pub watch_files: AtomicBool,
}

impl fmt::Debug for BackendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendState")
            .field("documents", &"<HashMap<Url, DocumentData>>")
            .field("active", &self.active)
            .field("watch_files", &self.watch_files)
            .finish()
    }
}

impl BackendState {
    /// Creates a new empty state.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            active: AtomicBool::new(false),
            watch_files: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Records the activation state. Returns the previous one.
    pub fn set_active(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::SeqCst)
    }

    pub fn document(&self, uri: &Url) -> Option<DocumentData> {
        match self.documents.read() {
            Ok(docs) => docs.get(uri).cloned(),
            Err(e) => {
                error!("Documents lock poisoned: {}", e);
                None
            }
        }
    }

    pub fn document_text(&self, uri: &Url) -> Option<String> {
        self.document(uri).map(|doc| doc.text)
    }

    /// Latest version the editor reported for `uri`.
    pub fn document_version(&self, uri: &Url) -> Option<i32> {
        self.document(uri).map(|doc| doc.version)
    }

    /// Marks the buffer of `uri` as matching the file on disk.
    pub fn mark_saved(&self, uri: &Url, text: Option<String>) {
        match self.documents.write() {
            Ok(mut docs) => {
                if let Some(doc) = docs.get_mut(uri) {
                    if let Some(text) = text {
                        doc.text = text;
                    }
                    doc.dirty = false;
                }
            }
            Err(e) => error!("Documents lock poisoned: {}", e),
        }
    }

    /// Writes the buffer of `uri` to disk if it has unsaved edits.
    ///
    /// Returns true if a write happened.
    pub fn persist_document(&self, uri: &Url) -> io::Result<bool> {
        let Some(doc) = self.document(uri).filter(|doc| doc.dirty) else {
            return Ok(false);
        };
        let path = uri
            .to_file_path()
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "not a file URI"))?;

        debug!("Saving unsaved buffer to {}", path.display());
        std::fs::write(&path, &doc.text)?;
        self.mark_saved(uri, None);
        Ok(true)
    }
}

impl Default for BackendState {
    fn default() -> Self {
        Self::new()
    }
}

/// Type alias for shared state.
pub type SharedState = Arc<BackendState>;
