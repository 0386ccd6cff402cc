//! Decides when SwiftLint runs and which results reach the editor.
//!
//! Every lint request takes a fresh number from a global generation counter
//! and records it as the latest generation of its document. Before a new
//! request starts, the cancellation handle of the previous one for the same
//! document is cancelled. When a run completes, its diagnostics are
//! published only if its generation is still the latest one recorded, so an
//! older run can never overwrite the results of a newer one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_lsp::lsp_types::{MessageType, Url};
use tracing::{debug, error, info};

use swiftlint_core::{
    Error, LintRunner, Operation, Scope, Settings, find_config_for_file, is_config_file,
};

use crate::conversion::{file_uri, swift_document_path};
use crate::debounce::{DEFAULT_DEBOUNCE_MS, DebounceTimers};
use crate::sink::{DiagnosticSink, Notifier};

/// Lint bookkeeping for one document.
#[derive(Debug, Default)]
struct LintState {
    /// Latest generation issued for the document.
    generation: u64,
    /// Handle of the in-flight run, if any.
    cancel: Option<CancellationToken>,
}

/// A lint run that has been admitted and numbered.
#[derive(Debug)]
struct Ticket {
    uri: Url,
    path: PathBuf,
    cwd: PathBuf,
    version: Option<i32>,
    generation: u64,
    cancel: CancellationToken,
}

/// Outcome of admitting a lint request.
#[derive(Debug)]
enum Admission {
    /// Not a lintable document, or shutting down.
    Skip,
    /// Gated out: clear whatever was published for the document.
    Clear(Url),
    Run(Ticket),
}

/// Coordinates lint, fix and format runs for the whole session.
pub struct LintOrchestrator<R, C> {
    runner: R,
    client: C,
    settings: RwLock<Settings>,
    folders: RwLock<Vec<PathBuf>>,
    generation: AtomicU64,
    lints: Mutex<HashMap<Url, LintState>>,
    debounce: DebounceTimers,
    debounce_delay: Duration,
    shutdown: CancellationToken,
    /// Parent of every run started while active; replaced on deactivation.
    epoch: Mutex<CancellationToken>,
    /// Handle of the latest workspace lint.
    workspace_run: Mutex<Option<CancellationToken>>,
}

impl<R, C> LintOrchestrator<R, C>
where
    R: LintRunner,
    C: DiagnosticSink + Notifier,
{
    pub fn new(runner: R, client: C) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            runner,
            client,
            settings: RwLock::new(Settings::default()),
            folders: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
            lints: Mutex::new(HashMap::new()),
            debounce: DebounceTimers::new(),
            debounce_delay: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            epoch: Mutex::new(shutdown.child_token()),
            workspace_run: Mutex::new(None),
            shutdown,
        }
    }

    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    pub fn update_settings(&self, settings: Settings) {
        *self.settings.write() = settings;
    }

    pub fn workspace_folders(&self) -> Vec<PathBuf> {
        self.folders.read().clone()
    }

    pub fn set_workspace_folders(&self, folders: Vec<PathBuf>) {
        *self.folders.write() = folders;
    }

    /// Returns true while a run for `uri` is in flight.
    pub fn is_running(&self, uri: &Url) -> bool {
        self.lints
            .lock()
            .get(uri)
            .is_some_and(|state| state.cancel.is_some())
    }

    /// Lints one document and publishes the result if it is still current.
    pub async fn lint_document(&self, uri: &Url, version: Option<i32>) {
        let admission = self.admit(uri, version);
        self.execute(admission).await;
    }

    /// Like [`lint_document`](Self::lint_document), but runs in the
    /// background.
    ///
    /// The request is numbered before this returns, so requests issued in
    /// order are superseded in order.
    pub fn request_lint(self: &Arc<Self>, uri: Url, version: Option<i32>) -> JoinHandle<()> {
        let admission = self.admit(&uri, version);
        let this = Arc::clone(self);
        tokio::spawn(async move { this.execute(admission).await })
    }

    /// Lints a document once edits have paused for the debounce delay.
    ///
    /// Does nothing unless lint-on-type is enabled.
    pub fn schedule_lint(self: &Arc<Self>, uri: Url, version: Option<i32>) {
        if !self.settings.read().lint_on_type || swift_document_path(&uri).is_none() {
            return;
        }

        let this = Arc::clone(self);
        let target = uri.clone();
        self.debounce.schedule(uri, self.debounce_delay, async move {
            this.lint_document(&target, version).await;
        });
    }

    /// Handles a saved document.
    ///
    /// Saving a SwiftLint configuration file re-lints the whole workspace.
    pub fn on_saved(self: &Arc<Self>, uri: Url) -> Option<JoinHandle<()>> {
        let is_config = uri.to_file_path().is_ok_and(|p| is_config_file(&p));
        if is_config {
            info!("Configuration saved, re-linting workspace");
            return Some(self.request_workspace_lint());
        }

        if self.settings.read().lint_on_save && swift_document_path(&uri).is_some() {
            return Some(self.request_lint(uri, None));
        }
        None
    }

    /// Stops pending and in-flight work for a closed document.
    ///
    /// Published diagnostics are kept.
    pub fn on_closed(&self, uri: &Url) {
        self.debounce.cancel(uri);
        self.forget(uri);
    }

    /// Clears diagnostics of deleted files.
    pub async fn on_files_deleted(&self, uris: Vec<Url>) {
        for uri in uris {
            self.debounce.cancel(&uri);
            self.forget(&uri);
            self.client.delete(uri).await;
        }
    }

    /// Like [`lint_workspace`](Self::lint_workspace), but runs in the
    /// background. Supersedes the previous workspace lint before returning.
    pub fn request_workspace_lint(self: &Arc<Self>) -> JoinHandle<()> {
        let cancel = self.begin_workspace_run();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_workspace(cancel).await })
    }

    /// Lints every workspace folder in turn.
    ///
    /// A failing folder is reported and skipped. Files are updated one by one
    /// as reported; files missing from the report keep their diagnostics.
    /// A newer workspace lint or a deactivation stops this one from
    /// publishing anything further.
    pub async fn lint_workspace(&self) {
        let cancel = self.begin_workspace_run();
        self.run_workspace(cancel).await;
    }

    fn begin_workspace_run(&self) -> CancellationToken {
        let cancel = self.epoch.lock().child_token();
        if let Some(previous) = self.workspace_run.lock().replace(cancel.clone()) {
            previous.cancel();
        }
        cancel
    }

    async fn run_workspace(&self, cancel: CancellationToken) {
        let settings = self.settings();

        for folder in self.workspace_folders() {
            if cancel.is_cancelled() {
                return;
            }

            match self
                .runner
                .lint_workspace(&settings, &folder, &cancel)
                .await
            {
                Ok(results) => {
                    let files = results.len();
                    for (file, diagnostics) in results {
                        if cancel.is_cancelled() {
                            debug!("Dropping superseded workspace results");
                            return;
                        }
                        let Some(uri) = file_uri(&folder.join(&file)) else {
                            debug!("Skipping unresolvable path {}", file.display());
                            continue;
                        };
                        self.client.set(uri, diagnostics, None).await;
                    }
                    self.log_verbose(format!(
                        "Workspace lint complete: {} file(s) with issues",
                        files
                    ))
                    .await;
                }
                Err(e) if e.is_aborted() => {
                    debug!("Workspace lint of {} cancelled", folder.display());
                }
                Err(e) => {
                    let context = format!("Error linting workspace {}", folder.display());
                    self.report_lint_failure("Lint Workspace", &context, &e, &settings)
                        .await;
                }
            }
        }
    }

    /// Runs a fix or format pass over one document.
    ///
    /// The document must already be saved to disk. Returns false if the run
    /// failed; the failure has been shown to the user.
    pub async fn fix_document(&self, uri: &Url, operation: Operation) -> bool {
        let label = command_label(operation, false);
        let Some(path) = swift_document_path(uri) else {
            debug!("{}: not a Swift file: {}", label, uri);
            return false;
        };

        let settings = self.settings();
        let cwd = self.working_dir_for(&path);
        match self
            .runner
            .apply_fixes(&settings, operation, Scope::File(path), &cwd)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                self.report_failure(label, &e, &settings).await;
                false
            }
        }
    }

    /// Runs a fix or format pass over every workspace folder, then re-lints
    /// the workspace.
    pub async fn fix_workspace(&self, operation: Operation) {
        let label = command_label(operation, true);
        let settings = self.settings();

        for folder in self.workspace_folders() {
            let scope = Scope::Workspace(folder.clone());
            if let Err(e) = self
                .runner
                .apply_fixes(&settings, operation, scope, &folder)
                .await
            {
                self.report_failure(label, &e, &settings).await;
            }
        }

        self.lint_workspace().await;
    }

    /// Stops pending and in-flight lints and clears every published
    /// diagnostic. The orchestrator stays usable.
    pub async fn deactivate(&self) {
        let previous = std::mem::replace(&mut *self.epoch.lock(), self.shutdown.child_token());
        previous.cancel();
        self.workspace_run.lock().take();
        self.debounce.cancel_all();
        let states: Vec<LintState> = self.lints.lock().drain().map(|(_, s)| s).collect();
        for cancel in states.into_iter().filter_map(|s| s.cancel) {
            cancel.cancel();
        }
        self.client.dispose().await;
    }

    /// Cancels all work, terminates running processes and clears the sink.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.debounce.cancel_all();
        self.lints.lock().clear();
        self.runner.kill_all();
        self.client.dispose().await;
    }

    fn admit(&self, uri: &Url, version: Option<i32>) -> Admission {
        if self.shutdown.is_cancelled() {
            return Admission::Skip;
        }
        let Some(path) = swift_document_path(uri) else {
            debug!("Skipping non-Swift document: {}", uri);
            return Admission::Skip;
        };

        if self.settings.read().only_enable_with_config && find_config_for_file(&path).is_none() {
            debug!("No SwiftLint configuration for {}", path.display());
            self.forget(uri);
            return Admission::Clear(uri.clone());
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = self.epoch.lock().child_token();
        {
            let mut lints = self.lints.lock();
            let state = lints.entry(uri.clone()).or_default();
            if let Some(previous) = state.cancel.replace(cancel.clone()) {
                previous.cancel();
            }
            state.generation = generation;
        }

        let cwd = self.working_dir_for(&path);
        Admission::Run(Ticket {
            uri: uri.clone(),
            path,
            cwd,
            version,
            generation,
            cancel,
        })
    }

    async fn execute(&self, admission: Admission) {
        match admission {
            Admission::Skip => {}
            Admission::Clear(uri) => self.client.delete(uri).await,
            Admission::Run(ticket) => self.run(ticket).await,
        }
    }

    async fn run(&self, ticket: Ticket) {
        debug!("Validating document: {}", ticket.uri);
        let settings = self.settings();

        let result = self
            .runner
            .lint_file(&settings, &ticket.path, &ticket.cwd, &ticket.cancel)
            .await;
        let current = self.finish(&ticket.uri, ticket.generation);

        match result {
            Ok(diagnostics) if current => {
                let count = diagnostics.len();
                self.client
                    .set(ticket.uri, diagnostics, ticket.version)
                    .await;
                self.log_verbose(format!(
                    "Linted {}: {} issue(s)",
                    ticket.path.display(),
                    count
                ))
                .await;
            }
            Ok(_) => {
                debug!(
                    "Discarding stale results for {} (generation {})",
                    ticket.uri, ticket.generation
                );
            }
            Err(e) if e.is_aborted() => {
                debug!("Lint of {} cancelled", ticket.uri);
            }
            Err(e) => {
                let context = format!("Error linting {}", ticket.path.display());
                self.report_lint_failure("Lint", &context, &e, &settings)
                    .await;
            }
        }
    }

    /// Releases the run's handle. Returns true if `generation` is still the
    /// latest one for `uri`.
    fn finish(&self, uri: &Url, generation: u64) -> bool {
        let mut lints = self.lints.lock();
        match lints.get_mut(uri) {
            Some(state) if state.generation == generation => {
                state.cancel = None;
                true
            }
            _ => false,
        }
    }

    /// Cancels the in-flight run of `uri` and drops its bookkeeping, which
    /// also makes any result still on its way stale.
    fn forget(&self, uri: &Url) {
        if let Some(state) = self.lints.lock().remove(uri)
            && let Some(cancel) = state.cancel
        {
            cancel.cancel();
        }
    }

    /// The innermost workspace folder containing `path`, else its directory.
    fn working_dir_for(&self, path: &Path) -> PathBuf {
        let folders = self.folders.read();
        folders
            .iter()
            .filter(|folder| path.starts_with(folder))
            .max_by_key(|folder| folder.components().count())
            .cloned()
            .or_else(|| path.parent().map(Path::to_path_buf))
            .unwrap_or_default()
    }

    async fn log_verbose(&self, message: String) {
        debug!("{}", message);
        if self.settings.read().verbose_logging {
            self.client
                .log(MessageType::INFO, format!("[SwiftLint] {}", message))
                .await;
        }
    }

    /// Logs a failed lint run. Only a missing tool is shown to the user;
    /// other failures usually come with valid diagnostics on the next run.
    async fn report_lint_failure(
        &self,
        label: &str,
        context: &str,
        err: &Error,
        settings: &Settings,
    ) {
        error!("{}: {}", context, err);
        self.client
            .log(
                MessageType::ERROR,
                format!("[SwiftLint ERROR] {}: {}", context, err),
            )
            .await;
        if err.is_spawn() {
            self.client
                .show_error(failure_message(label, err, settings))
                .await;
        }
    }

    async fn report_failure(&self, label: &str, err: &Error, settings: &Settings) {
        if err.is_aborted() {
            return;
        }
        error!("{} failed: {}", label, err);
        self.client
            .log(
                MessageType::ERROR,
                format!("[SwiftLint ERROR] {} failed: {}", label, err),
            )
            .await;
        self.client
            .show_error(failure_message(label, err, settings))
            .await;
    }
}

/// Builds the user-facing message for a failed operation.
pub fn failure_message(label: &str, err: &Error, settings: &Settings) -> String {
    if err.is_spawn() {
        format!(
            "SwiftLint {} failed: could not run `{}`. Is it installed and on your PATH? ({})",
            label, settings.path, err
        )
    } else {
        format!("SwiftLint {} failed: {}", label, err)
    }
}

pub(crate) fn command_label(operation: Operation, workspace: bool) -> &'static str {
    match (operation, workspace) {
        (Operation::Lint, false) => "Lint",
        (Operation::Lint, true) => "Lint Workspace",
        (Operation::Fix, false) => "Fix Document",
        (Operation::Fix, true) => "Fix Workspace",
        (Operation::Format, false) => "Format Document",
        (Operation::Format, true) => "Format Workspace",
    }
}
