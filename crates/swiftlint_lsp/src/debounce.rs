//! Per-document debounce timers.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tower_lsp::lsp_types::Url;

/// Default debounce delay in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

struct Timer {
    id: u64,
    handle: JoinHandle<()>,
}

/// At most one live timer per document.
///
/// Scheduling a task for a document aborts the timer already pending for
/// it, so only the last event in a burst runs.
#[derive(Default)]
pub struct DebounceTimers {
    next_id: AtomicU64,
    timers: Arc<Mutex<HashMap<Url, Timer>>>,
}

impl DebounceTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` for `uri` after `delay`, replacing any pending timer.
    pub fn schedule<F>(&self, uri: Url, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let timers = Arc::clone(&self.timers);
        let key = uri.clone();

        let mut guard = self.timers.lock();
        if let Some(previous) = guard.remove(&uri) {
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut timers = timers.lock();
                if timers.get(&key).is_some_and(|t| t.id == id) {
                    timers.remove(&key);
                }
            }
            task.await;
        });

        guard.insert(uri, Timer { id, handle });
    }

    /// Aborts the pending timer for `uri`. Returns true if one was pending.
    pub fn cancel(&self, uri: &Url) -> bool {
        match self.timers.lock().remove(uri) {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Aborts every pending timer.
    pub fn cancel_all(&self) {
        for (_, timer) in self.timers.lock().drain() {
            timer.handle.abort();
        }
    }

    /// Number of timers that have not fired yet.
    pub fn pending(&self) -> usize {
        self.timers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn uri(name: &str) -> Url {
        Url::parse(&format!("file:///project/{name}")).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_last_task_runs() {
        let timers = DebounceTimers::new();
        let ran = Arc::new(Mutex::new(Vec::new()));

        for i in 1..=5 {
            let ran = Arc::clone(&ran);
            timers.schedule(uri("A.swift"), Duration::from_millis(500), async move {
                ran.lock().push(i);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(timers.pending(), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*ran.lock(), vec![5]);
        assert_eq!(timers.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_documents_are_independent() {
        let timers = DebounceTimers::new();
        let count = Arc::new(AtomicUsize::new(0));

        for name in ["A.swift", "B.swift"] {
            let count = Arc::clone(&count);
            timers.schedule(uri(name), Duration::from_millis(500), async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let timers = DebounceTimers::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        timers.schedule(uri("A.swift"), Duration::from_millis(500), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&count);
        timers.schedule(uri("B.swift"), Duration::from_millis(500), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(timers.cancel(&uri("A.swift")));
        assert!(!timers.cancel(&uri("A.swift")));
        timers.cancel_all();
        assert_eq!(timers.pending(), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
