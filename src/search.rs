//! Debounced search-driven list refresh.
//!
//! Rapid keystrokes must collapse into a single remote list fetch. Each
//! [`SearchDebouncer::input`] rearms a timer; only a term that survives the
//! quiescence window unchallenged is dispatched. Rearming aborts the pending
//! timer, and dropping the debouncer cancels whatever is still armed, so a
//! torn-down view can never fire a stale fetch.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::store::TaskStore;

/// Default quiescence window between the last keystroke and the fetch.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct SearchDebouncer {
    store: TaskStore,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl SearchDebouncer {
    pub fn new(store: TaskStore) -> Self {
        Self::with_delay(store, DEFAULT_DEBOUNCE)
    }

    pub fn with_delay(store: TaskStore, delay: Duration) -> Self {
        Self {
            store,
            delay,
            pending: Mutex::new(None),
        }
    }

    /// Register a new search term, restarting the quiescence window.
    ///
    /// Must be called from within a tokio runtime.
    pub fn input(&self, term: &str) {
        let store = self.store.clone();
        let term = term.to_string();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(term = %term, "search window elapsed, fetching");
            let search = if term.trim().is_empty() {
                None
            } else {
                Some(term.as_str())
            };
            // The store's own error slot and event feed carry any failure.
            let _ = store.fetch_tasks(search).await;
        });

        let mut pending = self.lock_pending();
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel any pending fetch without dispatching it.
    pub fn cancel(&self) {
        if let Some(handle) = self.lock_pending().take() {
            handle.abort();
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
