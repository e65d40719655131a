//! Task store coordinator.
//!
//! [`TaskStore`] owns the authoritative client-side task collection and
//! mediates every mutation against the remote API. The contract, for every
//! operation:
//!
//! - pending -> fulfilled/rejected; a rejection records an error message and
//!   leaves the prior collection untouched, with no partial writes;
//! - task-level mutations patch the flat collection directly (append,
//!   upsert by id, remove by id);
//! - subtask-level mutations never patch the nested structure
//!   optimistically; they trigger a list refetch and a summary refetch,
//!   fired concurrently, because the server owns the nested shape;
//! - a list fetch that has been superseded by a newer one drops its result,
//!   so the visible collection is last-writer-by-dispatch-order;
//! - no view selection may outlive the item it points at.
//!
//! Reads are snapshot clones; all mutation goes through the operation set.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::future::join;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::api::{SubtaskUpdate, TaskApi};
use crate::error::{ApiError, StoreError};
use crate::events::{EVENT_CHANNEL_CAPACITY, StoreEvent, broadcast_event};
use crate::models::{
    NewComment, StatusSummary, Subtask, SubtaskDraft, Task, TaskDraft, TaskPatch,
};

/// The task / subtask a detail view is currently focused on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub task_id: Option<String>,
    pub subtask_id: Option<String>,
}

/// Snapshot of the coordinator's state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    /// The authoritative task collection for this session.
    pub items: Vec<Task>,
    pub loading: bool,
    pub error: Option<String>,
    /// Detail-view subtask loaded by `fetch_subtask`.
    pub current_subtask: Option<Subtask>,
    pub status_summary: Vec<StatusSummary>,
    pub summary_loading: bool,
    pub summary_error: Option<String>,
    pub selection: Selection,
}

impl StoreState {
    /// Remove any selection pointing at an id absent from the collection.
    fn prune_selection(&mut self) {
        let Some(task_id) = self.selection.task_id.clone() else {
            if self.selection.subtask_id.is_some() || self.current_subtask.is_some() {
                self.selection.subtask_id = None;
                self.current_subtask = None;
            }
            return;
        };

        let Some(task) = self.items.iter().find(|t| t.id == task_id) else {
            self.selection = Selection::default();
            self.current_subtask = None;
            return;
        };

        if let Some(subtask_id) = self.selection.subtask_id.clone()
            && task.subtask(&subtask_id).is_none()
        {
            self.selection.subtask_id = None;
            self.current_subtask = None;
        }
    }

    fn upsert(&mut self, task: Task) {
        match self.items.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => self.items.push(task),
        }
    }
}

struct StoreInner {
    api: Arc<dyn TaskApi>,
    state: Mutex<StoreState>,
    /// Dispatch-order ticket counter for list fetches.
    list_generation: AtomicU64,
    events: broadcast::Sender<StoreEvent>,
}

/// Clone-able handle to the coordinator. All clones share one state.
#[derive(Clone)]
pub struct TaskStore {
    inner: Arc<StoreInner>,
}

impl TaskStore {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                api,
                state: Mutex::new(StoreState::default()),
                list_generation: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// Current state, as an immutable snapshot.
    pub fn state(&self) -> StoreState {
        self.lock().clone()
    }

    /// Subscribe to the mutation event feed.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        // State writes never panic mid-update; a poisoned guard is still
        // consistent, so recover it.
        self.inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn publish(&self, event: StoreEvent) {
        broadcast_event(&self.inner.events, event);
    }

    fn begin_list_op(&self) {
        let mut state = self.lock();
        state.loading = true;
        state.error = None;
    }

    /// Record a rejected list-affecting operation: clear the pending flag,
    /// surface the message, publish the event. The collection is untouched.
    fn fail_list_op(
        &self,
        err: ApiError,
        event: impl FnOnce(String) -> StoreEvent,
    ) -> StoreError {
        let message = err.to_string();
        {
            let mut state = self.lock();
            state.loading = false;
            state.error = Some(message.clone());
        }
        self.publish(event(message));
        StoreError::Api(err)
    }

    // ── Selection ─────────────────────────────────────────────────────

    pub fn select_task(&self, task_id: &str) {
        let mut state = self.lock();
        state.selection.task_id = Some(task_id.to_string());
        state.selection.subtask_id = None;
    }

    pub fn select_subtask(&self, task_id: &str, subtask_id: &str) {
        let mut state = self.lock();
        state.selection.task_id = Some(task_id.to_string());
        state.selection.subtask_id = Some(subtask_id.to_string());
    }

    pub fn clear_selection(&self) {
        let mut state = self.lock();
        state.selection = Selection::default();
        state.current_subtask = None;
    }

    // ── Reads ─────────────────────────────────────────────────────────

    /// Replace the collection with the server's list, optionally filtered.
    ///
    /// Each call takes a dispatch-order ticket; a response that has been
    /// superseded by a newer list fetch is dropped on the floor, success or
    /// failure alike.
    pub async fn fetch_tasks(&self, search: Option<&str>) -> Result<(), StoreError> {
        let ticket = self.inner.list_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.begin_list_op();

        let result = self.inner.api.list_tasks(search).await;

        match result {
            Ok(items) => {
                let mut state = self.lock();
                if self.inner.list_generation.load(Ordering::SeqCst) != ticket {
                    debug!(ticket, "list fetch superseded, dropping result");
                    return Ok(());
                }
                state.loading = false;
                state.items = items;
                state.prune_selection();
                Ok(())
            }
            Err(err) => {
                if self.inner.list_generation.load(Ordering::SeqCst) != ticket {
                    debug!(ticket, "superseded list fetch failed, dropping error");
                    return Ok(());
                }
                Err(self.fail_list_op(err, |message| StoreEvent::TasksFetchFailed { message }))
            }
        }
    }

    /// Load one task and upsert it into the collection by id.
    pub async fn fetch_task(&self, id: &str) -> Result<Task, StoreError> {
        self.begin_list_op();
        match self.inner.api.fetch_task(id).await {
            Ok(task) => {
                let mut state = self.lock();
                state.loading = false;
                state.upsert(task.clone());
                state.prune_selection();
                Ok(task)
            }
            Err(err) => {
                Err(self.fail_list_op(err, |message| StoreEvent::TaskFetchFailed { message }))
            }
        }
    }

    /// Load one subtask into the detail slot and focus it.
    pub async fn fetch_subtask(
        &self,
        task_id: &str,
        subtask_id: &str,
    ) -> Result<Subtask, StoreError> {
        {
            let mut state = self.lock();
            state.loading = true;
            state.error = None;
            state.current_subtask = None;
        }
        match self.inner.api.fetch_subtask(task_id, subtask_id).await {
            Ok(subtask) => {
                let mut state = self.lock();
                state.loading = false;
                state.current_subtask = Some(subtask.clone());
                state.selection.task_id = Some(task_id.to_string());
                state.selection.subtask_id = Some(subtask_id.to_string());
                Ok(subtask)
            }
            Err(err) => {
                Err(self.fail_list_op(err, |message| StoreEvent::SubtaskFetchFailed { message }))
            }
        }
    }

    /// Replace the status summary collection.
    pub async fn fetch_status_summary(&self) -> Result<(), StoreError> {
        {
            let mut state = self.lock();
            state.summary_loading = true;
            state.summary_error = None;
        }
        match self.inner.api.fetch_status_summary().await {
            Ok(summaries) => {
                let mut state = self.lock();
                state.summary_loading = false;
                state.status_summary = summaries;
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                {
                    let mut state = self.lock();
                    state.summary_loading = false;
                    state.summary_error = Some(message.clone());
                }
                self.publish(StoreEvent::SummaryFetchFailed { message });
                Err(err.into())
            }
        }
    }

    // ── Task mutations (flat shape: patch the collection directly) ────

    pub async fn create_task(&self, draft: &TaskDraft) -> Result<Task, StoreError> {
        if let Err(err) = draft.validate() {
            let message = err.to_string();
            self.publish(StoreEvent::TaskCreateFailed { message });
            return Err(err.into());
        }
        self.begin_list_op();
        match self.inner.api.create_task(draft).await {
            Ok(task) => {
                {
                    let mut state = self.lock();
                    state.loading = false;
                    state.items.push(task.clone());
                }
                self.publish(StoreEvent::TaskCreated { task: task.clone() });
                Ok(task)
            }
            Err(err) => {
                Err(self.fail_list_op(err, |message| StoreEvent::TaskCreateFailed { message }))
            }
        }
    }

    pub async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, StoreError> {
        self.begin_list_op();
        match self.inner.api.update_task(id, patch).await {
            Ok(task) => {
                {
                    let mut state = self.lock();
                    state.loading = false;
                    state.upsert(task.clone());
                    state.prune_selection();
                }
                self.publish(StoreEvent::TaskUpdated { task: task.clone() });
                Ok(task)
            }
            Err(err) => {
                Err(self.fail_list_op(err, |message| StoreEvent::TaskUpdateFailed { message }))
            }
        }
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), StoreError> {
        self.begin_list_op();
        match self.inner.api.delete_task(id).await {
            Ok(()) => {
                {
                    let mut state = self.lock();
                    state.loading = false;
                    state.items.retain(|t| t.id != id);
                    state.prune_selection();
                }
                self.publish(StoreEvent::TaskDeleted {
                    task_id: id.to_string(),
                });
                Ok(())
            }
            Err(err) => {
                Err(self.fail_list_op(err, |message| StoreEvent::TaskDeleteFailed { message }))
            }
        }
    }

    // ── Subtask mutations (nested shape: server is authoritative) ─────

    pub async fn create_subtask(
        &self,
        task_id: &str,
        draft: &SubtaskDraft,
    ) -> Result<(), StoreError> {
        if let Err(err) = draft.validate() {
            let message = err.to_string();
            self.publish(StoreEvent::SubtaskCreateFailed { message });
            return Err(err.into());
        }
        self.begin_list_op();
        match self.inner.api.create_subtask(task_id, draft).await {
            Ok(_updated_task) => {
                self.lock().loading = false;
                self.publish(StoreEvent::SubtaskCreated {
                    task_id: task_id.to_string(),
                });
                self.refresh_views().await;
                Ok(())
            }
            Err(err) => {
                Err(self.fail_list_op(err, |message| StoreEvent::SubtaskCreateFailed { message }))
            }
        }
    }

    pub async fn update_subtask(
        &self,
        task_id: &str,
        subtask_id: &str,
        update: SubtaskUpdate,
    ) -> Result<(), StoreError> {
        self.begin_list_op();
        match self.inner.api.update_subtask(task_id, subtask_id, update).await {
            Ok(()) => {
                self.lock().loading = false;
                self.publish(StoreEvent::SubtaskUpdated {
                    task_id: task_id.to_string(),
                    subtask_id: subtask_id.to_string(),
                });
                self.refresh_views().await;
                Ok(())
            }
            Err(err) => {
                Err(self.fail_list_op(err, |message| StoreEvent::SubtaskUpdateFailed { message }))
            }
        }
    }

    pub async fn delete_subtask(&self, task_id: &str, subtask_id: &str) -> Result<(), StoreError> {
        self.begin_list_op();
        match self.inner.api.delete_subtask(task_id, subtask_id).await {
            Ok(()) => {
                {
                    let mut state = self.lock();
                    state.loading = false;
                    // Deselect now; the view must never see the dangling id
                    // while the refetch is in flight.
                    if state.selection.task_id.as_deref() == Some(task_id)
                        && state.selection.subtask_id.as_deref() == Some(subtask_id)
                    {
                        state.selection.subtask_id = None;
                        state.current_subtask = None;
                    }
                }
                self.publish(StoreEvent::SubtaskDeleted {
                    task_id: task_id.to_string(),
                    subtask_id: subtask_id.to_string(),
                });
                self.refresh_views().await;
                Ok(())
            }
            Err(err) => {
                Err(self.fail_list_op(err, |message| StoreEvent::SubtaskDeleteFailed { message }))
            }
        }
    }

    // ── Comments ──────────────────────────────────────────────────────

    /// Append a comment remotely. No local state changes; the caller decides
    /// when to refresh the thread.
    pub async fn add_comment(
        &self,
        task_id: &str,
        subtask_id: &str,
        comment: &NewComment,
    ) -> Result<(), StoreError> {
        match self.inner.api.add_comment(task_id, subtask_id, comment).await {
            Ok(()) => {
                self.publish(StoreEvent::CommentAdded {
                    task_id: task_id.to_string(),
                    subtask_id: subtask_id.to_string(),
                });
                Ok(())
            }
            Err(err) => {
                let message = err.to_string();
                self.publish(StoreEvent::CommentAddFailed { message });
                Err(err.into())
            }
        }
    }

    /// Refetch the list and the summary after a subtask-level mutation.
    ///
    /// The two fetches run concurrently with no mutual ordering guarantee.
    /// Their failures surface through their own error slots and events; the
    /// mutation that triggered the refresh has already succeeded.
    async fn refresh_views(&self) {
        let (list, summary) = join(self.fetch_tasks(None), self.fetch_status_summary()).await;
        if let Err(err) = list {
            warn!("task list refresh after mutation failed: {}", err);
        }
        if let Err(err) = summary {
            warn!("status summary refresh after mutation failed: {}", err);
        }
    }
}
