//! One-way event feed from the store coordinator.
//!
//! Every fulfilled or rejected mutation (and every rejected fetch) is
//! published as a [`StoreEvent`] on a `tokio::sync::broadcast` channel. The
//! store never depends on its subscribers: with no receivers attached the
//! send is silently discarded, and a slow receiver only lags itself.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::Task;

/// Default capacity of the event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StoreEvent {
    TaskCreated {
        task: Task,
    },
    TaskCreateFailed {
        message: String,
    },
    TaskUpdated {
        task: Task,
    },
    TaskUpdateFailed {
        message: String,
    },
    TaskDeleted {
        task_id: String,
    },
    TaskDeleteFailed {
        message: String,
    },

    SubtaskCreated {
        task_id: String,
    },
    SubtaskCreateFailed {
        message: String,
    },
    SubtaskUpdated {
        task_id: String,
        subtask_id: String,
    },
    SubtaskUpdateFailed {
        message: String,
    },
    SubtaskDeleted {
        task_id: String,
        subtask_id: String,
    },
    SubtaskDeleteFailed {
        message: String,
    },

    CommentAdded {
        task_id: String,
        subtask_id: String,
    },
    CommentAddFailed {
        message: String,
    },

    // Read failures surface too so the notification layer can show them;
    // successful fetches stay silent.
    TasksFetchFailed {
        message: String,
    },
    TaskFetchFailed {
        message: String,
    },
    SubtaskFetchFailed {
        message: String,
    },
    SummaryFetchFailed {
        message: String,
    },
}

impl StoreEvent {
    /// The transient notification text for this event, matching the
    /// dashboard's toast strings.
    pub fn toast(&self) -> String {
        match self {
            Self::TaskCreated { .. } => "Task created successfully".to_string(),
            Self::TaskUpdated { .. } => "Task updated successfully".to_string(),
            Self::TaskDeleted { .. } => "Task deleted successfully".to_string(),
            Self::SubtaskCreated { .. } => "Subtask created successfully".to_string(),
            Self::SubtaskUpdated { .. } => "Subtask updated successfully".to_string(),
            Self::SubtaskDeleted { .. } => "Subtask deleted successfully".to_string(),
            Self::CommentAdded { .. } => "Comment added successfully".to_string(),
            Self::TaskCreateFailed { message }
            | Self::TaskUpdateFailed { message }
            | Self::TaskDeleteFailed { message }
            | Self::SubtaskCreateFailed { message }
            | Self::SubtaskUpdateFailed { message }
            | Self::SubtaskDeleteFailed { message }
            | Self::CommentAddFailed { message }
            | Self::TasksFetchFailed { message }
            | Self::TaskFetchFailed { message }
            | Self::SubtaskFetchFailed { message }
            | Self::SummaryFetchFailed { message } => message.clone(),
        }
    }

    /// Whether this event reports a rejected operation.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::TaskCreateFailed { .. }
                | Self::TaskUpdateFailed { .. }
                | Self::TaskDeleteFailed { .. }
                | Self::SubtaskCreateFailed { .. }
                | Self::SubtaskUpdateFailed { .. }
                | Self::SubtaskDeleteFailed { .. }
                | Self::CommentAddFailed { .. }
                | Self::TasksFetchFailed { .. }
                | Self::TaskFetchFailed { .. }
                | Self::SubtaskFetchFailed { .. }
                | Self::SummaryFetchFailed { .. }
        )
    }
}

/// Publish an event, ignoring the no-subscribers case.
pub fn broadcast_event(tx: &broadcast::Sender<StoreEvent>, event: StoreEvent) {
    let _ = tx.send(event);
}
