//! Pure progress aggregation over subtask collections.
//!
//! Everything here is referentially transparent and safe to call on every
//! render: derive a task's completion percentage and coarse status, count
//! subtasks per status bucket, and roll per-task summaries up into
//! dashboard-wide totals.

use serde::{Deserialize, Serialize};

use crate::models::{StatusSummary, Subtask, SubtaskStatus, Task};

/// Derived completion state of a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Completion percentage, 0..=100.
    pub percent: u8,
    /// Coarse classification using the same four buckets as subtasks.
    pub status: SubtaskStatus,
}

/// Subtask counts partitioned by status bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub completed: u32,
    pub in_progress: u32,
    pub delayed: u32,
    pub not_started: u32,
}

impl StatusCounts {
    pub fn total(&self) -> u32 {
        self.completed + self.in_progress + self.delayed + self.not_started
    }
}

/// Dashboard-wide rollup over all tasks' summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardProgress {
    pub counts: StatusCounts,
    /// `round(completed / total * 100)` over the grand totals, 0 when empty.
    pub percent: u8,
}

/// Integer `round(completed / total * 100)`, half-up (ties away from zero).
///
/// `round(c/t * 100)` as `floor((200c + t) / 2t)`, avoiding float drift at
/// exact .5 boundaries. Returns 0 for an empty collection.
pub fn round_percent(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed);
    let total = u64::from(total);
    ((200 * completed + total) / (2 * total)) as u8
}

/// Count subtasks per status bucket.
pub fn status_counts(subtasks: &[Subtask]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for subtask in subtasks {
        match subtask.status {
            SubtaskStatus::Completed => counts.completed += 1,
            SubtaskStatus::InProgress => counts.in_progress += 1,
            SubtaskStatus::Delayed => counts.delayed += 1,
            SubtaskStatus::NotStarted => counts.not_started += 1,
        }
    }
    counts
}

/// Derive a task's completion percentage and status from its subtasks.
///
/// Status priority: no subtasks or none completed -> not started; all
/// completed -> completed; any delayed -> delayed; otherwise in progress.
/// Full completion wins over a stale delayed flag, and "delayed" only
/// surfaces once partial progress exists.
pub fn task_progress(subtasks: &[Subtask]) -> TaskProgress {
    if subtasks.is_empty() {
        return TaskProgress {
            percent: 0,
            status: SubtaskStatus::NotStarted,
        };
    }

    let total = subtasks.len() as u32;
    let counts = status_counts(subtasks);
    let percent = round_percent(counts.completed, total);

    let status = if counts.completed == 0 {
        SubtaskStatus::NotStarted
    } else if counts.completed == total {
        SubtaskStatus::Completed
    } else if counts.delayed > 0 {
        SubtaskStatus::Delayed
    } else {
        SubtaskStatus::InProgress
    };

    TaskProgress { percent, status }
}

/// Recompute a task's [`StatusSummary`] client-side.
///
/// Produces the same shape as `GET /tasks/status-summary` so views can
/// render from either source.
pub fn summarize_task(task: &Task) -> StatusSummary {
    let counts = status_counts(&task.subtasks);
    StatusSummary {
        task_id: task.id.clone(),
        title: task.title.clone(),
        total_subtasks: counts.total(),
        completed_subtasks: counts.completed,
        in_progress_subtasks: counts.in_progress,
        delayed_subtasks: counts.delayed,
        not_started_subtasks: counts.not_started,
    }
}

/// Roll per-task summaries up into dashboard totals.
///
/// The overall percentage applies the rounding rule to the summed counts,
/// not to an average of per-task percentages: a task with one subtask
/// weighs less than a task with ten.
pub fn overall_progress(summaries: &[StatusSummary]) -> DashboardProgress {
    let mut counts = StatusCounts::default();
    let mut total = 0u32;
    for summary in summaries {
        total += summary.total_subtasks;
        counts.completed += summary.completed_subtasks;
        counts.in_progress += summary.in_progress_subtasks;
        counts.delayed += summary.delayed_subtasks;
        counts.not_started += summary.not_started_subtasks;
    }

    DashboardProgress {
        counts,
        percent: round_percent(counts.completed, total),
    }
}
