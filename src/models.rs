use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DraftError;

/// Worker reference as the backend stores it on tasks and subtasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignee {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// The four canonical subtask states.
///
/// The backend stores these as lowercase space-separated strings
/// ("not started", "in progress", "delayed", "completed"). Decoding is
/// case-insensitive; anything outside the four buckets is rejected at the
/// boundary so raw strings never travel further into the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubtaskStatus {
    NotStarted,
    InProgress,
    Delayed,
    Completed,
}

impl SubtaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::InProgress => "in progress",
            Self::Delayed => "delayed",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SubtaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubtaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "not started" => Ok(Self::NotStarted),
            "in progress" => Ok(Self::InProgress),
            "delayed" => Ok(Self::Delayed),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid subtask status: {}", s)),
        }
    }
}

impl Serialize for SubtaskStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubtaskStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Top-level work phase. Progress is always derived from `subtasks`,
/// never stored as an independent field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub project_name: String,
    pub location: String,
    pub category: String,
    pub assigned_to: Assignee,
    pub priority: Priority,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    pub fn subtask(&self, subtask_id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }
}

/// Leaf work item, exclusively owned by its parent task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub project_name: String,
    pub location: String,
    pub category: String,
    pub assigned_to: Assignee,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: SubtaskStatus,
    #[serde(default)]
    pub delay: Option<String>,
    #[serde(default)]
    pub reason_for_delay: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub material_usages: Vec<MaterialUsage>,
    #[serde(default)]
    pub man_power_usages: Vec<ManPowerUsage>,
    #[serde(default)]
    pub machinery_usages: Vec<MachineryUsage>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialUsage {
    pub material_used: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManPowerUsage {
    pub worker_name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineryUsage {
    pub machine_name: String,
    pub description: String,
}

/// A comment on a subtask. Append-only, ordered by creation time ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub employee_id: String,
    pub sender_name: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Per-task read model served by `GET /tasks/status-summary`.
///
/// Never independently mutated; always a projection of current subtask
/// state. `progress::summarize_task` recomputes the same shape client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    #[serde(rename = "_id", alias = "id")]
    pub task_id: String,
    pub title: String,
    #[serde(rename = "totalSubtasks")]
    pub total_subtasks: u32,
    #[serde(rename = "totalCompletedSubtasks")]
    pub completed_subtasks: u32,
    #[serde(rename = "inprogressSubtasks")]
    pub in_progress_subtasks: u32,
    #[serde(rename = "delayedSubtasks")]
    pub delayed_subtasks: u32,
    #[serde(rename = "notStartedSubtasks")]
    pub not_started_subtasks: u32,
}

// ── Drafts and patches ────────────────────────────────────────────────

/// Payload for `POST /tasks`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    pub title: String,
    pub project_name: String,
    pub location: String,
    pub category: String,
    pub assigned_to: Assignee,
    pub priority: Priority,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl TaskDraft {
    /// Check the invariants the backend does not enforce: a non-empty
    /// title and `start_date <= end_date`.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::EmptyTitle);
        }
        if self.start_date > self.end_date {
            return Err(DraftError::DateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        Ok(())
    }
}

/// Payload for `POST /tasks/:id/subtasks`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskDraft {
    pub title: String,
    pub project_name: String,
    pub location: String,
    pub category: String,
    pub assigned_to: Assignee,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: SubtaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_for_delay: Option<String>,
    pub material_usages: Vec<MaterialUsage>,
    pub man_power_usages: Vec<ManPowerUsage>,
    pub machinery_usages: Vec<MachineryUsage>,
}

impl SubtaskDraft {
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.title.trim().is_empty() {
            return Err(DraftError::EmptyTitle);
        }
        if self.start_date > self.due_date {
            return Err(DraftError::DateRange {
                start: self.start_date,
                end: self.due_date,
            });
        }
        Ok(())
    }
}

/// Partial update for a task. Distinct from [`SubtaskPatch`] so a
/// subtask-only field can never leak into a task update (or vice versa).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Assignee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

/// Partial update for a subtask. Usage lists are replaced wholesale when
/// present; there is no in-place list mutation.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Assignee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubtaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_for_delay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_usages: Option<Vec<MaterialUsage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub man_power_usages: Option<Vec<ManPowerUsage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machinery_usages: Option<Vec<MachineryUsage>>,
}

/// Payload for `POST /tasks/:id/subtasks/:subId/comments`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub message: String,
    pub employee_id: String,
    pub sender_name: String,
}
