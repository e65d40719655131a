//! Remote task API client.
//!
//! [`TaskApi`] is the seam between the store coordinator and the REST
//! backend; [`HttpTaskApi`] is the production implementation. Tests swap in
//! an in-memory double, so nothing above this module touches the network.
//!
//! Every non-2xx response is expected to carry `{"error": "..."}`; when the
//! body has no usable message the per-operation fallback string is surfaced
//! instead.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;
use crate::models::{
    NewComment, StatusSummary, Subtask, SubtaskDraft, SubtaskPatch, Task, TaskDraft, TaskPatch,
};

/// A new binary attachment accompanying a subtask update.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Request shape for `PUT /tasks/:id/subtasks/:subId`.
///
/// Plain field edits go as a JSON body; an update carrying new image
/// attachments goes as multipart form data with the patch in a `data` part.
/// Construct via [`SubtaskUpdate::json`] or [`SubtaskUpdate::with_images`];
/// the shape is decided by whether attachments exist, nowhere else.
#[derive(Debug, Clone)]
pub enum SubtaskUpdate {
    Json(SubtaskPatch),
    Multipart {
        patch: SubtaskPatch,
        images: Vec<ImageAttachment>,
    },
}

impl SubtaskUpdate {
    pub fn json(patch: SubtaskPatch) -> Self {
        Self::Json(patch)
    }

    pub fn with_images(patch: SubtaskPatch, images: Vec<ImageAttachment>) -> Self {
        if images.is_empty() {
            Self::Json(patch)
        } else {
            Self::Multipart { patch, images }
        }
    }

    pub fn has_attachments(&self) -> bool {
        matches!(self, Self::Multipart { .. })
    }
}

/// The remote CRUD surface the store coordinator drives.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, search: Option<&str>) -> Result<Vec<Task>, ApiError>;
    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError>;
    async fn fetch_task(&self, id: &str) -> Result<Task, ApiError>;
    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError>;
    async fn delete_task(&self, id: &str) -> Result<(), ApiError>;

    /// Returns the updated parent task; the coordinator refetches anyway and
    /// ignores it, but the wire contract is kept typed.
    async fn create_subtask(&self, task_id: &str, draft: &SubtaskDraft) -> Result<Task, ApiError>;
    async fn fetch_subtask(&self, task_id: &str, subtask_id: &str) -> Result<Subtask, ApiError>;
    /// The response body varies by backend version (updated subtask or whole
    /// task) and is discarded; the coordinator refetches.
    async fn update_subtask(
        &self,
        task_id: &str,
        subtask_id: &str,
        update: SubtaskUpdate,
    ) -> Result<(), ApiError>;
    async fn delete_subtask(&self, task_id: &str, subtask_id: &str) -> Result<(), ApiError>;

    async fn fetch_status_summary(&self) -> Result<Vec<StatusSummary>, ApiError>;
    async fn add_comment(
        &self,
        task_id: &str,
        subtask_id: &str,
        comment: &NewComment,
    ) -> Result<(), ApiError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// reqwest-backed [`TaskApi`] implementation.
#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTaskApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client with default settings against an explicit base URL. Handy for
    /// tests pointing at a local mock server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.base_url)
    }

    fn task_url(&self, id: &str) -> String {
        format!("{}/tasks/{}", self.base_url, id)
    }

    fn subtask_url(&self, task_id: &str, subtask_id: &str) -> String {
        format!("{}/tasks/{}/subtasks/{}", self.base_url, task_id, subtask_id)
    }

    /// Send a request and decode a JSON response body.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(format!("{}: malformed response ({})", fallback, e)))
    }

    /// Send a request where only the status matters; the body is discarded.
    async fn send_unit(&self, request: reqwest::RequestBuilder) -> Result<(), ApiError> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("Network error: {}", e)))?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::rejection(response).await)
        }
    }

    /// Turn a non-2xx response into [`ApiError::Rejected`], preferring the
    /// server's `error` field. The caller substitutes the fallback message.
    async fn rejection(response: reqwest::Response) -> ApiError {
        let status = response.status().as_u16();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error);
        debug!(status, ?message, "remote call rejected");
        ApiError::Rejected {
            status,
            message: message.unwrap_or_default(),
        }
    }

    /// Fill in the operation's fallback message when the server gave none.
    fn with_fallback(err: ApiError, fallback: &str) -> ApiError {
        match err {
            ApiError::Rejected { status, message } if message.is_empty() => ApiError::Rejected {
                status,
                message: fallback.to_string(),
            },
            other => other,
        }
    }

    fn multipart_form(
        patch: &SubtaskPatch,
        images: &[ImageAttachment],
    ) -> Result<Form, ApiError> {
        let data = serde_json::to_string(patch)
            .map_err(|e| ApiError::Decode(format!("Failed to encode subtask patch: {}", e)))?;
        let mut form = Form::new().text("data", data);
        for image in images {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)
                .map_err(|e| {
                    ApiError::Transport(format!(
                        "Invalid attachment {}: {}",
                        image.file_name, e
                    ))
                })?;
            form = form.part("images", part);
        }
        Ok(form)
    }
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list_tasks(&self, search: Option<&str>) -> Result<Vec<Task>, ApiError> {
        let mut request = self.client.get(self.tasks_url());
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            request = request.query(&[("search", term)]);
        }
        self.send_json(request, "Failed to fetch tasks")
            .await
            .map_err(|e| Self::with_fallback(e, "Failed to fetch tasks"))
    }

    async fn create_task(&self, draft: &TaskDraft) -> Result<Task, ApiError> {
        let request = self.client.post(self.tasks_url()).json(draft);
        self.send_json(request, "Failed to create task")
            .await
            .map_err(|e| Self::with_fallback(e, "Failed to create task"))
    }

    async fn fetch_task(&self, id: &str) -> Result<Task, ApiError> {
        let request = self.client.get(self.task_url(id));
        self.send_json(request, "Failed to fetch task")
            .await
            .map_err(|e| Self::with_fallback(e, "Failed to fetch task"))
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<Task, ApiError> {
        let request = self.client.put(self.task_url(id)).json(patch);
        self.send_json(request, "Failed to update task")
            .await
            .map_err(|e| Self::with_fallback(e, "Failed to update task"))
    }

    async fn delete_task(&self, id: &str) -> Result<(), ApiError> {
        let request = self.client.delete(self.task_url(id));
        self.send_unit(request)
            .await
            .map_err(|e| Self::with_fallback(e, "Failed to delete task"))
    }

    async fn create_subtask(&self, task_id: &str, draft: &SubtaskDraft) -> Result<Task, ApiError> {
        let url = format!("{}/subtasks", self.task_url(task_id));
        let request = self.client.post(url).json(draft);
        self.send_json(request, "Failed to create subtask")
            .await
            .map_err(|e| Self::with_fallback(e, "Failed to create subtask"))
    }

    async fn fetch_subtask(&self, task_id: &str, subtask_id: &str) -> Result<Subtask, ApiError> {
        let request = self.client.get(self.subtask_url(task_id, subtask_id));
        self.send_json(request, "Failed to fetch subtask")
            .await
            .map_err(|e| Self::with_fallback(e, "Failed to fetch subtask"))
    }

    async fn update_subtask(
        &self,
        task_id: &str,
        subtask_id: &str,
        update: SubtaskUpdate,
    ) -> Result<(), ApiError> {
        let url = self.subtask_url(task_id, subtask_id);
        let request = match &update {
            SubtaskUpdate::Json(patch) => self.client.put(url).json(patch),
            SubtaskUpdate::Multipart { patch, images } => {
                let form = Self::multipart_form(patch, images)?;
                self.client.put(url).multipart(form)
            }
        };
        self.send_unit(request)
            .await
            .map_err(|e| Self::with_fallback(e, "Failed to update subtask"))
    }

    async fn delete_subtask(&self, task_id: &str, subtask_id: &str) -> Result<(), ApiError> {
        let request = self.client.delete(self.subtask_url(task_id, subtask_id));
        self.send_unit(request)
            .await
            .map_err(|e| Self::with_fallback(e, "Failed to delete subtask"))
    }

    async fn fetch_status_summary(&self) -> Result<Vec<StatusSummary>, ApiError> {
        let url = format!("{}/status-summary", self.tasks_url());
        let request = self.client.get(url);
        self.send_json(request, "Failed to fetch status summary")
            .await
            .map_err(|e| Self::with_fallback(e, "Failed to fetch status summary"))
    }

    async fn add_comment(
        &self,
        task_id: &str,
        subtask_id: &str,
        comment: &NewComment,
    ) -> Result<(), ApiError> {
        let url = format!("{}/comments", self.subtask_url(task_id, subtask_id));
        let request = self.client.post(url).json(comment);
        self.send_unit(request)
            .await
            .map_err(|e| Self::with_fallback(e, "Failed to add comment"))
    }
}
