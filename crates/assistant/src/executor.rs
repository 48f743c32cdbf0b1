//! Runs one resolved action against the task store.

use std::{future::Future, sync::Arc, time::Duration};

use db::models::task::{MAX_TITLE_CHARS, Task, TaskError};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    catalog::{ActionRequest, Operation},
    store::TaskStore,
};

/// User-facing error categories; each maps to one canned reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    ProviderUnavailable,
    StoreFailure,
}

#[derive(Debug, Clone)]
pub enum ActionPayload {
    /// Created or updated task
    Task(Task),
    Tasks(Vec<Task>),
    Deleted { title: String },
    Toggled { title: String, completed: bool },
}

#[derive(Debug, Clone)]
pub struct ActionResult {
    pub operation: Operation,
    pub succeeded: bool,
    pub payload: Option<ActionPayload>,
    pub error_kind: Option<ErrorKind>,
}

impl ActionResult {
    fn success(operation: Operation, payload: ActionPayload) -> Self {
        Self {
            operation,
            succeeded: true,
            payload: Some(payload),
            error_kind: None,
        }
    }

    fn failure(operation: Operation, kind: ErrorKind) -> Self {
        Self {
            operation,
            succeeded: false,
            payload: None,
            error_kind: Some(kind),
        }
    }
}

#[derive(Clone)]
pub struct ActionExecutor {
    store: Arc<dyn TaskStore>,
    timeout: Duration,
}

impl ActionExecutor {
    pub fn new(store: Arc<dyn TaskStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Exactly one store call per action, never retried.
    pub async fn execute(&self, owner: &str, request: ActionRequest) -> ActionResult {
        let operation = request.operation();
        tracing::info!("[EXECUTOR] Executing {}", operation);

        let outcome = match request {
            ActionRequest::AddTask(task) => {
                let title = task.title.trim();
                if title.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
                    return ActionResult::failure(operation, ErrorKind::Validation);
                }
                self.bounded(self.store.create_task(owner, &task))
                    .await
                    .map(ActionPayload::Task)
            }
            ActionRequest::ListTasks { status, limit } => self
                .bounded(self.store.list_tasks(owner, status, limit))
                .await
                .map(ActionPayload::Tasks),
            ActionRequest::UpdateTask { task_id, changes } => {
                if changes.is_empty() {
                    return ActionResult::failure(operation, ErrorKind::Validation);
                }
                self.bounded(self.store.update_task(owner, task_id, &changes))
                    .await
                    .map(ActionPayload::Task)
            }
            ActionRequest::DeleteTask { task_id } => self
                .bounded(self.store.delete_task(owner, task_id))
                .await
                .map(|task| ActionPayload::Deleted { title: task.title }),
            ActionRequest::CompleteTask { task_id } => self
                .bounded(self.store.toggle_complete(owner, task_id))
                .await
                .map(|task| ActionPayload::Toggled {
                    title: task.title,
                    completed: task.completed,
                }),
        };

        match outcome {
            Ok(payload) => {
                tracing::info!("[EXECUTOR] {} succeeded", operation);
                ActionResult::success(operation, payload)
            }
            Err(kind) => ActionResult::failure(operation, kind),
        }
    }

    /// Applies the store timeout and folds store errors into error kinds.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, TaskError>>,
    ) -> Result<T, ErrorKind> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(TaskError::NotFound)) => {
                tracing::info!("[EXECUTOR] Task not found for owner");
                Err(ErrorKind::NotFound)
            }
            Ok(Err(TaskError::Database(e))) => {
                tracing::error!("[EXECUTOR] Task store failure: {}", e);
                Err(ErrorKind::StoreFailure)
            }
            Err(_) => {
                tracing::error!(
                    "[EXECUTOR] Task store timed out after {}ms",
                    self.timeout.as_millis()
                );
                Err(ErrorKind::StoreFailure)
            }
        }
    }
}
