//! Owner-scoped access to tasks.

use async_trait::async_trait;
use db::models::task::{CreateTask, Task, TaskError, TaskStatusFilter, UpdateTask};
use sqlx::SqlitePool;

/// Every call takes the owner; implementations must never touch rows of
/// another owner and report them as [`TaskError::NotFound`].
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, owner: &str, task: &CreateTask) -> Result<Task, TaskError>;

    async fn list_tasks(
        &self,
        owner: &str,
        status: TaskStatusFilter,
        limit: i64,
    ) -> Result<Vec<Task>, TaskError>;

    async fn find_by_title(&self, owner: &str, fragment: &str) -> Result<Vec<Task>, TaskError>;

    async fn update_task(
        &self,
        owner: &str,
        id: i64,
        changes: &UpdateTask,
    ) -> Result<Task, TaskError>;

    /// Returns the deleted task.
    async fn delete_task(&self, owner: &str, id: i64) -> Result<Task, TaskError>;

    async fn toggle_complete(&self, owner: &str, id: i64) -> Result<Task, TaskError>;
}

#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn create_task(&self, owner: &str, task: &CreateTask) -> Result<Task, TaskError> {
        Ok(Task::create(&self.pool, owner, task).await?)
    }

    async fn list_tasks(
        &self,
        owner: &str,
        status: TaskStatusFilter,
        limit: i64,
    ) -> Result<Vec<Task>, TaskError> {
        Ok(Task::find_by_owner(&self.pool, owner, status, limit).await?)
    }

    async fn find_by_title(&self, owner: &str, fragment: &str) -> Result<Vec<Task>, TaskError> {
        Ok(Task::find_by_title(&self.pool, owner, fragment).await?)
    }

    async fn update_task(
        &self,
        owner: &str,
        id: i64,
        changes: &UpdateTask,
    ) -> Result<Task, TaskError> {
        Task::update(&self.pool, owner, id, changes)
            .await?
            .ok_or(TaskError::NotFound)
    }

    async fn delete_task(&self, owner: &str, id: i64) -> Result<Task, TaskError> {
        Task::delete(&self.pool, owner, id)
            .await?
            .ok_or(TaskError::NotFound)
    }

    async fn toggle_complete(&self, owner: &str, id: i64) -> Result<Task, TaskError> {
        Task::toggle_completed(&self.pool, owner, id)
            .await?
            .ok_or(TaskError::NotFound)
    }
}
