use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use thiserror::Error;
use ts_rs::TS;

pub const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Task not found")]
    NotFound,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, Default, TS, JsonSchema,
)]
#[sqlx(type_name = "priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Completion filter for listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, TS, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: i64,
    pub owner: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: Priority,
    pub tags: Option<String>, // JSON array of strings
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<DateTime<Utc>>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
            && self.due_date.is_none()
    }
}

impl Task {
    pub fn tag_list(&self) -> Vec<String> {
        Self::deserialize_json_array(&self.tags).unwrap_or_default()
    }

    fn serialize_json_array(arr: &[String]) -> Option<String> {
        if arr.is_empty() {
            None
        } else {
            serde_json::to_string(arr).ok()
        }
    }

    fn deserialize_json_array(s: &Option<String>) -> Option<Vec<String>> {
        s.as_ref().and_then(|v| serde_json::from_str(v).ok())
    }

    pub async fn create(
        pool: &SqlitePool,
        owner: &str,
        data: &CreateTask,
    ) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        let tags_json = Self::serialize_json_array(&data.tags);

        sqlx::query_as(
            r#"INSERT INTO tasks (
                owner, title, description, completed, priority, tags, due_date,
                created_at, updated_at
               )
               VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?)
               RETURNING *"#,
        )
        .bind(owner)
        .bind(&data.title)
        .bind(data.description.as_deref().unwrap_or(""))
        .bind(data.priority)
        .bind(tags_json)
        .bind(data.due_date)
        .bind(now)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Owner-scoped lookup: another owner's task is indistinguishable from a
    /// missing one.
    pub async fn find_by_id_for_owner(
        pool: &SqlitePool,
        id: i64,
        owner: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM tasks WHERE id = ? AND owner = ?")
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_owner(
        pool: &SqlitePool,
        owner: &str,
        status: TaskStatusFilter,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = match status {
            TaskStatusFilter::All => {
                "SELECT * FROM tasks WHERE owner = ? ORDER BY id ASC LIMIT ?"
            }
            TaskStatusFilter::Pending => {
                "SELECT * FROM tasks WHERE owner = ? AND completed = 0 ORDER BY id ASC LIMIT ?"
            }
            TaskStatusFilter::Completed => {
                "SELECT * FROM tasks WHERE owner = ? AND completed = 1 ORDER BY id ASC LIMIT ?"
            }
        };

        sqlx::query_as(query)
            .bind(owner)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Case-insensitive substring match on title among one owner's tasks.
    pub async fn find_by_title(
        pool: &SqlitePool,
        owner: &str,
        fragment: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"SELECT * FROM tasks
               WHERE owner = ? AND instr(lower(title), lower(?)) > 0
               ORDER BY id ASC"#,
        )
        .bind(owner)
        .bind(fragment.trim())
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        owner: &str,
        id: i64,
        data: &UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let tags_json = data
            .tags
            .as_deref()
            .map(|tags| Self::serialize_json_array(tags).unwrap_or_else(|| "[]".to_string()));

        sqlx::query_as(
            r#"UPDATE tasks
               SET title = COALESCE(?, title),
                   description = COALESCE(?, description),
                   priority = COALESCE(?, priority),
                   tags = COALESCE(?, tags),
                   due_date = COALESCE(?, due_date),
                   updated_at = ?
               WHERE id = ? AND owner = ?
               RETURNING *"#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.priority)
        .bind(tags_json)
        .bind(data.due_date)
        .bind(Utc::now())
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }

    /// Flips the completion flag and returns the updated row.
    pub async fn toggle_completed(
        pool: &SqlitePool,
        owner: &str,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"UPDATE tasks
               SET completed = NOT completed, updated_at = ?
               WHERE id = ? AND owner = ?
               RETURNING *"#,
        )
        .bind(Utc::now())
        .bind(id)
        .bind(owner)
        .fetch_optional(pool)
        .await
    }

    /// Deletes and returns the row, or `None` when nothing matched.
    pub async fn delete(
        pool: &SqlitePool,
        owner: &str,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("DELETE FROM tasks WHERE id = ? AND owner = ? RETURNING *")
            .bind(id)
            .bind(owner)
            .fetch_optional(pool)
            .await
    }

    pub async fn count_by_owner(pool: &SqlitePool, owner: &str) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE owner = ?")
            .bind(owner)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
