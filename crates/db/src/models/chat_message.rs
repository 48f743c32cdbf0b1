//! Persistent chat log for the assistant.
//!
//! One row per message, scoped by owner. There is no conversation table: the
//! context window is always derived from `owner` + recency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ChatMessageError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, Type, PartialEq, Eq, Serialize, Deserialize, TS)]
#[sqlx(type_name = "chat_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct ChatMessage {
    pub id: Uuid,
    pub owner: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateChatMessage {
    pub owner: String,
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    /// Inserts a message in a single statement and returns the stored row.
    pub async fn create(
        pool: &SqlitePool,
        data: CreateChatMessage,
    ) -> Result<Self, ChatMessageError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        let message = sqlx::query_as(
            r#"
            INSERT INTO chat_messages (id, owner, role, content, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, owner, role, content, created_at
            "#,
        )
        .bind(id)
        .bind(&data.owner)
        .bind(data.role)
        .bind(&data.content)
        .bind(now)
        .fetch_one(pool)
        .await?;
        Ok(message)
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
    ) -> Result<Option<Self>, ChatMessageError> {
        let message = sqlx::query_as("SELECT * FROM chat_messages WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(message)
    }

    /// Full log for an owner, oldest first.
    pub async fn find_by_owner(
        pool: &SqlitePool,
        owner: &str,
    ) -> Result<Vec<Self>, ChatMessageError> {
        let messages = sqlx::query_as(
            r#"
            SELECT * FROM chat_messages
            WHERE owner = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(owner)
        .fetch_all(pool)
        .await?;
        Ok(messages)
    }

    /// The `limit` most recent messages for an owner, oldest first.
    pub async fn find_recent(
        pool: &SqlitePool,
        owner: &str,
        limit: i64,
    ) -> Result<Vec<Self>, ChatMessageError> {
        // Newest first from the index, then reversed into chronological order
        let messages: Vec<Self> = sqlx::query_as(
            r#"
            SELECT * FROM chat_messages
            WHERE owner = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(owner)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(messages.into_iter().rev().collect())
    }

    pub async fn count_by_owner(pool: &SqlitePool, owner: &str) -> Result<i64, ChatMessageError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_messages WHERE owner = ?")
            .bind(owner)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Removes every message of an owner. Returns the number of deleted rows.
    pub async fn delete_by_owner(
        pool: &SqlitePool,
        owner: &str,
    ) -> Result<u64, ChatMessageError> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE owner = ?")
            .bind(owner)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_utils::setup_test_pool;

    async fn add(pool: &SqlitePool, owner: &str, role: ChatRole, content: &str) -> ChatMessage {
        ChatMessage::create(
            pool,
            CreateChatMessage {
                owner: owner.into(),
                role,
                content: content.into(),
            },
        )
        .await
        .expect("failed to insert chat message")
    }

    #[tokio::test]
    async fn create_round_trips_row() {
        let pool = setup_test_pool().await;
        let created = add(&pool, "alice", ChatRole::User, "Add a task to call mom").await;

        let fetched = ChatMessage::find_by_id(&pool, created.id)
            .await
            .unwrap()
            .expect("message missing");
        assert_eq!(fetched.owner, "alice");
        assert_eq!(fetched.role, ChatRole::User);
        assert_eq!(fetched.content, "Add a task to call mom");
    }

    #[tokio::test]
    async fn recent_returns_tail_in_chronological_order() {
        let pool = setup_test_pool().await;
        for i in 0..5 {
            add(&pool, "alice", ChatRole::User, &format!("message {i}")).await;
        }
        add(&pool, "bob", ChatRole::User, "not alice's").await;

        let recent = ChatMessage::find_recent(&pool, "alice", 3).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["message 2", "message 3", "message 4"]);

        let all = ChatMessage::find_by_owner(&pool, "alice").await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|m| m.owner == "alice"));
    }

    #[tokio::test]
    async fn delete_by_owner_leaves_other_owners_alone() {
        let pool = setup_test_pool().await;
        add(&pool, "alice", ChatRole::User, "hi").await;
        add(&pool, "alice", ChatRole::Assistant, "hello").await;
        add(&pool, "bob", ChatRole::User, "hey").await;

        assert_eq!(ChatMessage::delete_by_owner(&pool, "alice").await.unwrap(), 2);
        assert_eq!(ChatMessage::delete_by_owner(&pool, "alice").await.unwrap(), 0);
        assert_eq!(ChatMessage::count_by_owner(&pool, "alice").await.unwrap(), 0);
        assert_eq!(ChatMessage::count_by_owner(&pool, "bob").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn closed_pool_surfaces_as_chat_message_error() {
        let pool = setup_test_pool().await;
        pool.close().await;

        let err = ChatMessage::find_recent(&pool, "alice", 10).await.unwrap_err();
        assert!(matches!(err, ChatMessageError::Database(sqlx::Error::PoolClosed)));
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Assistant".parse::<ChatRole>().unwrap(), ChatRole::Assistant);
        assert_eq!(ChatRole::User.to_string(), "user");
        assert!("tool".parse::<ChatRole>().is_err());
    }
}
