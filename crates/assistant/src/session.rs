//! Owner-scoped chat log and the context window built from it.

use db::models::chat_message::{ChatMessage, ChatRole, CreateChatMessage};
use sqlx::SqlitePool;

use crate::{Result, ValidationError};

#[derive(Clone)]
pub struct SessionManager {
    pool: SqlitePool,
    max_chars: usize,
}

/// Cuts `content` to at most `max` characters on a char boundary.
pub fn truncate_chars(content: &str, max: usize) -> &str {
    match content.char_indices().nth(max) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

impl SessionManager {
    pub fn new(pool: SqlitePool, max_chars: usize) -> Self {
        Self { pool, max_chars }
    }

    pub fn validate(&self, content: &str) -> std::result::Result<(), ValidationError> {
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyMessage);
        }
        if content.chars().count() > self.max_chars {
            return Err(ValidationError::MessageTooLong {
                max: self.max_chars,
            });
        }
        Ok(())
    }

    /// Stores one message in a single write.
    pub async fn append(&self, owner: &str, role: ChatRole, content: &str) -> Result<ChatMessage> {
        self.validate(content)?;

        let message = ChatMessage::create(
            &self.pool,
            CreateChatMessage {
                owner: owner.to_string(),
                role,
                content: content.to_string(),
            },
        )
        .await?;

        tracing::debug!(
            "[CHAT] Stored {} message {} ({} chars)",
            role,
            message.id,
            content.chars().count()
        );
        Ok(message)
    }

    /// Stores an assistant reply, cut to the message cap first.
    pub async fn append_reply(&self, owner: &str, content: &str) -> Result<ChatMessage> {
        let content = truncate_chars(content, self.max_chars);
        self.append(owner, ChatRole::Assistant, content).await
    }

    /// Up to `limit` most recent messages, oldest first.
    pub async fn recent_window(&self, owner: &str, limit: usize) -> Result<Vec<ChatMessage>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(ChatMessage::find_recent(&self.pool, owner, limit).await?)
    }

    pub async fn history(&self, owner: &str) -> Result<Vec<ChatMessage>> {
        Ok(ChatMessage::find_by_owner(&self.pool, owner).await?)
    }

    /// Deletes the owner's whole log. Clearing an empty log is not an error.
    pub async fn clear(&self, owner: &str) -> Result<u64> {
        let removed = ChatMessage::delete_by_owner(&self.pool, owner).await?;
        tracing::info!("[CHAT] Cleared {} message(s) for owner", removed);
        Ok(removed)
    }
}
