//! # Task assistant
//!
//! Turns free-form English or Urdu chat messages into at most one task
//! operation per turn and answers in the language of the message.
//!
//! A turn flows through the pieces in this crate in order: [`language`]
//! classifies the text, [`session`] supplies the recent window and records the
//! message, [`resolver`] asks the completion providers in [`brain`] what to do,
//! [`executor`] runs the resulting action against the [`store`], and
//! [`composer`] writes the localized reply.

pub mod agent;
pub mod brain;
pub mod catalog;
pub mod composer;
pub mod executor;
pub mod language;
pub mod priority;
pub mod resolver;
pub mod schedule;
pub mod session;
pub mod store;

#[cfg(test)]
mod resolver_tests;
#[cfg(test)]
mod test_support;

use std::{str::FromStr, time::Duration};

use db::models::chat_message::ChatMessageError;

pub use agent::ChatAssistant;
pub use brain::{CompletionProvider, ProviderChain, ProviderError};
pub use composer::ChatReply;
pub use executor::{ActionExecutor, ActionPayload, ActionResult, ErrorKind};
pub use language::Language;
pub use resolver::{Clarification, IntentResolver, Resolution};
pub use session::SessionManager;
pub use store::{SqliteTaskStore, TaskStore};
use serde::{Deserialize, Serialize};

/// Tunables for one assistant instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Messages of history sent with each turn
    pub window_size: usize,
    pub max_message_chars: usize,
    pub provider_timeout_secs: u64,
    pub store_timeout_secs: u64,
    /// Default `limit` for list_tasks
    pub list_limit: i64,
    /// Run turns of the same owner one at a time
    pub serialize_per_owner: bool,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            max_message_chars: 4000,
            provider_timeout_secs: 12,
            store_timeout_secs: 5,
            list_limit: 20,
            serialize_per_owner: true,
            temperature: 0.2,
            max_tokens: 600,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            window_size: env_or("ASSISTANT_WINDOW_SIZE", d.window_size),
            max_message_chars: env_or("ASSISTANT_MAX_MESSAGE_CHARS", d.max_message_chars),
            provider_timeout_secs: env_or(
                "ASSISTANT_PROVIDER_TIMEOUT_SECS",
                d.provider_timeout_secs,
            ),
            store_timeout_secs: env_or("ASSISTANT_STORE_TIMEOUT_SECS", d.store_timeout_secs),
            list_limit: env_or("ASSISTANT_LIST_LIMIT", d.list_limit),
            serialize_per_owner: env_or("ASSISTANT_SERIALIZE_PER_OWNER", d.serialize_per_owner),
            temperature: env_or("ASSISTANT_TEMPERATURE", d.temperature),
            max_tokens: env_or("ASSISTANT_MAX_TOKENS", d.max_tokens),
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

/// Rejected chat input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Message is empty")]
    EmptyMessage,

    #[error("Message is longer than {max} characters")]
    MessageTooLong { max: usize },
}

/// Main error type for assistant operations
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Task not found")]
    NotFound,

    #[error("Completion provider unavailable: {0}")]
    ProviderUnavailable(#[from] ProviderError),

    #[error("Task store failure: {0}")]
    StoreFailure(String),

    #[error("Chat log error: {0}")]
    ChatLog(#[from] ChatMessageError),
}

impl AssistantError {
    /// The user-facing category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AssistantError::Validation(_) => ErrorKind::Validation,
            AssistantError::NotFound => ErrorKind::NotFound,
            AssistantError::ProviderUnavailable(_) => ErrorKind::ProviderUnavailable,
            AssistantError::StoreFailure(_) | AssistantError::ChatLog(_) => {
                ErrorKind::StoreFailure
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AssistantError>;
