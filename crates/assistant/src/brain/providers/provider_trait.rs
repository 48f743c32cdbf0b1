//! Provider trait and common types for completion providers

use async_trait::async_trait;
use db::models::chat_message::{ChatMessage as StoredMessage, ChatRole};
use serde::{Deserialize, Serialize};

/// Error type for provider operations
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Response parse error: {0}")]
    ParseError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Malformed completion: {0}")]
    Malformed(String),

    #[error("Provider not available: {0}")]
    NotAvailable(String),
}

impl ProviderError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

/// Role of a message in the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in the prompt sent upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&StoredMessage> for PromptMessage {
    fn from(message: &StoredMessage) -> Self {
        match message.role {
            ChatRole::User => PromptMessage::user(message.content.clone()),
            ChatRole::Assistant => PromptMessage::assistant(message.content.clone()),
        }
    }
}

/// Tool definition for function calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Sampling settings shared by every provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 600,
        }
    }
}

/// Everything a provider needs for one completion
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub history: Vec<PromptMessage>,
    pub message: String,
    pub tools: Vec<ToolDefinition>,
    pub config: CompletionConfig,
}

impl CompletionRequest {
    /// System prompt, then history, then the new user message.
    pub fn messages(&self) -> Vec<PromptMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(PromptMessage::system(self.system_prompt.clone()));
        messages.extend(self.history.iter().cloned());
        messages.push(PromptMessage::user(self.message.clone()));
        messages
    }
}

/// What a provider decided
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Direct textual answer
    Answer { text: String },
    /// One tool invocation
    Action {
        name: String,
        arguments: serde_json::Value,
    },
}

/// Trait that all completion providers must implement
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Whether credentials are present; unconfigured providers are skipped
    fn is_configured(&self) -> bool {
        true
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_wrap_history_with_system_and_user() {
        let request = CompletionRequest {
            system_prompt: "stay on topic".into(),
            history: vec![
                PromptMessage::user("hi"),
                PromptMessage::assistant("hello"),
            ],
            message: "add milk".into(),
            tools: Vec::new(),
            config: CompletionConfig::default(),
        };

        let messages = request.messages();
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User
            ]
        );
        assert_eq!(messages[3].content, "add milk");
    }

    #[test]
    fn only_rate_limits_report_as_such() {
        assert!(ProviderError::RateLimited { retry_after_ms: None }.is_rate_limit());
        assert!(!ProviderError::Timeout(10).is_rate_limit());
    }
}
