//! Completion providers
//!
//! Each upstream model API is one implementation of [`CompletionProvider`];
//! the chain in the parent module decides which one answers.

mod gemini;
mod openai;
mod provider_trait;

pub use gemini::{GeminiConfig, GeminiProvider, gemini_schema};
pub use openai::{OpenAIConfig, OpenAIProvider};
pub use provider_trait::{
    Completion, CompletionConfig, CompletionProvider, CompletionRequest, MessageRole,
    PromptMessage, ProviderError, ToolDefinition,
};
