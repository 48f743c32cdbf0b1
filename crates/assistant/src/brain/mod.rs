use std::{sync::Arc, time::Duration};

pub mod extract;
pub mod providers;

pub use extract::{completion_from_text, extract_json};
pub use providers::{
    Completion, CompletionConfig, CompletionProvider, CompletionRequest, GeminiProvider,
    OpenAIProvider, PromptMessage, ProviderError, ToolDefinition,
};

use crate::catalog::is_known_tool;

/// Ordered providers, each tried once with its own timeout.
#[derive(Clone)]
pub struct ProviderChain {
    providers: Vec<Arc<dyn CompletionProvider>>,
    timeout: Duration,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn CompletionProvider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// OpenRouter first, Gemini as the fallback.
    pub fn from_env(timeout: Duration) -> Self {
        let providers: Vec<Arc<dyn CompletionProvider>> = vec![
            Arc::new(OpenAIProvider::from_env()),
            Arc::new(GeminiProvider::from_env()),
        ];
        Self::new(providers, timeout)
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn has_configured_provider(&self) -> bool {
        self.providers.iter().any(|p| p.is_configured())
    }

    /// A completion is usable when an answer has text or an action names a
    /// tool from the catalog.
    fn validate(completion: Completion) -> Result<Completion, ProviderError> {
        let problem = match &completion {
            Completion::Answer { text } if text.trim().is_empty() => {
                Some("empty answer".to_string())
            }
            Completion::Action { name, .. } if !is_known_tool(name) => {
                Some(format!("unknown tool '{}'", name))
            }
            _ => None,
        };

        match problem {
            Some(reason) => Err(ProviderError::Malformed(reason)),
            None => Ok(completion),
        }
    }

    pub async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let mut last_error = None;

        for provider in self.providers.iter().filter(|p| p.is_configured()) {
            let name = provider.name();
            let outcome = tokio::time::timeout(self.timeout, provider.complete(request))
                .await
                .unwrap_or_else(|_| Err(ProviderError::Timeout(self.timeout.as_millis() as u64)))
                .and_then(Self::validate);

            match outcome {
                Ok(completion) => return Ok(completion),
                Err(e) => {
                    if e.is_rate_limit() {
                        tracing::warn!("[PROVIDER] {} rate limited, switching provider", name);
                    } else {
                        tracing::warn!("[PROVIDER] {} failed: {}", name, e);
                    }
                    last_error = Some(e);
                }
            }
        }

        let error = last_error
            .unwrap_or_else(|| ProviderError::NotAvailable("no provider is configured".into()));
        tracing::error!("[PROVIDER] All completion providers failed: {}", error);
        Err(error)
    }
}
