//! OpenAI-compatible chat completions (OpenRouter by default)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::provider_trait::{
    Completion, CompletionProvider, CompletionRequest, MessageRole, PromptMessage, ProviderError,
    ToolDefinition,
};
use crate::brain::extract::completion_from_text;

pub const DEFAULT_OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

pub const DEFAULT_OPENROUTER_MODELS: [&str; 4] = [
    "meta-llama/llama-3.3-70b-instruct",
    "google/gemini-2.0-flash-001",
    "mistralai/mistral-large-2411",
    "openai/gpt-4o-mini",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub endpoint: String,
    /// Tried in order within one attempt
    pub models: Vec<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_OPENROUTER_ENDPOINT.to_string(),
            models: DEFAULT_OPENROUTER_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl OpenAIConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = std::env::var("OPEN_ROUTER_KEY")
            .or_else(|_| std::env::var("OPENROUTER_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());

        let models = std::env::var("OPENROUTER_MODELS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(String::from)
                    .collect::<Vec<_>>()
            })
            .filter(|models| !models.is_empty())
            .unwrap_or(defaults.models);

        Self {
            api_key,
            endpoint: std::env::var("OPENROUTER_ENDPOINT").unwrap_or(defaults.endpoint),
            models,
        }
    }
}

/// OpenAI-compatible provider with an ordered model list
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> Self {
        if config.api_key.is_some() {
            tracing::info!(
                "[PROVIDER] OpenRouter initialized with {} model(s)",
                config.models.len()
            );
        } else {
            tracing::warn!("[PROVIDER] OpenRouter created without API key - it will be skipped");
        }

        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(OpenAIConfig::from_env())
    }

    fn message_to_openai(&self, msg: &PromptMessage) -> serde_json::Value {
        let role = match msg.role {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };

        serde_json::json!({
            "role": role,
            "content": msg.content
        })
    }

    fn tool_to_openai(&self, tool: &ToolDefinition) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters
            }
        })
    }

    fn build_payload(&self, model: &str, request: &CompletionRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages()
            .iter()
            .map(|m| self.message_to_openai(m))
            .collect();

        let mut payload = serde_json::json!({
            "model": model,
            "temperature": request.config.temperature,
            "max_tokens": request.config.max_tokens,
            "messages": messages
        });

        if !request.tools.is_empty() {
            let tools: Vec<serde_json::Value> =
                request.tools.iter().map(|t| self.tool_to_openai(t)).collect();
            payload["tools"] = serde_json::json!(tools);
            payload["tool_choice"] = serde_json::json!("auto");
        }

        payload
    }

    /// Native tool calls first; otherwise the text, which may itself carry a
    /// JSON tool call.
    fn parse_response(&self, json: &serde_json::Value) -> Result<Completion, ProviderError> {
        let message = json
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .ok_or_else(|| ProviderError::ParseError("response has no choices".to_string()))?;

        if let Some(tool_calls) = message["tool_calls"].as_array() {
            if tool_calls.len() > 1 {
                tracing::debug!(
                    "[PROVIDER] {} tool calls returned, using the first",
                    tool_calls.len()
                );
            }
            if let Some(call) = tool_calls.first() {
                let name = call["function"]["name"]
                    .as_str()
                    .ok_or_else(|| ProviderError::ParseError("tool call without name".into()))?
                    .to_string();
                let arguments = match &call["function"]["arguments"] {
                    serde_json::Value::String(raw) if raw.trim().is_empty() => {
                        serde_json::json!({})
                    }
                    serde_json::Value::String(raw) => serde_json::from_str(raw)
                        .map_err(|e| ProviderError::ParseError(e.to_string()))?,
                    other => other.clone(),
                };
                return Ok(Completion::Action { name, arguments });
            }
        }

        let content = message["content"].as_str().unwrap_or("");
        Ok(completion_from_text(content))
    }

    async fn complete_with_model(
        &self,
        api_key: &str,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<Completion, ProviderError> {
        let payload = self.build_payload(model, request);

        tracing::debug!(
            "[PROVIDER] OpenRouter request: model={}, messages={}, tools={}",
            model,
            payload["messages"].as_array().map(|m| m.len()).unwrap_or(0),
            request.tools.len()
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", api_key))
            .header("HTTP-Referer", "http://localhost:3000")
            .header("X-Title", "TodoEvolve")
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1000);
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited { retry_after_ms });
            }
            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(ProviderError::AuthError(body));
            }

            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        self.parse_response(&json)
    }
}

#[async_trait]
impl CompletionProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some() && !self.config.models.is_empty()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::AuthError("No OpenRouter API key configured".into()))?;

        let mut last_error = None;
        for model in &self.config.models {
            match self.complete_with_model(api_key, model, request).await {
                Ok(completion) => {
                    tracing::info!("[PROVIDER] OpenRouter answered with {}", model);
                    return Ok(completion);
                }
                // The quota is per key, so other models would be limited too
                Err(e) if e.is_rate_limit() => {
                    tracing::warn!("[PROVIDER] OpenRouter rate limited on {}", model);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("[PROVIDER] OpenRouter model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ProviderError::ConfigError("No OpenRouter models configured".into())))
    }
}
