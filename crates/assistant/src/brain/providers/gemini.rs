//! Gemini `generateContent` provider

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::provider_trait::{
    Completion, CompletionProvider, CompletionRequest, MessageRole, ProviderError, ToolDefinition,
};
use crate::brain::extract::completion_from_text;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Schema keywords Gemini's function declarations accept.
const SUPPORTED_SCHEMA_KEYS: [&str; 8] = [
    "type",
    "description",
    "enum",
    "properties",
    "required",
    "items",
    "nullable",
    "format",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: std::env::var("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: std::env::var("GEMINI_BASE_URL").unwrap_or(defaults.base_url),
        }
    }
}

pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Self {
        if config.api_key.is_some() {
            tracing::info!("[PROVIDER] Gemini initialized with model {}", config.model);
        } else {
            tracing::warn!("[PROVIDER] Gemini created without API key - it will be skipped");
        }

        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> Self {
        Self::new(GeminiConfig::from_env())
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn tool_to_gemini(&self, tool: &ToolDefinition) -> Value {
        json!({
            "name": tool.name,
            "description": tool.description,
            "parameters": gemini_schema(&tool.parameters)
        })
    }

    fn build_payload(&self, request: &CompletionRequest) -> Value {
        // Gemini has no system role in contents; history roles are user/model
        let mut contents: Vec<Value> = request
            .history
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| {
                let role = match m.role {
                    MessageRole::Assistant => "model",
                    _ => "user",
                };
                json!({"role": role, "parts": [{"text": m.content}]})
            })
            .collect();
        contents.push(json!({"role": "user", "parts": [{"text": request.message}]}));

        let mut payload = json!({
            "systemInstruction": {"parts": [{"text": request.system_prompt}]},
            "contents": contents,
            "generationConfig": {
                "temperature": request.config.temperature,
                "maxOutputTokens": request.config.max_tokens
            }
        });

        if !request.tools.is_empty() {
            let declarations: Vec<Value> =
                request.tools.iter().map(|t| self.tool_to_gemini(t)).collect();
            payload["tools"] = json!([{"functionDeclarations": declarations}]);
        }

        payload
    }

    fn parse_response(&self, json: &Value) -> Result<Completion, ProviderError> {
        let parts = json
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                let reason = json["promptFeedback"]["blockReason"]
                    .as_str()
                    .unwrap_or("no candidates");
                ProviderError::ParseError(format!("empty Gemini response: {}", reason))
            })?;

        if let Some(call) = parts.iter().find_map(|p| p.get("functionCall")) {
            let name = call["name"]
                .as_str()
                .ok_or_else(|| ProviderError::ParseError("functionCall without name".into()))?
                .to_string();
            let arguments = call.get("args").cloned().unwrap_or_else(|| json!({}));
            return Ok(Completion::Action { name, arguments });
        }

        let text: String = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("");
        Ok(completion_from_text(&text))
    }
}

/// Rewrites a JSON schema into the OpenAPI subset Gemini accepts: nullable
/// unions collapse to their non-null type and unknown keywords are dropped.
pub fn gemini_schema(schema: &Value) -> Value {
    let Some(obj) = schema.as_object() else {
        return schema.clone();
    };

    // anyOf: [T, {"type": "null"}] -> T
    if let Some(variants) = obj.get("anyOf").and_then(Value::as_array) {
        let non_null: Vec<&Value> = variants
            .iter()
            .filter(|v| v.get("type").and_then(Value::as_str) != Some("null"))
            .collect();
        if non_null.len() == 1 {
            let mut inner = gemini_schema(non_null[0]);
            if let (Some(desc), Some(inner_obj)) = (obj.get("description"), inner.as_object_mut()) {
                inner_obj.insert("description".into(), desc.clone());
            }
            return inner;
        }
    }

    let mut out = Map::new();
    for (key, value) in obj {
        if !SUPPORTED_SCHEMA_KEYS.contains(&key.as_str()) {
            continue;
        }
        let value = match key.as_str() {
            "type" => match value {
                Value::Array(types) => types
                    .iter()
                    .find(|t| t.as_str() != Some("null"))
                    .cloned()
                    .unwrap_or_else(|| json!("string")),
                other => other.clone(),
            },
            "enum" => match value {
                Value::Array(values) => {
                    Value::Array(values.iter().filter(|v| !v.is_null()).cloned().collect())
                }
                other => other.clone(),
            },
            "properties" => match value {
                Value::Object(props) => Value::Object(
                    props
                        .iter()
                        .map(|(name, prop)| (name.clone(), gemini_schema(prop)))
                        .collect(),
                ),
                other => other.clone(),
            },
            "items" => gemini_schema(value),
            // Gemini only knows a few formats; integer widths are the safe ones
            "format" => match value.as_str() {
                Some("int32") | Some("int64") => value.clone(),
                _ => continue,
            },
            _ => value.clone(),
        };
        out.insert(key.clone(), value);
    }
    Value::Object(out)
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, ProviderError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::AuthError("No Gemini API key configured".into()))?;

        let payload = self.build_payload(request);
        tracing::debug!(
            "[PROVIDER] Gemini request: model={}, contents={}, tools={}",
            self.config.model,
            payload["contents"].as_array().map(|c| c.len()).unwrap_or(0),
            request.tools.len()
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => ProviderError::RateLimited {
                    retry_after_ms: None,
                },
                401 | 403 => ProviderError::AuthError(body),
                code => ProviderError::ApiError {
                    status: code,
                    message: body,
                },
            });
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        self.parse_response(&json)
    }
}
