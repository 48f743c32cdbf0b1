//! Chat widget endpoints: send a message, read or clear the conversation.

use assistant::{ChatReply, Language};
use axum::{
    Extension, Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use db::models::chat_message::{ChatMessage, ChatRole};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, middleware::Owner};

#[derive(Debug, Deserialize, TS)]
pub struct ChatRequest {
    pub message: String,
    /// Reply language hint; the message text decides when it contains Urdu
    #[serde(default)]
    pub language: Option<Language>,
}

#[derive(Debug, Serialize, Deserialize, TS)]
pub struct ChatHistoryEntry {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<ChatMessage> for ChatHistoryEntry {
    fn from(message: ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat", post(send_message))
        .route("/chat/history", get(get_history).delete(clear_history))
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    tracing::debug!(
        "[CHAT] Incoming message: {} chars, language hint {:?}",
        request.message.chars().count(),
        request.language
    );

    // Spawned so a disconnecting client cannot cancel a half-applied turn
    let assistant = state.assistant().clone();
    let reply = tokio::spawn(async move {
        assistant
            .handle_message(owner.as_str(), &request.message, request.language)
            .await
    })
    .await??;

    Ok(Json(reply))
}

pub async fn get_history(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
) -> Result<Json<Vec<ChatHistoryEntry>>, ApiError> {
    let history = state.assistant().get_history(owner.as_str()).await?;
    Ok(Json(history.into_iter().map(ChatHistoryEntry::from).collect()))
}

pub async fn clear_history(
    State(state): State<AppState>,
    Extension(owner): Extension<Owner>,
) -> Result<Json<ApiResponse<u64>>, ApiError> {
    let removed = state.assistant().clear_history(owner.as_str()).await?;
    Ok(Json(ApiResponse::success(removed)))
}
