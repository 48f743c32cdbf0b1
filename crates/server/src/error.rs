use assistant::AssistantError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tokio::task::JoinError;
use utils::response::ApiResponse;

const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Assistant(#[from] AssistantError),
    #[error("Chat turn aborted: {0}")]
    Join(#[from] JoinError),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Assistant(err) => match err {
                AssistantError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
                AssistantError::NotFound => (StatusCode::NOT_FOUND, "NotFound"),
                AssistantError::ProviderUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "ProviderUnavailable")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "AssistantError"),
            },
            ApiError::Join(_) => (StatusCode::INTERNAL_SERVER_ERROR, "JoinError"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        };

        // Server-side details stay in the log
        let error_message = if status_code.is_server_error() {
            tracing::error!("{}: {}", error_type, self);
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            match &self {
                ApiError::BadRequest(msg) | ApiError::Unauthorized(msg) => msg.clone(),
                _ => self.to_string(),
            }
        };

        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized("no owner".into()), StatusCode::UNAUTHORIZED),
            (ApiError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
            (ApiError::Assistant(AssistantError::NotFound), StatusCode::NOT_FOUND),
            (
                ApiError::Assistant(AssistantError::StoreFailure("disk full".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Assistant(AssistantError::Validation(
                    assistant::ValidationError::EmptyMessage,
                )),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let response =
            ApiError::Assistant(AssistantError::StoreFailure("disk full at /var/db".into()))
                .into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();

        assert!(text.contains(INTERNAL_ERROR_MESSAGE));
        assert!(!text.contains("/var/db"));
    }
}
