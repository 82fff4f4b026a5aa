//! HTTP error mapping
//!
//! Body shape is `{"error": <message>}`, plus `"details"` for generation
//! failures (`"<failure_kind>: <last error>"`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{FailureKind, PlaylistError};

/// Client-facing message when generation gives up
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate playlist after multiple attempts";

/// Client-facing message when the generative service has no API key
pub const GENERATION_UNCONFIGURED_MESSAGE: &str = "Playlist generation is not configured";

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Pipeline failure (400 or 500)
    #[error(transparent)]
    Playlist(#[from] PlaylistError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Playlist(PlaylistError::InvalidInput) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": PlaylistError::InvalidInput.to_string() }),
            ),
            ApiError::Playlist(PlaylistError::Generation(failure)) => {
                let message = match failure.kind() {
                    FailureKind::ConfigMissing => GENERATION_UNCONFIGURED_MESSAGE,
                    _ => GENERATION_FAILED_MESSAGE,
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": message,
                        "details": format!("{}: {}", failure.kind(), failure.last),
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{GenerationError, GenerationFailure};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::time::Duration;

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_input_is_400() {
        let (status, body) = render(PlaylistError::InvalidInput.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid song input" }));
    }

    #[tokio::test]
    async fn test_exhausted_generation_is_500_with_kind() {
        let failure = GenerationFailure {
            attempts: 4,
            elapsed: Duration::from_secs(7),
            last: GenerationError::TimedOut(Duration::from_secs(30)),
        };

        let (status, body) = render(PlaylistError::Generation(failure).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!(GENERATION_FAILED_MESSAGE));
        assert_eq!(
            body["details"],
            json!("upstream_timeout: generative service did not respond within 30000 ms")
        );
    }

    #[tokio::test]
    async fn test_missing_key_is_reported_as_unconfigured() {
        let failure = GenerationFailure {
            attempts: 1,
            elapsed: Duration::ZERO,
            last: GenerationError::ConfigMissing("GEMINI_API_KEY".to_string()),
        };

        let (status, body) = render(PlaylistError::Generation(failure).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!(GENERATION_UNCONFIGURED_MESSAGE));
        assert_eq!(body["details"], json!("config_missing: GEMINI_API_KEY is not configured"));
    }
}
