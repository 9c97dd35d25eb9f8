use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ocr::OCR_ENGINE;

#[derive(Error, Debug)]
pub enum TextliftError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rate limit exceeded, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("OCR provider error: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for TextliftError {
    fn into_response(self) -> Response {
        match self {
            TextliftError::InvalidInput(detail) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail }))).into_response()
            }
            TextliftError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after_secs.to_string())],
                Json(json!({
                    "detail": format!(
                        "Rate limit exceeded. Retry after {retry_after_secs} seconds"
                    )
                })),
            )
                .into_response(),
            TextliftError::Upstream(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": message,
                    "ocr_engine": OCR_ENGINE,
                })),
            )
                .into_response(),
            TextliftError::Internal(message) => {
                // Log the real cause; clients only ever see a generic message.
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "success": false,
                        "error": "Internal server error",
                        "ocr_engine": OCR_ENGINE,
                    })),
                )
                    .into_response()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, TextliftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let resp = TextliftError::InvalidInput("bad file".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = TextliftError::RateLimited {
            retry_after_secs: 42,
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        let resp = TextliftError::Upstream("vision api down".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = TextliftError::Internal("oops".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_rate_limited_sets_retry_after_header() {
        let resp = TextliftError::RateLimited {
            retry_after_secs: 17,
        }
        .into_response();
        assert_eq!(
            resp.headers().get(header::RETRY_AFTER).unwrap(),
            &"17".parse::<axum::http::HeaderValue>().unwrap()
        );
    }
}
