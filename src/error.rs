// src/error.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::message::ErrorResponse;
use crate::services::assistant::ProviderError;

/// Errors the chat endpoint surfaces to a caller. Upstream detail is
/// logged where the failure occurs and collapsed into a generic message
/// here; provider-internal text never reaches the browser.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("message is required")]
    BadRequest,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("upstream failure: {0}")]
    Upstream(#[from] ProviderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest => (StatusCode::BAD_REQUEST, "Message is required."),
            ApiError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
            ApiError::Upstream(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to stream response.")
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}
