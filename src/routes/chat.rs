// src/routes/chat.rs
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::Response,
};
use futures::StreamExt;
use serde_json::Value;
use tokio::time::{Instant, timeout_at};
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::assistant::{ProviderError, deadline_stream};
use crate::state::SharedState;

/// Relays one user message to the model and streams the reply back as it
/// arrives. Validation happens before any provider resource is acquired.
pub async fn chat_handler(
    State(state): State<SharedState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let message = parse_message(&body)?;

    let request_id = Uuid::new_v4();
    tracing::debug!(%request_id, chars = message.len(), "relaying chat message");

    let deadline = Instant::now() + state.reply_timeout;
    let stream = match timeout_at(deadline, state.provider.stream_reply(&message)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(err)) => {
            tracing::error!(%request_id, error = %err, "provider call failed");
            return Err(ApiError::Upstream(err));
        }
        Err(_) => {
            tracing::error!(%request_id, "provider call timed out");
            return Err(ApiError::Upstream(ProviderError::DeadlineExceeded));
        }
    };

    // A mid-stream fault can no longer change the status line; mapping it
    // to an io::Error terminates the body instead of leaving it open.
    let relayed = deadline_stream(stream, deadline).map(move |chunk| match chunk {
        Ok(text) => Ok(Bytes::from(text)),
        Err(err) => {
            tracing::error!(%request_id, error = %err, "reply stream failed mid-flight");
            Err(std::io::Error::new(std::io::ErrorKind::Other, err))
        }
    });

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(relayed))
        .unwrap();

    Ok(response)
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn parse_message(body: &[u8]) -> Result<String, ApiError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::BadRequest)?;
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .ok_or(ApiError::BadRequest)?
        .trim();

    if message.is_empty() {
        return Err(ApiError::BadRequest);
    }
    Ok(message.to_string())
}
