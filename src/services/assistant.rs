// src/services/assistant.rs
use std::pin::Pin;

use async_stream::stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use thiserror::Error;
use tokio::time::{Instant, timeout_at};

/// Ordered fragments of model-generated text. Fragment boundaries carry no
/// meaning; concatenation in arrival order reconstructs the reply.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http transport: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("malformed stream payload: {0}")]
    Decode(String),

    #[error("reply deadline exceeded")]
    DeadlineExceeded,
}

/// A streaming text-generation model. One fixed system instruction, one
/// user message per call; every call is independent.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn stream_reply(&self, message: &str) -> Result<ReplyStream, ProviderError>;
}

/// Bounds a reply stream by an absolute deadline. Chunks are pulled one at
/// a time; waiting past the deadline for the next one ends the stream with
/// `DeadlineExceeded` instead of hanging the connection.
pub fn deadline_stream(mut inner: ReplyStream, deadline: Instant) -> ReplyStream {
    Box::pin(stream! {
        loop {
            match timeout_at(deadline, inner.next()).await {
                Ok(Some(chunk)) => yield chunk,
                Ok(None) => break,
                Err(_) => {
                    yield Err(ProviderError::DeadlineExceeded);
                    break;
                }
            }
        }
    })
}
