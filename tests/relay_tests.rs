use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use portfolio_chat::message::ErrorResponse;
use portfolio_chat::routes::create_router;
use portfolio_chat::services::assistant::{ModelProvider, ProviderError, ReplyStream};
use portfolio_chat::state::AppState;

enum Behavior {
    Chunks(Vec<&'static str>),
    FailOnCall,
    FailAfter(Vec<&'static str>),
    StallMidStream,
    StallOnCall,
}

struct StubModel {
    calls: Arc<AtomicUsize>,
    behavior: Behavior,
}

#[async_trait::async_trait]
impl ModelProvider for StubModel {
    async fn stream_reply(&self, _message: &str) -> Result<ReplyStream, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Chunks(chunks) => {
                let items: Vec<Result<String, ProviderError>> =
                    chunks.iter().map(|c| Ok(c.to_string())).collect();
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Behavior::FailOnCall => Err(ProviderError::Decode("stub refused".to_string())),
            Behavior::FailAfter(chunks) => {
                let mut items: Vec<Result<String, ProviderError>> =
                    chunks.iter().map(|c| Ok(c.to_string())).collect();
                items.push(Err(ProviderError::Decode("stub died".to_string())));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Behavior::StallMidStream => Ok(Box::pin(futures::stream::pending())),
            Behavior::StallOnCall => {
                futures::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn test_app(behavior: Behavior, reply_timeout: Duration) -> (Router, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = Arc::new(StubModel {
        calls: calls.clone(),
        behavior,
    });
    let state = Arc::new(AppState::new(provider, reply_timeout));
    let app = create_router(Path::new("public")).with_state(state);
    (app, calls)
}

fn chat_request(method: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn non_post_methods_get_405_without_provider_call() {
    for method in ["GET", "PUT", "DELETE", "PATCH"] {
        let (app, calls) = test_app(Behavior::Chunks(vec!["x"]), Duration::from_secs(5));

        let response = app
            .oneshot(chat_request(method, r#"{"message": "hello"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.error, "Method not allowed");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn invalid_bodies_get_400_without_provider_call() {
    for body in [
        "not json",
        r#"{}"#,
        r#"{"message": ""}"#,
        r#"{"message": "   "}"#,
        r#"{"message": 42}"#,
        r#"{"text": "hello"}"#,
    ] {
        let (app, calls) = test_app(Behavior::Chunks(vec!["x"]), Duration::from_secs(5));

        let response = app.oneshot(chat_request("POST", body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let err: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(err.error, "Message is required.");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

#[tokio::test]
async fn valid_message_relays_chunks_in_order() {
    let (app, calls) = test_app(
        Behavior::Chunks(vec!["Hel", "lo, ", "world"]),
        Duration::from_secs(5),
    );

    let response = app
        .oneshot(chat_request("POST", r#"{"message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/plain; charset=utf-8"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"Hello, world");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn establishment_failure_returns_500_with_generic_error() {
    let (app, _) = test_app(Behavior::FailOnCall, Duration::from_secs(5));

    let response = app
        .oneshot(chat_request("POST", r#"{"message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
    // Generic message only; the stub's detail must not leak.
    assert_eq!(err.error, "Failed to stream response.");
}

#[tokio::test]
async fn midstream_failure_terminates_the_body() {
    let (app, _) = test_app(
        Behavior::FailAfter(vec!["par", "tial"]),
        Duration::from_secs(5),
    );

    let response = app
        .oneshot(chat_request("POST", r#"{"message": "hi"}"#))
        .await
        .unwrap();

    // Headers are already out; the stream must end with an error rather
    // than hang.
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.into_body().collect().await.is_err());
}

#[tokio::test]
async fn stalled_stream_is_cut_off_at_the_deadline() {
    let (app, _) = test_app(Behavior::StallMidStream, Duration::from_millis(50));

    let response = app
        .oneshot(chat_request("POST", r#"{"message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.into_body().collect().await.is_err());
}

#[tokio::test]
async fn stalled_provider_call_returns_500() {
    let (app, _) = test_app(Behavior::StallOnCall, Duration::from_millis(50));

    let response = app
        .oneshot(chat_request("POST", r#"{"message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let err: ErrorResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.error, "Failed to stream response.");
}

#[tokio::test]
async fn health_route_answers_ok() {
    let (app, _) = test_app(Behavior::Chunks(vec![]), Duration::from_secs(5));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
