// tests/http_api.rs
// Router-level tests driven through tower's oneshot, no sockets involved.


use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tokio::sync::Mutex;
use tower::ServiceExt;

use dudil::emotion::EmotionLabel;
use dudil::server::{router, AppState};

use test_helpers::{engine_with, temp_store, FailingResponder, FixedClassifier, RecordingResponder};

fn chat_app(dir: &tempfile::TempDir) -> axum::Router {
    let state = Arc::new(AppState {
        engine: engine_with(
            Arc::new(FixedClassifier {
                label: EmotionLabel::Joy,
                confidence: 0.88,
            }),
            Arc::new(RecordingResponder::new("Delighted to hear it!")),
        ),
        store: Mutex::new(temp_store(dir)),
    });
    router(state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_chat(body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn chat_without_id_creates_a_conversation_and_replies() {
    let dir = tempfile::tempdir().unwrap();
    let app = chat_app(&dir);

    let response = app
        .oneshot(post_chat(serde_json::json!({ "message": "I got the job!" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["reply"], "Delighted to hear it!");
    assert_eq!(json["emotion"], "joy");
    assert_eq!(json["intensity"], 5);
    assert!(json["conversation_id"].as_str().unwrap().len() > 10);
    let confidence = json["confidence"].as_f64().unwrap();
    assert!((confidence - 0.88).abs() < 1e-6);
}

#[tokio::test]
async fn chat_with_unknown_id_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = chat_app(&dir);

    let response = app
        .oneshot(post_chat(serde_json::json!({
            "conversation_id": "no-such-id",
            "message": "hello"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generation_failure_maps_to_bad_gateway_apology() {
    let dir = tempfile::tempdir().unwrap();
    let state = Arc::new(AppState {
        engine: engine_with(
            Arc::new(FixedClassifier {
                label: EmotionLabel::Joy,
                confidence: 0.88,
            }),
            Arc::new(FailingResponder),
        ),
        store: Mutex::new(temp_store(&dir)),
    });
    let app = router(state);

    let response = app
        .oneshot(post_chat(serde_json::json!({ "message": "hello" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("trouble responding"));
}

#[tokio::test]
async fn conversation_listing_and_idempotent_delete() {
    let dir = tempfile::tempdir().unwrap();
    let app = chat_app(&dir);

    // Start a conversation.
    let response = app
        .clone()
        .oneshot(post_chat(serde_json::json!({ "message": "hi there" })))
        .await
        .unwrap();
    let id = body_json(response).await["conversation_id"]
        .as_str()
        .unwrap()
        .to_string();

    // It shows up in the listing with both turns counted.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/conversations")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let listing = body_json(response).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
    assert_eq!(listing[0]["id"], id.as_str());
    assert_eq!(listing[0]["turn_count"], 2);

    // Full thread fetch works.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/conversations/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Delete twice; both succeed.
    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/conversations/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    // Thread is gone.
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/conversations/{}", id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_conversation_count() {
    let dir = tempfile::tempdir().unwrap();
    let app = chat_app(&dir);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["conversations"], 0);
}
