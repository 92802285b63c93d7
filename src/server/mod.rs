//! HTTP presentation boundary.
//!
//! Accepts raw user text and returns the reply plus the emotion metrics the
//! chat widget renders (label, confidence, intensity). The store sits behind
//! a `tokio::sync::Mutex`: at most one mutating operation per store instance
//! is in flight at a time, which is the concurrency contract the file-backed
//! index requires.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::chat::{ChatEngine, GENERATION_APOLOGY};
use crate::error::DudilError;
use crate::store::ConversationStore;

pub struct AppState {
    pub engine: ChatEngine,
    pub store: Mutex<ConversationStore>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Omit to start a new conversation.
    pub conversation_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    conversations: usize,
}

/// Build the API router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/conversations", get(list_conversations))
        .route("/api/conversations/{id}", get(get_conversation))
        .route("/api/conversations/{id}", delete(delete_conversation))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let bind_address = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{}", bind_address);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// POST /api/chat
///
/// One conversation turn. Creates a conversation when no id is supplied.
async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let mut store = state.store.lock().await;

    let conversation_id = match request.conversation_id {
        Some(id) => id,
        None => match store.create() {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "failed to create conversation");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": e.to_string() })),
                )
                    .into_response();
            }
        },
    };

    match state
        .engine
        .respond(&mut store, &conversation_id, &request.message)
        .await
    {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(DudilError::NotFound(id)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("conversation {} no longer exists", id) })),
        )
            .into_response(),
        Err(e @ DudilError::Generation(_)) => {
            warn!(error = %e, "generation failed; turn not recorded");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": GENERATION_APOLOGY })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "chat turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /api/conversations — summaries, most recently active first.
async fn list_conversations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.lock().await;
    Json(store.list())
}

/// GET /api/conversations/{id} — full thread for rendering.
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let store = state.store.lock().await;
    match store.get(&id) {
        Some(conversation) => (StatusCode::OK, Json(conversation.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("conversation {} no longer exists", id),
            }),
        )
            .into_response(),
    }
}

/// DELETE /api/conversations/{id} — idempotent; unknown ids succeed.
async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let mut store = state.store.lock().await;
    match store.delete(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!(error = %e, "failed to delete conversation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let store = state.store.lock().await;
    Json(HealthResponse {
        status: "ok",
        conversations: store.len(),
    })
}
