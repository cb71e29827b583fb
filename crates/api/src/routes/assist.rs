use crate::error::{validation_error, ApiResult};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/assist", post(assist))
        .with_state(state)
}

#[derive(Deserialize)]
struct AssistRequest {
    prompt: Option<String>,
    session_id: Option<String>,
}

/// Free-text chat with per-session memory. Separate from the intake
/// flow, which threads its state through the client instead.
async fn assist(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AssistRequest>,
) -> ApiResult<Json<Value>> {
    let message = request
        .prompt
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| {
            validation_error("No prompt provided. Please include a 'prompt' field with your message.")
        })?;

    let reply = state
        .assistant
        .chat(request.session_id.as_deref(), message)
        .await?;

    Ok(Json(json!({
        "success": true,
        "response": reply.response,
        "session_id": reply.session_id,
    })))
}
