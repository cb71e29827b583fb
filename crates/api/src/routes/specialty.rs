use crate::error::{validation_error, ApiResult};
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/specialty", post(route_specialty))
        .with_state(state)
}

#[derive(Deserialize)]
struct SpecialtyRequest {
    symptoms: Option<String>,
}

/// Routes a symptom description to the medical specialty that should see
/// the patient. Unrecognized or failed triage falls back to the general
/// physician inside the router.
async fn route_specialty(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpecialtyRequest>,
) -> ApiResult<Json<Value>> {
    let symptoms = request
        .symptoms
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| validation_error("No symptoms provided"))?;

    let specialty = state.specialty.route(symptoms).await;

    Ok(Json(json!({
        "success": true,
        "specialty": specialty,
    })))
}
