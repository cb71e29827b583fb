pub mod assist;
pub mod captions;
pub mod doc;
pub mod health;
pub mod intake;
pub mod specialty;
pub mod speech;

#[cfg(test)]
pub(crate) mod testutil;

use crate::AppState;
use axum::Router;
use std::sync::Arc;

pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/health", health::routes())
        .merge(intake::routes(state.clone()))
        .merge(speech::routes(state.clone()))
        .merge(assist::routes(state.clone()))
        .merge(doc::routes(state.clone()))
        .merge(captions::routes(state.clone()))
        .merge(specialty::routes(state))
}

// Fallback handler for unmatched routes
pub async fn not_found_handler() -> axum::http::StatusCode {
    axum::http::StatusCode::NOT_FOUND
}
