use axum::{routing::get, Router};

use crate::handler::{self, AppState};

/// Build the axum router over an assembled service set.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/repositories", get(handler::repositories_handler))
        .route("/v1/repositories/:id", get(handler::repository_handler))
        .with_state(state)
}
