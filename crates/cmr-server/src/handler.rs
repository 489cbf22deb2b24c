use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

use cmr_store::RepositoryInfo;
use cmr_types::CallContext;

use crate::error::ServerResult;
use crate::factory::ServiceFactory;

/// Shared state of every handler.
pub type AppState = Arc<ServiceFactory>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// A repository with its current object count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    #[serde(flatten)]
    pub info: RepositoryInfo,
    pub object_count: usize,
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Every repository in the registry.
pub async fn repositories_handler(
    State(state): State<AppState>,
) -> ServerResult<Json<Vec<RepositoryInfo>>> {
    let infos = state
        .repository_service()
        .repository_infos(&CallContext::anonymous())?;
    Ok(Json(infos))
}

/// One repository, 404 when unknown.
pub async fn repository_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<RepositorySummary>> {
    let info = state
        .repository_service()
        .repository_info(&CallContext::anonymous(), &id)?;
    let object_count = state.registry().object_store(&id)?.object_count()?;
    Ok(Json(RepositorySummary { info, object_count }))
}
