//! Service layer of the in-memory content repository.
//!
//! Derives the permitted operations of every object for every caller,
//! exposes the five protocol services, and assembles them behind
//! defaulting decorators at startup.
//!
//! # Building Blocks
//!
//! - [`actions`] -- allowable-actions calculator
//! - [`services`] -- raw repository, navigation, object, versioning and
//!   discovery services
//! - [`wrapper`] -- decorators substituting default paging and depth
//! - [`ServiceFactory`] -- wires the services in dependency order
//! - [`RepositoryBootstrapper`] -- creates the configured repository and
//!   optionally fills it through [`ObjectGenerator`]
//! - [`CmrServer`] -- health and repository-info HTTP surface
//!
//! # Design Rules
//!
//! 1. Allowable actions are recomputed on every call from the object and
//!    its series lifecycle. Nothing is cached.
//! 2. Decorators only substitute missing values. Explicit values pass
//!    through unchanged.
//! 3. The demo filler runs as [`cmr_types::SystemContext`], which never
//!    reaches a protocol service.

pub mod actions;
pub mod bootstrap;
pub mod config;
pub mod data_objects;
pub mod error;
pub mod factory;
pub mod filler;
pub mod handler;
pub mod router;
pub mod server;
pub mod services;
pub mod wrapper;

pub use bootstrap::{BootstrapOutcome, RepositoryBootstrapper};
pub use config::{BootstrapConfig, FillerConfig, ParameterValue, Parameters, ServerConfig};
pub use data_objects::{Include, ObjectData};
pub use error::{ServerError, ServerResult};
pub use factory::ServiceFactory;
pub use filler::{FillSummary, ObjectGenerator};
pub use server::CmrServer;
pub use services::{
    DiscoveryService, NavigationService, ObjectService, Page, Paging, RepositoryService,
    VersioningService, VersioningState,
};
pub use wrapper::ServiceDefaults;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::util::ServiceExt;

    fn app() -> axum::Router {
        let params = [("repository.id", "A1"), ("filler.enable", "true")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let (services, _) = ServiceFactory::init(&params).unwrap();
        router::build_router(Arc::new(services))
    }

    async fn get(uri: &str) -> (u16, Value) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status().as_u16();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_endpoint() {
        let (status, body) = get("/v1/health").await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn repositories_endpoint() {
        let (status, body) = get("/v1/repositories").await;
        assert_eq!(status, 200);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["id"], "A1");
    }

    #[tokio::test]
    async fn repository_endpoint() {
        let (status, body) = get("/v1/repositories/A1").await;
        assert_eq!(status, 200);
        assert_eq!(body["id"], "A1");
        assert_eq!(body["object_count"], 5);
    }

    #[tokio::test]
    async fn unknown_repository_is_404() {
        let (status, body) = get("/v1/repositories/B1").await;
        assert_eq!(status, 404);
        assert_eq!(body["exception"], "objectNotFound");
    }
}
