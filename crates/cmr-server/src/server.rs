use std::sync::Arc;

use tokio::net::TcpListener;

use crate::bootstrap::BootstrapOutcome;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::factory::ServiceFactory;
use crate::router::build_router;

/// Diagnostic HTTP server over one bootstrapped registry.
pub struct CmrServer {
    config: ServerConfig,
    services: Arc<ServiceFactory>,
}

impl CmrServer {
    pub fn new(config: ServerConfig, services: Arc<ServiceFactory>) -> Self {
        Self { config, services }
    }

    /// Bootstrap the repositories named by `config`, then wrap them.
    pub fn bootstrap(config: ServerConfig) -> ServerResult<(Self, BootstrapOutcome)> {
        let (services, outcome) = ServiceFactory::init(&config.bootstrap_parameters())?;
        Ok((Self::new(config, Arc::new(services)), outcome))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn services(&self) -> &Arc<ServiceFactory> {
        &self.services
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(Arc::clone(&self.services))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("cmr server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let (server, outcome) = CmrServer::bootstrap(ServerConfig::default()).unwrap();
        assert_eq!(server.config().bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert!(outcome.created.is_none());
    }

    #[test]
    fn bootstrap_uses_config_parameters() {
        let config = ServerConfig::from_toml_str(
            r#"
            [parameters]
            "repository.id" = "A1"
            "filler.enable" = true
            "#,
        )
        .unwrap();
        let (server, outcome) = CmrServer::bootstrap(config).unwrap();
        assert_eq!(outcome.created.as_deref(), Some("A1"));
        assert_eq!(outcome.filled.unwrap().folders, 2);
        assert!(server.services().registry().contains("A1").unwrap());
        let _router = server.router();
    }
}
