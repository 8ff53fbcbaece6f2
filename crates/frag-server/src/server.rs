use frag_model::{FragmentService, FragmentStores};
use tokio::net::TcpListener;

use crate::auth::provider_from_config;
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Fragment HTTP server.
pub struct FragmentServer {
    config: ServerConfig,
    service: FragmentService,
}

impl FragmentServer {
    /// Open the configured store and build a server around it.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let stores = FragmentStores::from_config(&config.store)?;
        Ok(Self::with_service(config, FragmentService::new(stores)))
    }

    pub fn with_service(config: ServerConfig, service: FragmentService) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let state = AppState::new(
            self.service.clone(),
            provider_from_config(&self.config.auth),
            self.config.base_url(),
        );
        build_router(state, self.config.max_body_bytes)
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("fragments server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
