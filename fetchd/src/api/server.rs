//! API server setup and shared state.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use ytdlp::Extractor;

use crate::api::routes;
use crate::error::{Error, Result};
use crate::jobs::{JobManager, JobStore};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Server bind address
    pub bind_address: String,
    /// Server port
    pub port: u16,
    /// Origins allowed for cross-origin requests; `*` allows any.
    pub allowed_origins: Vec<String>,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl ApiServerConfig {
    /// Load API server config from environment variables, falling back to
    /// defaults.
    ///
    /// Supported env vars:
    /// - `FETCHD_BIND_ADDRESS` (e.g. "0.0.0.0")
    /// - `FETCHD_PORT` (e.g. "8000")
    /// - `FETCHD_ALLOWED_ORIGINS` (comma-separated, `*` for any)
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(bind_address) = std::env::var("FETCHD_BIND_ADDRESS")
            && !bind_address.trim().is_empty()
        {
            config.bind_address = bind_address;
        }

        if let Ok(port) = std::env::var("FETCHD_PORT")
            && let Ok(parsed) = port.parse::<u16>()
        {
            config.port = parsed;
        }

        if let Ok(origins) = std::env::var("FETCHD_ALLOWED_ORIGINS")
            && !origins.trim().is_empty()
        {
            config.allowed_origins = origins
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
        }

        config
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server start time for uptime reporting.
    pub start_time: Instant,
    pub store: JobStore,
    pub manager: Arc<JobManager>,
    pub extractor: Arc<dyn Extractor>,
}

impl AppState {
    pub fn new(store: JobStore, manager: Arc<JobManager>, extractor: Arc<dyn Extractor>) -> Self {
        Self {
            start_time: Instant::now(),
            store,
            manager,
            extractor,
        }
    }
}

/// API server.
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
    cancel_token: CancellationToken,
}

impl ApiServer {
    /// Create a new API server.
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self {
            config,
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Get the cancellation token for graceful shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    fn cors_layer(&self) -> CorsLayer {
        if self.config.allowed_origins.iter().any(|origin| origin == "*") {
            return CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
        }

        let origins: Vec<HeaderValue> = self
            .config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }

    /// Build the router with all middleware and routes.
    fn build_router(&self) -> Router {
        routes::create_router(self.state.clone())
            .layer(self.cors_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Start the server and block until shutdown is requested.
    pub async fn run(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind_address, self.config.port)
            .parse()
            .map_err(|e| Error::config(format!("Invalid address: {e}")))?;

        let router = self.build_router();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Other(format!("Failed to bind {addr}: {e}")))?;

        tracing::info!("API server listening on http://{addr}");

        let cancel_token = self.cancel_token.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                tracing::info!("API server shutting down...");
            })
            .await
            .map_err(|e| Error::Other(format!("Server error: {e}")))?;

        Ok(())
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ApiServerConfig::default();
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.allowed_origins.len(), 2);
    }
}
