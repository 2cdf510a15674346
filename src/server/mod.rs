// Mediating service
//
// HTTP surface between the agent (or any other caller) and the bridge:
// one POST route per tool category, each of which validates its body,
// translates it into a command, and makes exactly one bridge call.

mod handlers;

pub use handlers::{create_router, AppError, AppState};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::bridge::BridgeClient;

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:5000")
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
        }
    }
}

/// The mediating HTTP server. Stateless across requests; the only shared
/// state is the bridge client and its single guarded connection.
pub struct MediatorServer {
    bridge: Arc<BridgeClient>,
    config: ServerConfig,
}

impl MediatorServer {
    pub fn new(bridge: BridgeClient, config: ServerConfig) -> Self {
        Self {
            bridge: Arc::new(bridge),
            config,
        }
    }

    /// Start serving until the process exits.
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.config.bind_address))?;

        let state = Arc::new(AppState {
            bridge: Arc::clone(&self.bridge),
        });
        let app = create_router(state).layer(TraceLayer::new_for_http());

        tracing::info!(%addr, bridge = %self.bridge.config().addr(), "Starting mediating service");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
