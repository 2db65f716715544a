//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the backend registry (fatal on malformed backend URLs)
//! - Bind the listening port
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener is bound last (traffic only when ready)

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError};
use crate::http::HttpServer;
use crate::routing::RegistryError;

/// Error that prevents the proxy from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("unable to listen on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Load the config at `path` and build a server from it.
///
/// `port_override` replaces the configured port.
pub fn prepare(path: &Path, port_override: Option<u16>) -> Result<HttpServer, StartupError> {
    let mut config = load_config(path)?;
    if let Some(port) = port_override {
        tracing::info!(port, "Port overridden via CLI");
        config.port = port;
    }

    tracing::info!(
        config_path = %path.display(),
        port = config.port,
        backends = config.backends.len(),
        "Configuration loaded"
    );

    Ok(HttpServer::new(config)?)
}

/// Bind the proxy listener on all interfaces.
pub async fn bind(port: u16) -> Result<TcpListener, StartupError> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { port, source })
}
