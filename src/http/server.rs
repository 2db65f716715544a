//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the backend registry from configuration
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (tracing)
//! - Serve on a bound listener until shutdown

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::http::dispatcher::Dispatcher;
use crate::proxy::{HttpTransport, Transport};
use crate::routing::{Registry, RegistryError};

/// HTTP server for the virtual host proxy.
pub struct HttpServer {
    router: Router,
    dispatcher: Dispatcher,
}

impl HttpServer {
    /// Create a server forwarding over the default HTTP transport.
    pub fn new(config: ServerConfig) -> Result<Self, RegistryError> {
        let transport = Arc::new(HttpTransport::new(&config.timeouts));
        Self::with_transport(config, transport)
    }

    /// Create a server forwarding over `transport`.
    pub fn with_transport(
        config: ServerConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, RegistryError> {
        let registry = Registry::build(&config.backends, transport)?;

        tracing::info!(
            virtual_hosts = registry.len(),
            not_found_override = config.not_found.is_some(),
            internal_error_override = config.internal_error.is_some(),
            "Backend registry built"
        );
        if registry.is_empty() {
            tracing::warn!("No virtual hosts configured, every request will be answered 404");
        }

        let dispatcher = Dispatcher::new(Arc::new(config), Arc::new(registry));
        let router = Self::build_router(dispatcher.clone());
        Ok(Self { router, dispatcher })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(dispatcher: Dispatcher) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(dispatcher)
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &ServerConfig {
        self.dispatcher.config()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch_handler(
    State(dispatcher): State<Dispatcher>,
    request: Request<Body>,
) -> Response {
    dispatcher.dispatch(request).await
}
