//! Virtual host lookup.
//!
//! # Responsibilities
//! - Parse every backend URL once at startup (fatal on error)
//! - Bind each virtual host to its descriptor and forwarding handler
//! - Look up the route for an incoming Host value
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - One map from host to `Route`, so descriptor and handler never diverge
//! - O(1) exact, case-sensitive host lookup via HashMap
//! - Duplicate hosts: last entry wins, with a warning

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use crate::config::BackendConfig;
use crate::proxy::{FaultIsolatingTransport, ForwardingHandler, Transport};

/// Error raised while building the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to parse backend URL `{url}` for `{host}`: {source}")]
    InvalidUrl {
        host: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("backend URL `{url}` for `{host}` has no host")]
    MissingHost { host: String, url: String },

    #[error("backend URL `{url}` for `{host}` uses scheme `{scheme}`; backends must be plain http, TLS to backends is not supported")]
    UnsupportedScheme {
        host: String,
        url: String,
        scheme: String,
    },
}

/// A registered virtual host: its descriptor and the handler serving it.
pub struct Route {
    pub backend: BackendConfig,
    pub handler: ForwardingHandler,
}

/// Immutable mapping from virtual host to [`Route`].
pub struct Registry {
    routes: HashMap<String, Arc<Route>>,
}

impl Registry {
    /// Build the registry from backend definitions, in order.
    ///
    /// Every handler shares `transport`, wrapped in a [`FaultIsolatingTransport`].
    pub fn build(
        backends: &[BackendConfig],
        transport: Arc<dyn Transport>,
    ) -> Result<Self, RegistryError> {
        let transport = FaultIsolatingTransport::new(transport);
        let mut routes = HashMap::with_capacity(backends.len());

        for backend in backends {
            let target = parse_backend_url(backend)?;
            let handler = ForwardingHandler::new(target, transport.clone());

            tracing::debug!(
                host = %backend.host,
                backend = %backend.backend,
                "Registering virtual host"
            );

            let route = Arc::new(Route {
                backend: backend.clone(),
                handler,
            });
            if let Some(previous) = routes.insert(backend.host.clone(), route) {
                tracing::warn!(
                    host = %backend.host,
                    replaced = %previous.backend.backend,
                    backend = %backend.backend,
                    "Duplicate virtual host, last definition wins"
                );
            }
        }

        Ok(Self { routes })
    }

    /// Look up the route registered for `host`.
    pub fn lookup(&self, host: &str) -> Option<&Arc<Route>> {
        self.routes.get(host)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn parse_backend_url(backend: &BackendConfig) -> Result<Url, RegistryError> {
    let url = Url::parse(&backend.backend).map_err(|source| RegistryError::InvalidUrl {
        host: backend.host.clone(),
        url: backend.backend.clone(),
        source,
    })?;

    if url.scheme() != "http" {
        return Err(RegistryError::UnsupportedScheme {
            host: backend.host.clone(),
            url: backend.backend.clone(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(RegistryError::MissingHost {
            host: backend.host.clone(),
            url: backend.backend.clone(),
        });
    }

    Ok(url)
}
