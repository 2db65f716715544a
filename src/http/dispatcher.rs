//! Per-request dispatch and failure isolation.
//!
//! # Request State Machine
//! ```text
//! Start → Lookup ─┬─ miss → NotFound (404, global NotFound override)
//!                 └─ hit  → Forwarding ─┬─ Ok    → Done (backend response)
//!                                       └─ Abort → ErrorEmitted (500, backend
//!                                                  override, else global)
//! ```
//!
//! # Design Decisions
//! - Config and registry are injected; no process-wide state
//! - Transport failures arrive as `Err(Abort)`; panics are caught by the
//!   same boundary and converted to `Abort::Panic`
//! - Once a response head is returned its body streams; a later body fault
//!   cannot be turned into an error page

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode, Uri};
use axum::response::Response;
use futures_util::FutureExt;

use crate::config::ServerConfig;
use crate::http::response::respond;
use crate::proxy::Abort;
use crate::routing::{virtual_host, Registry, Route};

/// Routes requests to the backend registered for their virtual host.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<ServerConfig>,
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(config: Arc<ServerConfig>, registry: Arc<Registry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle one request end to end. Never fails.
    pub async fn dispatch(&self, request: Request<Body>) -> Response {
        let host = virtual_host(&request).to_string();
        let original_url = format!("{}{}", host, request.uri().path());

        let route = match self.registry.lookup(&host) {
            Some(route) => route.clone(),
            None => {
                tracing::warn!(
                    host = %host,
                    original_url = %original_url,
                    "Not Found"
                );
                return respond(StatusCode::NOT_FOUND, self.config.not_found.as_ref()).await;
            }
        };

        let forwarded = route.handler.forwarded_uri(request.uri());
        let forwarded_url = forwarded
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        let outcome = match forwarded {
            Ok(uri) => self.forward(&route, request, uri).await,
            Err(abort) => Err(abort),
        };

        match outcome {
            Ok(response) => {
                tracing::debug!(
                    original_url = %original_url,
                    forwarded_url = %forwarded_url,
                    status = %response.status(),
                    "Proxied request"
                );
                response
            }
            Err(abort) => {
                tracing::error!(
                    original_url = %original_url,
                    forwarded_url = %forwarded_url,
                    error = %abort,
                    "Error proxying request"
                );
                let over = route
                    .backend
                    .internal_error
                    .as_ref()
                    .or(self.config.internal_error.as_ref());
                respond(StatusCode::INTERNAL_SERVER_ERROR, over).await
            }
        }
    }

    /// Run the route's handler inside the failure boundary.
    async fn forward(
        &self,
        route: &Route,
        request: Request<Body>,
        forwarded: Uri,
    ) -> Result<Response, Abort> {
        let attempt = route.handler.forward(request, forwarded);

        match AssertUnwindSafe(attempt).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(Abort::from_panic(payload)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, ErrorOverride};
    use crate::proxy::{Transport, TransportError};
    use futures_util::future::BoxFuture;
    use std::io::Write;

    /// Answers every request with the forwarded URI as body.
    struct Echo;

    impl Transport for Echo {
        fn send(&self, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, TransportError>> {
            let body = request.uri().to_string();
            Box::pin(async move { Ok(Response::new(Body::from(body))) })
        }
    }

    struct Refusing;

    impl Transport for Refusing {
        fn send(&self, _request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, TransportError>> {
            Box::pin(async { Err(TransportError::from("connection refused")) })
        }
    }

    struct Panicking;

    impl Transport for Panicking {
        fn send(&self, _request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, TransportError>> {
            panic!("backend exploded")
        }
    }

    fn dispatcher(config: ServerConfig, transport: Arc<dyn Transport>) -> Dispatcher {
        let registry = Registry::build(&config.backends, transport).unwrap();
        Dispatcher::new(Arc::new(config), Arc::new(registry))
    }

    fn request(host: &str, path: &str) -> Request<Body> {
        Request::builder()
            .uri(path)
            .header("host", host)
            .body(Body::empty())
            .unwrap()
    }

    fn override_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn single_backend() -> ServerConfig {
        let mut config = ServerConfig::default();
        config
            .backends
            .push(BackendConfig::new("a.example.com", "http://127.0.0.1:9001"));
        config
    }

    #[tokio::test]
    async fn test_forwards_to_registered_backend() {
        let dispatcher = dispatcher(single_backend(), Arc::new(Echo));

        let response = dispatcher.dispatch(request("a.example.com", "/hello?x=1")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "http://127.0.0.1:9001/hello?x=1");
    }

    #[tokio::test]
    async fn test_unknown_host_is_not_found() {
        let dispatcher = dispatcher(single_backend(), Arc::new(Echo));

        let response = dispatcher.dispatch(request("b.example.com", "/")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("nothing here matching that URL"));

        // Routing is case-sensitive and does not strip ports.
        let response = dispatcher.dispatch(request("A.example.com", "/")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = dispatcher.dispatch(request("a.example.com:80", "/")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_not_found_override() {
        let file = override_file("no such site");
        let mut config = single_backend();
        config.not_found = Some(ErrorOverride::new(file.path()).with_status(410));
        let dispatcher = dispatcher(config, Arc::new(Echo));

        for _ in 0..2 {
            let response = dispatcher.dispatch(request("b.example.com", "/")).await;
            assert_eq!(response.status(), StatusCode::GONE);
            assert_eq!(body_string(response).await, "no such site");
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_internal_error() {
        let dispatcher = dispatcher(single_backend(), Arc::new(Refusing));

        let response = dispatcher.dispatch(request("a.example.com", "/")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("Dang it, something broke"));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let dispatcher = dispatcher(single_backend(), Arc::new(Panicking));

        let response = dispatcher.dispatch(request("a.example.com", "/")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("Dang it, something broke"));

        // The dispatcher keeps serving afterwards.
        let response = dispatcher.dispatch(request("b.example.com", "/")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_internal_error_override_precedence() {
        let global = override_file("global failure");
        let local = override_file("backend b failure");

        let mut config = ServerConfig::default();
        config.internal_error = Some(ErrorOverride::new(global.path()).with_status(503));
        config
            .backends
            .push(BackendConfig::new("a.example.com", "http://127.0.0.1:9001"));
        config.backends.push(
            BackendConfig::new("b.example.com", "http://127.0.0.1:9002")
                .with_internal_error(ErrorOverride::new(local.path()).with_status(502)),
        );
        let dispatcher = dispatcher(config, Arc::new(Refusing));

        let response = dispatcher.dispatch(request("a.example.com", "/")).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_string(response).await, "global failure");

        let response = dispatcher.dispatch(request("b.example.com", "/")).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_string(response).await, "backend b failure");
    }

    #[tokio::test]
    async fn test_unreadable_backend_override_uses_builtin_page() {
        let mut config = ServerConfig::default();
        config.backends.push(
            BackendConfig::new("a.example.com", "http://127.0.0.1:9001")
                .with_internal_error(ErrorOverride::new("/nonexistent/a.html").with_status(502)),
        );
        let dispatcher = dispatcher(config, Arc::new(Refusing));

        let response = dispatcher.dispatch(request("a.example.com", "/")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_string(response).await.contains("<title>500 Internal Server Error</title>"));
    }

    #[tokio::test]
    async fn test_independent_instances() {
        let mut other = ServerConfig::default();
        other
            .backends
            .push(BackendConfig::new("b.example.com", "http://127.0.0.1:9002"));

        let first = dispatcher(single_backend(), Arc::new(Echo));
        let second = dispatcher(other, Arc::new(Echo));

        assert_eq!(first.dispatch(request("b.example.com", "/")).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(second.dispatch(request("b.example.com", "/")).await.status(), StatusCode::OK);
    }
}
