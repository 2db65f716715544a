//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Send a prepared request to a backend and return its streaming response
//! - Collapse transport failures into a single [`Abort`] channel
//!
//! # Design Decisions
//! - Transports are `Arc<dyn Transport>` trait objects
//! - Response bodies are streamed, never buffered
//! - No request-level timeout; only an optional connect timeout

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;

/// Error produced by a [`Transport`].
pub type TransportError = Box<dyn StdError + Send + Sync>;

/// Sends a request to a backend.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, TransportError>>;
}

/// Reason a forwarded request was abandoned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Abort {
    /// The backend could not be reached or the exchange failed.
    #[error("proxy: {0}")]
    Transport(String),

    /// The request could not be rewritten for the backend.
    #[error("proxy: invalid forwarded request: {0}")]
    InvalidRequest(String),

    /// Forwarding code panicked.
    #[error("panic: {0}")]
    Panic(String),
}

impl Abort {
    /// Build an abort from an error, flattening its `source()` chain.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        Abort::Transport(describe(err))
    }

    /// Build an abort from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Abort::Panic(message)
    }
}

/// Render an error together with every error in its source chain.
pub fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !description.ends_with(&text) {
            description.push_str(": ");
            description.push_str(&text);
        }
        source = cause.source();
    }
    description
}

/// Production transport backed by the hyper-util pooled client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client<HttpConnector, Body>,
}

impl HttpTransport {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(timeouts.connect_secs.map(Duration::from_secs));

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(&TimeoutConfig::default())
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request<Body>) -> BoxFuture<'static, Result<Response<Body>, TransportError>> {
        let client = self.client.clone();
        Box::pin(async move {
            let response: Response<Incoming> = client.request(request).await?;
            let (parts, body) = response.into_parts();
            Ok(Response::from_parts(parts, Body::new(body)))
        })
    }
}

/// Decorates a [`Transport`] so that any failure surfaces as an [`Abort`].
///
/// Forwarding code then has exactly one failure type to report, which the
/// dispatcher's failure boundary handles together with panics.
#[derive(Clone)]
pub struct FaultIsolatingTransport {
    inner: Arc<dyn Transport>,
}

impl FaultIsolatingTransport {
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self { inner }
    }

    pub async fn send(&self, request: Request<Body>) -> Result<Response<Body>, Abort> {
        match self.inner.send(request).await {
            Ok(response) => Ok(response),
            Err(err) => {
                let abort = Abort::from_error(err.as_ref());
                tracing::debug!(error = %abort, "Transport failure");
                Err(abort)
            }
        }
    }
}
