//! Virtual host extraction.
//!
//! # Design Decisions
//! - The routing key is the Host header, exactly as sent
//! - No case folding, no port stripping, no wildcard matching
//! - Requests without a Host header fall back to the URI authority
//!   (absolute-form targets and HTTP/2 `:authority`)

use axum::body::Body;
use axum::http::{header, Request};

/// Returns the virtual host a request is addressed to.
pub fn virtual_host(req: &Request<Body>) -> &str {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .unwrap_or("")
}
