//! Single-host reverse proxy handler.
//!
//! # Responsibilities
//! - Rewrite the inbound URI onto the backend base URL (path join, query merge)
//! - Strip hop-by-hop headers in both directions
//! - Append the client address to `X-Forwarded-For`
//! - Send through the fault-isolating transport
//!
//! # Design Decisions
//! - The inbound Host header is passed through unchanged
//! - Backends are always spoken to over HTTP/1.1, whatever the client used
//! - Backend responses are streamed back as-is

use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Response, Uri, Version};
use url::Url;

use crate::proxy::transport::{Abort, FaultIsolatingTransport};

/// Headers that only apply to a single connection and must not be forwarded.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "proxy-connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Forwards requests to one backend base URL.
#[derive(Clone)]
pub struct ForwardingHandler {
    target: Url,
    transport: FaultIsolatingTransport,
}

impl ForwardingHandler {
    pub fn new(target: Url, transport: FaultIsolatingTransport) -> Self {
        Self { target, transport }
    }

    /// The backend base URL.
    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Compute the URI a request for `original` is forwarded to.
    ///
    /// The backend's base path is joined with the request path using exactly
    /// one slash, and both query strings are kept.
    pub fn forwarded_uri(&self, original: &Uri) -> Result<Uri, Abort> {
        let mut authority = self.target.host_str().unwrap_or_default().to_string();
        if let Some(port) = self.target.port() {
            authority.push(':');
            authority.push_str(&port.to_string());
        }

        let path = join_paths(self.target.path(), original.path());
        let query = match (self.target.query(), original.query()) {
            (Some(base), Some(extra)) if !base.is_empty() && !extra.is_empty() => {
                Some(format!("{}&{}", base, extra))
            }
            (Some(base), _) if !base.is_empty() => Some(base.to_string()),
            (_, Some(extra)) if !extra.is_empty() => Some(extra.to_string()),
            _ => None,
        };

        let mut uri = format!("{}://{}{}", self.target.scheme(), authority, path);
        if let Some(query) = query {
            uri.push('?');
            uri.push_str(&query);
        }

        uri.parse::<Uri>()
            .map_err(|e| Abort::InvalidRequest(format!("`{}`: {}", uri, e)))
    }

    /// Forward `request` to `forwarded` and return the backend response.
    pub async fn forward(
        &self,
        request: Request<Body>,
        forwarded: Uri,
    ) -> Result<Response<Body>, Abort> {
        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        let (mut parts, body) = request.into_parts();
        parts.uri = forwarded;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers);
        if let Some(ip) = client_ip {
            append_forwarded_for(&mut parts.headers, ip);
        }

        let response = self
            .transport
            .send(Request::from_parts(parts, body))
            .await?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, body))
    }
}

fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}

/// Remove hop-by-hop headers, including any named in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

fn append_forwarded_for(headers: &mut HeaderMap, ip: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let value = if prior.is_empty() {
        ip.to_string()
    } else {
        format!("{}, {}", prior.join(", "), ip)
    };

    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}
