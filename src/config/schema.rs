//! Configuration schema definitions.
//!
//! Field names follow the established on-disk format (`Port`, `NotFound`,
//! `proxy`, `URL`, `Backend`, ...). Lower-case and snake_case spellings are
//! accepted as aliases.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the virtual host proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ServerConfig {
    /// Port to listen on (all interfaces).
    #[serde(rename = "Port", alias = "port", default)]
    pub port: u16,

    /// Response served when no backend matches the Host header.
    #[serde(
        rename = "NotFound",
        alias = "notFound",
        alias = "not_found",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub not_found: Option<ErrorOverride>,

    /// Response served when forwarding fails and the backend has no override.
    #[serde(
        rename = "InternalError",
        alias = "internalError",
        alias = "internal_error",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub internal_error: Option<ErrorOverride>,

    /// Virtual host definitions, in registration order.
    #[serde(rename = "proxy", alias = "Proxy", alias = "proxies", default)]
    pub backends: Vec<BackendConfig>,

    /// Outbound connection settings.
    #[serde(rename = "Timeouts", alias = "timeouts", default)]
    pub timeouts: TimeoutConfig,
}

/// A file-backed canned response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorOverride {
    /// Path to the response body.
    #[serde(rename = "file")]
    pub file: PathBuf,

    /// Status code to send instead of the default one. `0` means unset.
    #[serde(
        rename = "StatusCode",
        alias = "statusCode",
        alias = "status_code",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<u16>,
}

impl ErrorOverride {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            status_code: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// The configured status code, treating `0` as absent.
    pub fn status_override(&self) -> Option<u16> {
        self.status_code.filter(|code| *code != 0)
    }
}

/// A backend serving one virtual host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Virtual host this backend serves (exact Host header value).
    #[serde(rename = "URL", alias = "url", alias = "host")]
    pub host: String,

    /// Base URL requests are forwarded to (e.g. "http://127.0.0.1:9001").
    #[serde(rename = "Backend", alias = "backend")]
    pub backend: String,

    /// Response served when forwarding to this backend fails.
    #[serde(
        rename = "InternalError",
        alias = "internalError",
        alias = "internal_error",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub internal_error: Option<ErrorOverride>,
}

impl BackendConfig {
    pub fn new(host: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            backend: backend.into(),
            internal_error: None,
        }
    }

    pub fn with_internal_error(mut self, internal_error: ErrorOverride) -> Self {
        self.internal_error = Some(internal_error);
        self
    }
}

/// Outbound timeout configuration.
///
/// No request-level timeout exists; a hung backend only holds its own
/// request.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TimeoutConfig {
    /// TCP connect timeout towards backends, in seconds.
    #[serde(
        rename = "ConnectSecs",
        alias = "connectSecs",
        alias = "connect_secs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub connect_secs: Option<u64>,
}
