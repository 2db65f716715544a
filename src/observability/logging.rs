//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Pick the log level from CLI, falling back to `RUST_LOG`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Dependency noise (hyper) is capped at warn unless RUST_LOG says otherwise

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LEVEL: &str = "info";

/// Filter directives used when `RUST_LOG` is not set.
pub fn default_directives(level: &str) -> String {
    format!(
        "vhost_proxy={level},vhost_backend={level},tower_http={level},hyper=warn",
        level = level
    )
}

/// Install the global subscriber.
///
/// An explicit `level_override` (from the CLI) wins over `RUST_LOG`.
pub fn init_logging(level_override: Option<&str>) {
    let filter = match level_override {
        Some(level) => EnvFilter::new(default_directives(level)),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(DEFAULT_LEVEL))),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
