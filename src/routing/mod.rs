//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (Host header)
//!     → host.rs (extract virtual host)
//!     → registry.rs (exact lookup)
//!     → Return: matched Route or None
//!
//! Registry Construction (at startup):
//!     BackendConfig[]
//!     → Parse backend URLs (fatal on error)
//!     → Bind forwarding handlers
//!     → Freeze as immutable Registry
//! ```
//!
//! # Design Decisions
//! - Routes built at startup, immutable at runtime
//! - Deterministic: same Host always selects the same backend

pub mod host;
pub mod registry;

pub use host::virtual_host;
pub use registry::{Registry, RegistryError, Route};
