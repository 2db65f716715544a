//! Virtual host reverse proxy library.
//!
//! Requests are routed by their `Host` header to exactly one backend per
//! virtual host. Unknown hosts get a 404 page, backend failures a 500 page;
//! both can be replaced by files from the configuration.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;

pub use config::schema::ServerConfig;
pub use http::{Dispatcher, HttpServer};
pub use lifecycle::Shutdown;
pub use routing::Registry;
