//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tracing layer)
//!     → dispatcher.rs (virtual host lookup, failure boundary)
//!     → [proxy::forward streams the backend response]
//!     → response.rs (canned 404 / 500 pages)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod response;
pub mod server;

pub use dispatcher::Dispatcher;
pub use server::HttpServer;
