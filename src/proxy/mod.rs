//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Matched request
//!     → forward.rs (rewrite URI, strip hop-by-hop, X-Forwarded-For)
//!     → transport.rs (FaultIsolatingTransport → HttpTransport)
//!     → Ok(streaming backend response) | Err(Abort)
//! ```

pub mod forward;
pub mod transport;

pub use forward::ForwardingHandler;
pub use transport::{Abort, FaultIsolatingTransport, HttpTransport, Transport, TransportError};
