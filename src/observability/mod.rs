//! Observability subsystem.
//!
//! All subsystems emit structured `tracing` events; `logging.rs` installs
//! the subscriber that formats them to stdout.

pub mod logging;
