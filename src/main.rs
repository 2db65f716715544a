//! Virtual host reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request ──▶ http::server ──▶ http::dispatcher ──▶ routing::registry
//!                                              │                     │
//!                                              │ miss                │ hit
//!                                              ▼                     ▼
//!                                        http::response       proxy::forward
//!                                        (404 page)                  │
//!                                              ▲                     ▼
//!                                              │ Abort        proxy::transport ──▶ Backend
//!                                              └──────────────(fault isolating)
//!                                                500 page
//! ```
//!
//! # Usage
//!
//! ```bash
//! vhost-proxy --config-file vhost.json
//! vhost-proxy -c vhost.toml --port 8080 -vv
//! ```

use std::path::PathBuf;

use clap::Parser;
use vhost_proxy::lifecycle::{signals, startup, Shutdown};
use vhost_proxy::observability::logging;

/// HTTP reverse proxy front-end for virtual host backends.
#[derive(Parser, Debug)]
#[command(name = "vhost-proxy")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON (or .toml) config file
    #[arg(short, long = "config-file", visible_alias = "config_file", env = "VHOST_CONFIG")]
    config_file: PathBuf,

    /// Listen port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn log_level(&self) -> Option<&'static str> {
        if self.quiet {
            return Some("error");
        }
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init_logging(args.log_level());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %args.config_file.display(),
        "vhost-proxy starting"
    );

    let server = match startup::prepare(&args.config_file, args.port) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            std::process::exit(1);
        }
    };

    let listener = match startup::bind(server.config().port).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            std::process::exit(1);
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::forward_to(shutdown));

    if let Err(e) = server.run(listener, server_shutdown).await {
        tracing::error!(error = %e, "Proxy server error");
        std::process::exit(1);
    }

    tracing::info!("Shutdown complete");
}
