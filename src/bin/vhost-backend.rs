//! Tiny demo backend for trying the proxy locally.
//!
//! ```bash
//! vhost-backend --port 9001 --saying "Hello from a"
//! vhost-backend --port 9002 --saying "Hello from b"
//! ```

use axum::{routing::any, Router};
use clap::Parser;
use std::net::SocketAddr;
use vhost_proxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "vhost-backend")]
#[command(about = "Backend that answers every request with a fixed message", long_about = None)]
struct Args {
    /// The response message
    #[arg(short, long, default_value = "Hi")]
    saying: String,

    /// Port to listen on
    #[arg(short, long)]
    port: u16,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logging::init_logging(None);

    let saying = args.saying;
    let handler = move || {
        let saying = saying.clone();
        async move { saying }
    };
    let app = Router::new()
        .route("/", any(handler.clone()))
        .route("/{*path}", any(handler));

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Unable to listen");
            std::process::exit(1);
        }
    };

    tracing::info!(address = %addr, "Backend listening");
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Backend server error");
        std::process::exit(1);
    }
}
