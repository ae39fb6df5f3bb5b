//! route-dispatch demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum transport, timeout + trace)
//!                          │
//!                          ▼
//!                    MetricsResponder ──────────▶ MetricsSink (Prometheus)
//!                          │
//!                          ▼
//!                    RoutingResponder ── PathMatcher (trie)
//!                     │            │
//!              matched route     no match
//!                     │            │
//!                     ▼            ▼
//!         middleware chain   middleware chain
//!                     │            │
//!                     ▼            ▼
//!                  handler   NotFoundResponder (404)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use clap::Parser;
use tokio::net::TcpListener;

use route_dispatch::config::{load_config, DispatchConfig};
use route_dispatch::http::{HttpServer, Request};
use route_dispatch::lifecycle::{build_responder, signals, Shutdown};
use route_dispatch::middleware::MiddlewareChain;
use route_dispatch::observability::{logging, metrics, RecorderSink};
use route_dispatch::routing::Routes;
use route_dispatch::{responder_fn, Error};

#[derive(Parser, Debug)]
#[command(name = "route-dispatch", version, about = "HTTP request-dispatch demo server")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

fn demo_routes() -> Routes {
    let mut routes = Routes::new();
    routes.get(
        "/",
        responder_fn(|_req| async { Ok("route-dispatch is running\n".into_response()) }),
    );
    routes.get(
        "/widgets/:id",
        responder_fn(|req: Request| async move {
            let id: u64 = req
                .parameters()
                .get_as("id")
                .ok_or_else(|| Error::abort(StatusCode::BAD_REQUEST, "widget id must be numeric"))?;
            Ok::<_, Error>(format!("widget {id}\n").into_response())
        }),
    );
    routes.get(
        "/files/**path",
        responder_fn(|req: Request| async move {
            let path = req.parameters().get("path").unwrap_or_default().to_string();
            Ok(format!("file {path}\n").into_response())
        }),
    );
    routes.post(
        "/echo",
        responder_fn(|req: Request| async move {
            let body = axum::body::to_bytes(req.into_inner().into_body(), 64 * 1024)
                .await
                .map_err(|e| Error::abort(StatusCode::PAYLOAD_TOO_LARGE, e.to_string()))?;
            Ok::<_, Error>(body.into_response())
        }),
    );
    routes
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DispatchConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("logging already initialized: {e}");
    }
    tracing::info!("route-dispatch v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let responder = build_responder(&config, demo_routes(), MiddlewareChain::new(), Arc::new(RecorderSink))?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, responder);
    let serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::trigger_on_signal(&shutdown).await;
    serving.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
