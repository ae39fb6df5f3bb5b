//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum router that hands every request to the root responder
//! - Wire up transport middleware (timeout, trace)
//! - Bind server to listener and shut down gracefully
//! - Guarantee an answer: a failure escaping the responder is rendered here
//!
//! # Design Decisions
//! - axum contributes transport only; routing is done by our own responder
//!   installed as the fallback service
//! - A fresh dispatch context is created per request

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::DispatchConfig;
use crate::http::error::render;
use crate::http::Request;
use crate::lifecycle::shutdown;
use crate::responder::{BoxResponder, Responder};

/// Application state injected into the fallback handler.
#[derive(Clone)]
struct ServerState {
    responder: BoxResponder,
    expose_internal: bool,
}

/// HTTP server exposing a root responder.
pub struct HttpServer {
    router: Router,
    config: Arc<DispatchConfig>,
}

impl HttpServer {
    /// Create a new HTTP server dispatching to `responder`.
    pub fn new(config: DispatchConfig, responder: BoxResponder) -> Self {
        let state = ServerState {
            responder,
            expose_internal: config.errors.expose_internal_errors,
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config: Arc::new(config),
        }
    }

    /// Build the axum router with all transport layers.
    #[allow(deprecated)]
    fn build_router(config: &DispatchConfig, state: ServerState) -> Router {
        Router::new()
            .fallback(dispatch)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown_rx` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// The assembled axum router, for embedding or in-process testing.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Fallback handler: every request goes through the root responder.
async fn dispatch(State(state): State<ServerState>, request: axum::extract::Request) -> Response {
    let request = Request::new(request);
    let method = request.method().clone();
    let path = request.path().to_string();

    match state.responder.respond(request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::warn!(%method, path = %path, status = err.status().as_u16(), error = %err, "Unhandled responder error");
            render(&err, state.expose_internal).into_response()
        }
    }
}
