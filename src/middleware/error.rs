//! Error-to-response middleware.
//!
//! Converts a failed downstream result into a rendered error response and logs it
//! at the error's own severity, so routine 404s stay at DEBUG while handler faults
//! surface at ERROR.

use futures_util::future::FutureExt;

use crate::http::error::{render, Error};
use crate::http::{Request, RequestIdExt};
use crate::middleware::chain::{Middleware, Next};
use crate::responder::ResponseFuture;

/// Maps errors to responses. Install it as the outermost chain layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorMiddleware {
    expose_internal: bool,
}

impl ErrorMiddleware {
    /// `expose_internal` renders handler error messages verbatim; keep it off in production.
    pub fn new(expose_internal: bool) -> Self {
        Self { expose_internal }
    }
}

impl Middleware for ErrorMiddleware {
    fn handle(&self, request: Request, next: Next) -> ResponseFuture {
        let expose_internal = self.expose_internal;
        let method = request.method().clone();
        let path = request.path().to_string();
        let request_id = request.request_id().unwrap_or("unknown").to_string();

        async move {
            match next.run(request).await {
                Ok(response) => Ok(response),
                Err(err) => {
                    log_error(&err, &request_id, &method, &path);
                    Ok(render(&err, expose_internal))
                }
            }
        }
        .boxed()
    }
}

fn log_error(err: &Error, request_id: &str, method: &axum::http::Method, path: &str) {
    let status = err.status().as_u16();
    match err.severity() {
        tracing::Level::TRACE => tracing::trace!(request_id, %method, path, status, error = %err, "Request failed"),
        tracing::Level::DEBUG => tracing::debug!(request_id, %method, path, status, error = %err, "Request failed"),
        tracing::Level::INFO => tracing::info!(request_id, %method, path, status, error = %err, "Request failed"),
        tracing::Level::WARN => tracing::warn!(request_id, %method, path, status, error = %err, "Request failed"),
        tracing::Level::ERROR => tracing::error!(request_id, %method, path, status, error = %err, "Request failed"),
    }
}
