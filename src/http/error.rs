//! Dispatch error taxonomy and error-to-response mapping.
//!
//! # Responsibilities
//! - Define the errors a responder chain may fail with
//! - Attach an HTTP status and a log severity to every error
//! - Render any error into a well-formed JSON response
//!
//! # Design Decisions
//! - `RouteNotFound` is expected traffic: 404, logged at DEBUG
//! - Handler failures stay opaque and are propagated unmodified
//! - Internal error details are hidden from clients unless explicitly exposed

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::Level;

/// Boxed error produced by handlers and middleware.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reason rendered for internal failures when details are not exposed.
const GENERIC_REASON: &str = "Something went wrong.";

/// Failure of a responder chain.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No registered route matched the request's method and path.
    #[error("route not found")]
    RouteNotFound,

    /// Deliberate abort with an explicit status (e.g. 401 from an auth middleware).
    #[error("{reason}")]
    Abort { status: StatusCode, reason: String },

    /// Opaque failure raised by a handler or middleware.
    #[error("{0}")]
    Handler(BoxError),
}

impl From<BoxError> for Error {
    fn from(err: BoxError) -> Self {
        Self::Handler(err)
    }
}

impl Error {
    /// Abort the request with the given status and reason.
    pub fn abort(status: StatusCode, reason: impl Into<String>) -> Self {
        Self::Abort {
            status,
            reason: reason.into(),
        }
    }

    /// Wrap an arbitrary handler error.
    pub fn handler<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Handler(Box::new(err))
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::RouteNotFound => StatusCode::NOT_FOUND,
            Error::Abort { status, .. } => *status,
            Error::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log severity for this error.
    ///
    /// Not-found and client errors must not be conflated with server faults.
    pub fn severity(&self) -> Level {
        match self {
            Error::RouteNotFound => Level::DEBUG,
            Error::Abort { status, .. } if status.is_server_error() => Level::ERROR,
            Error::Abort { .. } => Level::WARN,
            Error::Handler(_) => Level::ERROR,
        }
    }

    /// Client-facing reason text.
    pub fn reason(&self, expose_internal: bool) -> String {
        match self {
            Error::RouteNotFound => "Not Found".to_string(),
            Error::Abort { reason, .. } => reason.clone(),
            Error::Handler(e) if expose_internal => e.to_string(),
            Error::Handler(_) => GENERIC_REASON.to_string(),
        }
    }
}

/// JSON body rendered for failed requests.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: bool,
    reason: String,
}

/// Map an error into a response carrying its status and a JSON body.
pub fn render(err: &Error, expose_internal: bool) -> Response {
    let body = ErrorBody {
        error: true,
        reason: err.reason(expose_internal),
    };
    let payload = serde_json::to_vec(&body).unwrap_or_else(|_| b"{\"error\":true}".to_vec());

    let mut response = (err.status(), payload).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    response
}
