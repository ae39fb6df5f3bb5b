//! Per-request dispatch context.
//!
//! # Responsibilities
//! - Wrap the transport request (method, URI, headers, body)
//! - Own the parameter bag populated during route matching
//! - Carry the "matched route" slot read by outer decorators
//!
//! # Design Decisions
//! - A fresh context is built for every request; nothing is shared across requests
//! - The matched-route slot is a handle so that a decorator holding a clone can
//!   read it after the request itself has moved downstream

use std::sync::{Arc, Mutex, PoisonError};

use axum::body::Body;
use axum::http::{self, HeaderMap, Method, Uri};

use crate::routing::{Parameters, Route};

/// Header carrying the request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Slot recording which route the dispatcher resolved for a request.
///
/// Clones observe the same slot; it is never shared between requests.
#[derive(Debug, Clone, Default)]
pub struct MatchedRoute {
    slot: Arc<Mutex<Option<Arc<Route>>>>,
}

impl MatchedRoute {
    /// Record the matched route, replacing any earlier value.
    pub fn set(&self, route: Arc<Route>) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(route);
    }

    /// The matched route, if dispatch found one.
    pub fn get(&self) -> Option<Arc<Route>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// An inbound request moving through the responder chain.
#[derive(Debug)]
pub struct Request {
    inner: http::Request<Body>,
    parameters: Parameters,
    route: MatchedRoute,
}

impl Request {
    /// Wrap a transport request in a fresh dispatch context.
    pub fn new(inner: http::Request<Body>) -> Self {
        Self {
            inner,
            parameters: Parameters::default(),
            route: MatchedRoute::default(),
        }
    }

    /// Build a body-less request; mostly useful in tests.
    pub fn from_parts(method: Method, uri: &str) -> Result<Self, http::Error> {
        let inner = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())?;
        Ok(Self::new(inner))
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    /// The raw (still percent-encoded) URL path.
    pub fn path(&self) -> &str {
        self.inner.uri().path()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.inner.headers_mut()
    }

    /// Type map for middleware-provided request context.
    pub fn extensions(&self) -> &http::Extensions {
        self.inner.extensions()
    }

    pub fn extensions_mut(&mut self) -> &mut http::Extensions {
        self.inner.extensions_mut()
    }

    /// Parameters captured by the path matcher.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut Parameters {
        &mut self.parameters
    }

    /// The route resolved for this request, once the dispatcher has matched it.
    pub fn route(&self) -> Option<Arc<Route>> {
        self.route.get()
    }

    /// Handle to the matched-route slot, for decorators that outlive their
    /// ownership of the request.
    pub fn matched_route(&self) -> MatchedRoute {
        self.route.clone()
    }

    /// Consume the context, returning the transport request.
    pub fn into_inner(self) -> http::Request<Body> {
        self.inner
    }
}

impl From<http::Request<Body>> for Request {
    fn from(inner: http::Request<Body>) -> Self {
        Self::new(inner)
    }
}

/// Extension trait to extract the request ID.
pub trait RequestIdExt {
    /// Correlation ID attached by the request ID middleware, if any.
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for Request {
    fn request_id(&self) -> Option<&str> {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
    }
}
