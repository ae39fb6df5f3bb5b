//! The responder capability.
//!
//! # Data Flow
//! ```text
//! Request
//!     → Responder::respond (handler, middleware chain, router, decorator...)
//!     → ResponseFuture
//!     → Ok(Response) | Err(Error)
//! ```
//!
//! # Design Decisions
//! - One trait with one async method; every handler, chain and fallback implements it
//! - Futures are boxed and `'static` so a responder never borrows itself into the call
//! - Decorators hold the wrapped responder by value or behind `Arc`, never by inheritance

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};

use crate::http::{Error, Request, Response};
use crate::routing::Route;

/// Deferred result of a responder invocation.
pub type ResponseFuture = BoxFuture<'static, Result<Response, Error>>;

/// Shared, type-erased responder.
pub type BoxResponder = Arc<dyn Responder>;

/// Asynchronously produce a response for a request, or fail.
pub trait Responder: Send + Sync + 'static {
    fn respond(&self, request: Request) -> ResponseFuture;
}

impl<R: Responder + ?Sized> Responder for Arc<R> {
    fn respond(&self, request: Request) -> ResponseFuture {
        (**self).respond(request)
    }
}

impl<R: Responder + ?Sized> Responder for Box<R> {
    fn respond(&self, request: Request) -> ResponseFuture {
        (**self).respond(request)
    }
}

/// A responder bound to the route it was registered for.
pub trait RouteResponder: Responder {
    fn route(&self) -> &Arc<Route>;
}

/// Adapts an async closure into a [`Responder`].
#[derive(Clone)]
pub struct FnResponder<F> {
    f: F,
}

/// Build a responder from an async function of the request.
///
/// ```ignore
/// let hello = responder_fn(|_req| async { Ok("hello".into_response()) });
/// ```
pub fn responder_fn<F, Fut>(f: F) -> FnResponder<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    FnResponder { f }
}

impl<F, Fut> Responder for FnResponder<F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn respond(&self, request: Request) -> ResponseFuture {
        (self.f)(request).boxed()
    }
}

/// Combinators available on every sized responder.
pub trait ResponderExt: Responder + Sized {
    /// Erase the concrete type behind an `Arc`.
    fn boxed(self) -> BoxResponder {
        Arc::new(self)
    }

    /// Wrap this responder with request metrics recorded into `sink`.
    fn adding_metrics(
        self,
        sink: Arc<dyn crate::observability::MetricsSink>,
    ) -> crate::middleware::MetricsResponder<Self> {
        crate::middleware::MetricsResponder::new(self, sink)
    }
}

impl<R: Responder> ResponderExt for R {}
