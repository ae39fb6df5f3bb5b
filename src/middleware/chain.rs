//! Middleware chain composition.
//!
//! # Responsibilities
//! - Define the middleware capability (`handle(request, next)`)
//! - Nest an ordered middleware list around a terminal responder
//!
//! # Design Decisions
//! - Outermost-first ordering: the first middleware sees the request first
//!   and the response last
//! - A middleware may answer without calling `next` (short-circuit)
//! - Building a chain only allocates; nothing runs until it is invoked

use std::future::Future;
use std::sync::Arc;

use futures_util::future::FutureExt;

use crate::http::{Error, Request, Response};
use crate::responder::{BoxResponder, Responder, ResponseFuture};

/// A responder decorator that may delegate to the rest of the chain.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, request: Request, next: Next) -> ResponseFuture;

    /// Decorate `next`, producing a new responder.
    fn wrap(self: Arc<Self>, next: BoxResponder) -> BoxResponder
    where
        Self: Sized,
    {
        Arc::new(MiddlewareResponder {
            middleware: self,
            next,
        })
    }
}

/// The remainder of a chain, as seen from inside a middleware.
#[derive(Clone)]
pub struct Next {
    inner: BoxResponder,
}

impl Next {
    pub fn new(inner: BoxResponder) -> Self {
        Self { inner }
    }

    /// Pass the request on to the next responder.
    pub fn run(self, request: Request) -> ResponseFuture {
        self.inner.respond(request)
    }
}

struct MiddlewareResponder {
    middleware: Arc<dyn Middleware>,
    next: BoxResponder,
}

impl Responder for MiddlewareResponder {
    fn respond(&self, request: Request) -> ResponseFuture {
        self.middleware.handle(request, Next::new(self.next.clone()))
    }
}

/// Ordered list of middleware.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `middleware` as the innermost layer so far.
    pub fn push(&mut self, middleware: impl Middleware) -> &mut Self {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Insert `middleware` as the outermost layer.
    pub fn push_front(&mut self, middleware: impl Middleware) -> &mut Self {
        self.layers.insert(0, Arc::new(middleware));
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Nest every layer around `terminal`, first layer outermost.
    pub fn make_responder(&self, terminal: BoxResponder) -> BoxResponder {
        self.layers.iter().rev().fold(terminal, |next, middleware| {
            Arc::new(MiddlewareResponder {
                middleware: middleware.clone(),
                next,
            }) as BoxResponder
        })
    }
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.layers.len())
            .finish()
    }
}

/// Middleware built from an async closure.
pub struct FnMiddleware<F> {
    f: F,
}

/// Build middleware from `async fn(Request, Next) -> Result<Response, Error>`.
pub fn from_fn<F, Fut>(f: F) -> FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    FnMiddleware { f }
}

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn handle(&self, request: Request, next: Next) -> ResponseFuture {
        (self.f)(request, next).boxed()
    }
}
