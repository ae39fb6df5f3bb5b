//! HTTP request-dispatch core.
//!
//! Matches requests against registered routes, runs the matched handler through
//! an ordered middleware chain, records request metrics with bounded labels, and
//! fails unmatched requests with a typed 404.

// Core
pub mod http;
pub mod responder;
pub mod routing;

// Composition
pub mod middleware;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::DispatchConfig;
pub use http::{Error, HttpServer, Request, Response};
pub use lifecycle::Shutdown;
pub use middleware::{Middleware, MiddlewareChain, Next};
pub use responder::{responder_fn, BoxResponder, Responder, ResponderExt};
pub use routing::{Route, Routes};
