//! Middleware subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → metrics.rs   (MetricsResponder: wraps the whole router, times + labels)
//!     → router       (matches, then enters the route's chain)
//!     → error.rs     (outermost chain layer: errors → responses)
//!     → request_id.rs
//!     → ...user middleware...
//!     → handler
//! ```
//!
//! # Design Decisions
//! - Middleware only see `Request` and `Next`; they never know what else is in the chain
//! - chain.rs builds the nesting once at startup

pub mod chain;
pub mod error;
pub mod metrics;
pub mod request_id;

pub use chain::{from_fn, FnMiddleware, Middleware, MiddlewareChain, Next};
pub use error::ErrorMiddleware;
pub use metrics::{MetricsResponder, UNDEFINED_METHOD, UNDEFINED_ROUTE_PATH};
pub use request_id::{RequestId, RequestIdMiddleware};
