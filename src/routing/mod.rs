//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     Routes (route.rs, registration order)
//!     → create output per route (handler wrapped in middleware)
//!     → strip empty constants, prepend method segment
//!     → PathMatcher::register (matcher.rs / trie.rs)
//!     → freeze as immutable RoutingResponder (dispatcher.rs)
//!
//! Incoming Request (method, path)
//!     → dispatcher.rs (HEAD → GET, split path into segments)
//!     → PathMatcher::route (capture parameters into the request)
//!     → matched output, or NotFoundResponder
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment trie only)
//! - Deterministic: same input always matches same route
//! - Explicit NoMatch (typed 404 error) rather than silent default

pub mod dispatcher;
pub mod matcher;
pub mod route;
pub mod trie;

pub use dispatcher::{
    trie_router, CachedRouteResponder, DuplicatePolicy, NotFoundResponder, RegistrationError,
    RoutingResponder,
};
pub use matcher::{Parameters, PathMatcher};
pub use route::{parse_path, render_path, PathComponent, Route, Routes};
pub use trie::{TrieOptions, TrieRouter};
