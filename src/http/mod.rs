//! HTTP surface of the dispatch core.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum/hyper, timeout + trace layers)
//!     → request.rs (wrap in a per-request dispatch context)
//!     → [root responder: metrics → router → middleware → handler]
//!     → error.rs (map a failed chain to a status + JSON body)
//!     → response.rs
//!     → Send to client
//! ```

pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use error::{BoxError, Error};
pub use request::{MatchedRoute, Request, RequestIdExt, X_REQUEST_ID};
pub use response::Response;
pub use server::HttpServer;
