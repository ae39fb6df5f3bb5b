//! Response type produced by responders.
//!
//! # Design Decisions
//! - Responses are opaque to the dispatch core beyond their status code
//! - Reuses axum's response so handlers can build one with `IntoResponse`

/// HTTP response: status, headers and streaming body.
pub type Response = axum::response::Response;
