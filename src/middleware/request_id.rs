//! Request ID propagation.
//!
//! # Responsibilities
//! - Reuse a client-supplied `x-request-id` or generate a UUID v4
//! - Make the ID visible to downstream layers via the request headers
//! - Echo the ID on the response, including error responses rendered downstream
//!
//! # Design Decisions
//! - Runs early in the chain so every log line below it can carry the ID
//! - Oversized or non-visible-ASCII client IDs are replaced, not trusted

use axum::http::HeaderValue;
use futures_util::future::FutureExt;
use uuid::Uuid;

use crate::http::{Request, X_REQUEST_ID};
use crate::middleware::chain::{Middleware, Next};
use crate::responder::ResponseFuture;

const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation ID attached to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Assigns and echoes `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdMiddleware;

fn accept_client_id(value: &HeaderValue) -> Option<HeaderValue> {
    let text = value.to_str().ok()?;
    if text.is_empty() || text.len() > MAX_REQUEST_ID_LEN {
        return None;
    }
    Some(value.clone())
}

impl Middleware for RequestIdMiddleware {
    fn handle(&self, mut request: Request, next: Next) -> ResponseFuture {
        let id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(accept_client_id)
            .or_else(|| HeaderValue::from_str(&Uuid::new_v4().to_string()).ok());

        if let Some(id) = &id {
            request.headers_mut().insert(X_REQUEST_ID, id.clone());
            if let Ok(text) = id.to_str() {
                request.extensions_mut().insert(RequestId(text.to_string()));
            }
        }

        async move {
            let mut response = next.run(request).await?;
            if let Some(id) = id {
                response.headers_mut().insert(X_REQUEST_ID, id);
            }
            Ok::<_, crate::http::Error>(response)
        }
        .boxed()
    }
}
