//! Startup orchestration.
//!
//! # Responsibilities
//! - Assemble the default middleware chain (errors, request IDs, user layers)
//! - Register routes into a frozen router
//! - Decorate the router with request metrics
//!
//! # Design Decisions
//! - Fail fast: a registration error aborts startup
//! - Everything is built before the listener accepts traffic

use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::middleware::{ErrorMiddleware, MiddlewareChain, RequestIdMiddleware};
use crate::observability::MetricsSink;
use crate::responder::{BoxResponder, ResponderExt};
use crate::routing::{trie_router, RegistrationError, Routes};

/// Prepend the built-in layers: error mapping outermost, then request IDs.
pub fn default_middleware(config: &DispatchConfig, user: MiddlewareChain) -> MiddlewareChain {
    let mut chain = user;
    chain.push_front(RequestIdMiddleware);
    chain.push_front(ErrorMiddleware::new(config.errors.expose_internal_errors));
    chain
}

/// Build the root responder: metrics → router → middleware → handlers.
pub fn build_responder(
    config: &DispatchConfig,
    mut routes: Routes,
    middleware: MiddlewareChain,
    sink: Arc<dyn MetricsSink>,
) -> Result<BoxResponder, RegistrationError> {
    routes.case_insensitive |= config.routing.case_insensitive;
    let chain = default_middleware(config, middleware);
    let router = trie_router(&routes, &chain, config.routing.duplicate_routes)?;

    tracing::info!(
        routes = routes.len(),
        middleware = chain.len(),
        case_insensitive = routes.case_insensitive,
        "Responder built"
    );
    Ok(router.adding_metrics(sink).boxed())
}
