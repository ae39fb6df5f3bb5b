//! Route registration and per-request dispatch.
//!
//! # Responsibilities
//! - Register every route with the path matcher (method as first segment)
//! - Resolve a request to its route output or to the not-found responder
//! - Record the matched route on the request for outer decorators
//!
//! # Design Decisions
//! - Registration takes `&mut self`; once shared behind `Arc` the router is frozen,
//!   so lookups never race with writers
//! - HEAD is matched as GET; body handling for HEAD belongs to the transport
//! - Duplicate (method, path) registrations follow an explicit [`DuplicatePolicy`]
//! - The not-found responder runs through the same middleware chain as routes

use std::sync::Arc;

use axum::http::Method;
use futures_util::future::{self, FutureExt};
use serde::{Deserialize, Serialize};

use crate::http::{Error, Request};
use crate::middleware::MiddlewareChain;
use crate::responder::{BoxResponder, Responder, ResponseFuture, RouteResponder};
use crate::routing::matcher::PathMatcher;
use crate::routing::route::{render_path, PathComponent, Route, Routes};
use crate::routing::trie::{TrieOptions, TrieRouter};

/// What to do when two routes share a method and path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// The later registration replaces the earlier one (logged).
    #[default]
    Replace,
    /// Fail registration.
    Reject,
}

/// Error raised while registering routes.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("duplicate route: {method} {path}")]
    DuplicateRoute { method: Method, path: String },
}

/// Terminal responder for requests no route matched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFoundResponder;

impl Responder for NotFoundResponder {
    fn respond(&self, _request: Request) -> ResponseFuture {
        future::ready(Err(Error::RouteNotFound)).boxed()
    }
}

/// Matcher output pairing a route with its middleware-wrapped handler.
#[derive(Clone)]
pub struct CachedRouteResponder {
    route: Arc<Route>,
    responder: BoxResponder,
}

impl CachedRouteResponder {
    pub fn new(route: Arc<Route>, responder: BoxResponder) -> Self {
        Self { route, responder }
    }
}

impl Responder for CachedRouteResponder {
    fn respond(&self, request: Request) -> ResponseFuture {
        self.responder.respond(request)
    }
}

impl RouteResponder for CachedRouteResponder {
    fn route(&self) -> &Arc<Route> {
        &self.route
    }
}

/// Top-level responder dispatching through a [`PathMatcher`].
pub struct RoutingResponder<M> {
    matcher: M,
    not_found: BoxResponder,
}

impl<M> RoutingResponder<M>
where
    M: PathMatcher,
    M::Output: RouteResponder,
{
    /// Wrap `matcher`; unmatched requests run `middleware` around the not-found responder.
    ///
    /// No routes are registered.
    pub fn new(matcher: M, middleware: &MiddlewareChain) -> Self {
        Self {
            matcher,
            not_found: middleware.make_responder(Arc::new(NotFoundResponder)),
        }
    }

    /// Build a router and register `routes` with outputs from `create_output`.
    pub fn routed<F>(
        matcher: M,
        middleware: &MiddlewareChain,
        routes: &Routes,
        policy: DuplicatePolicy,
        create_output: F,
    ) -> Result<Self, RegistrationError>
    where
        F: FnMut(&Arc<Route>) -> M::Output,
    {
        let mut router = Self::new(matcher, middleware);
        router.bootstrap(routes, policy, create_output)?;
        Ok(router)
    }

    /// Register every route in order.
    ///
    /// Empty constant components are stripped and the method name is prepended
    /// as the first segment.
    pub fn bootstrap<F>(
        &mut self,
        routes: &Routes,
        policy: DuplicatePolicy,
        mut create_output: F,
    ) -> Result<(), RegistrationError>
    where
        F: FnMut(&Arc<Route>) -> M::Output,
    {
        for route in routes.all() {
            let output = create_output(route);

            let mut path = Vec::with_capacity(route.path().len() + 1);
            path.push(PathComponent::Constant(route.method().as_str().to_string()));
            path.extend(route.path().iter().filter(|c| !c.is_empty_constant()).cloned());

            if self.matcher.register(output, &path).is_some() {
                let template = render_path(&path[1..]);
                match policy {
                    DuplicatePolicy::Replace => {
                        tracing::warn!(method = %route.method(), path = %template, "Overriding duplicate route");
                    }
                    DuplicatePolicy::Reject => {
                        return Err(RegistrationError::DuplicateRoute {
                            method: route.method().clone(),
                            path: template,
                        });
                    }
                }
            }
        }

        tracing::info!(routes = routes.len(), "Routes registered");
        Ok(())
    }

    /// Resolve the request's method and path, capturing parameters into it.
    fn lookup(&self, request: &mut Request) -> Option<&M::Output> {
        let method = if request.method() == Method::HEAD {
            Method::GET
        } else {
            request.method().clone()
        };
        let uri = request.uri().clone();

        let mut segments: Vec<&str> = Vec::with_capacity(8);
        segments.push(method.as_str());
        segments.extend(uri.path().split('/').filter(|s| !s.is_empty()));

        self.matcher.route(&segments, request.parameters_mut())
    }
}

impl<M> Responder for RoutingResponder<M>
where
    M: PathMatcher,
    M::Output: RouteResponder,
{
    fn respond(&self, mut request: Request) -> ResponseFuture {
        match self.lookup(&mut request) {
            Some(output) => {
                tracing::trace!(route = %output.route(), path = %request.path(), "Route matched");
                request.matched_route().set(output.route().clone());
                output.respond(request)
            }
            None => {
                tracing::debug!(method = %request.method(), path = %request.path(), "No route matched");
                self.not_found.respond(request)
            }
        }
    }
}

/// Build the default trie-backed router.
///
/// Each route's handler is wrapped in `middleware` once, at registration.
pub fn trie_router(
    routes: &Routes,
    middleware: &MiddlewareChain,
    policy: DuplicatePolicy,
) -> Result<RoutingResponder<TrieRouter<CachedRouteResponder>>, RegistrationError> {
    let options = TrieOptions {
        case_insensitive: routes.case_insensitive,
    };
    RoutingResponder::routed(
        TrieRouter::new(options),
        middleware,
        routes,
        policy,
        |route| CachedRouteResponder::new(route.clone(), middleware.make_responder(route.responder().clone())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::Response;
    use crate::middleware::metrics::tests::CapturingSink;
    use crate::middleware::{from_fn, ErrorMiddleware, MetricsResponder, Next, UNDEFINED_ROUTE_PATH};
    use crate::observability::metrics::{REQUESTS_TOTAL, REQUEST_DURATION_SECONDS};
    use crate::responder::{responder_fn, ResponderExt};
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    /// Handler answering with the name it was registered under plus its parameters.
    fn named(name: &'static str) -> impl Responder {
        responder_fn(move |req: Request| async move {
            let mut params: Vec<String> = req
                .parameters()
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            params.sort();
            let body = format!("{name} {}", params.join(","));
            Ok((StatusCode::OK, [("x-handler", name)], body).into_response())
        })
    }

    fn handler_of(res: &Response) -> &str {
        res.headers()
            .get("x-handler")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    async fn body_of(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn req(method: Method, path: &str) -> Request {
        Request::from_parts(method, path).unwrap()
    }

    fn router(routes: &Routes) -> RoutingResponder<TrieRouter<CachedRouteResponder>> {
        trie_router(routes, &MiddlewareChain::new(), DuplicatePolicy::Replace).unwrap()
    }

    /// Captures the matched route as seen from inside the handler.
    fn spy(slot: Arc<std::sync::Mutex<Option<Arc<Route>>>>) -> impl Responder {
        responder_fn(move |req: Request| {
            *slot.lock().unwrap() = req.route();
            async { Ok(StatusCode::OK.into_response()) }
        })
    }

    #[tokio::test]
    async fn test_registered_route_dispatches_and_sets_slot() {
        let seen = Arc::default();
        let mut routes = Routes::new();
        routes.post("/users/:id/avatar", spy(Arc::clone(&seen)));
        let router = router(&routes);

        let res = router.respond(req(Method::POST, "/users/5/avatar")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let matched = seen.lock().unwrap().clone().expect("route recorded");
        assert!(Arc::ptr_eq(&matched, &routes.all()[0]));
    }

    #[tokio::test]
    async fn test_unregistered_pairs_fail_with_route_not_found() {
        let mut routes = Routes::new();
        routes.get("/users", named("list"));
        let router = router(&routes);

        for (method, path) in [
            (Method::POST, "/users"),
            (Method::GET, "/users/1"),
            (Method::GET, "/"),
            (Method::DELETE, "/nothing/here"),
        ] {
            let err = router.respond(req(method, path)).await.unwrap_err();
            assert!(matches!(err, Error::RouteNotFound));
            assert_eq!(err.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_head_matches_get_route() {
        let mut routes = Routes::new();
        routes.get("/status", named("status"));
        let router = router(&routes);

        let res = router.respond(req(Method::HEAD, "/status")).await.unwrap();
        assert_eq!(handler_of(&res), "status");
    }

    #[tokio::test]
    async fn test_empty_segments_are_ignored() {
        let mut routes = Routes::new();
        routes.add(Route::new(
            Method::GET,
            vec![
                PathComponent::Constant("users".into()),
                PathComponent::Constant(String::new()),
                PathComponent::Constant("profile".into()),
            ],
            named("profile"),
        ));
        let router = router(&routes);

        for path in ["/users/profile", "/users//profile", "/users/profile/"] {
            let res = router.respond(req(Method::GET, path)).await.unwrap();
            assert_eq!(handler_of(&res), "profile", "path {path}");
        }
    }

    #[tokio::test]
    async fn test_root_route() {
        let mut routes = Routes::new();
        routes.get("/", named("root"));
        let router = router(&routes);

        let res = router.respond(req(Method::GET, "/")).await.unwrap();
        assert_eq!(handler_of(&res), "root");
    }

    #[tokio::test]
    async fn test_case_insensitive_keeps_parameter_case() {
        let mut routes = Routes::new();
        routes.case_insensitive = true;
        routes.get("/Users/:name", named("user"));
        let router = router(&routes);

        let res = router.respond(req(Method::GET, "/users/MixedCase")).await.unwrap();
        assert_eq!(body_of(res).await, "user name=MixedCase");
    }

    #[tokio::test]
    async fn test_case_sensitive_by_default() {
        let mut routes = Routes::new();
        routes.get("/users", named("list"));
        let router = router(&routes);

        assert!(router.respond(req(Method::GET, "/USERS")).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_replace_last_wins() {
        let mut routes = Routes::new();
        routes.get("/dup", named("first"));
        routes.get("/dup", named("second"));
        let router = router(&routes);

        let res = router.respond(req(Method::GET, "/dup")).await.unwrap();
        assert_eq!(handler_of(&res), "second");
    }

    #[test]
    fn test_duplicate_reject_fails_registration() {
        let mut routes = Routes::new();
        routes.get("/dup/:id", named("first"));
        routes.get("/dup/:id", named("second"));

        let err = trie_router(&routes, &MiddlewareChain::new(), DuplicatePolicy::Reject)
            .err()
            .expect("duplicate rejected");
        assert_eq!(err.to_string(), "duplicate route: GET /dup/:id");
    }

    #[test]
    fn test_renamed_parameter_is_duplicate_under_reject() {
        let mut routes = Routes::new();
        routes.get("/users/:id", named("first"));
        routes.get("/users/:name", named("second"));

        let err = trie_router(&routes, &MiddlewareChain::new(), DuplicatePolicy::Reject)
            .err()
            .expect("duplicate rejected");
        assert_eq!(err.to_string(), "duplicate route: GET /users/:name");
    }

    #[tokio::test]
    async fn test_renamed_parameter_last_wins_under_replace() {
        let mut routes = Routes::new();
        routes.get("/users/:id", named("first"));
        routes.get("/users/:name", named("second"));
        let router = router(&routes);

        let res = router.respond(req(Method::GET, "/users/5")).await.unwrap();
        assert_eq!(handler_of(&res), "second");
        assert_eq!(body_of(res).await, "second name=5");
    }

    #[test]
    fn test_same_path_different_methods_is_not_duplicate() {
        let mut routes = Routes::new();
        routes.get("/items", named("list"));
        routes.post("/items", named("create"));

        assert!(trie_router(&routes, &MiddlewareChain::new(), DuplicatePolicy::Reject).is_ok());
    }

    #[tokio::test]
    async fn test_middleware_wraps_routes_and_not_found() {
        let mut chain = MiddlewareChain::new();
        chain.push(from_fn(|req, next: Next| async move {
            let mut res = next.run(req).await.unwrap_or_else(|e| e.status().into_response());
            res.headers_mut().insert("x-wrapped", "yes".parse().unwrap());
            Ok(res)
        }));
        let mut routes = Routes::new();
        routes.get("/hello", named("hello"));
        let router = trie_router(&routes, &chain, DuplicatePolicy::Replace).unwrap();

        let hit = router.respond(req(Method::GET, "/hello")).await.unwrap();
        assert_eq!(hit.headers().get("x-wrapped").unwrap(), "yes");

        let miss = router.respond(req(Method::GET, "/nope")).await.unwrap();
        assert_eq!(miss.status(), StatusCode::NOT_FOUND);
        assert_eq!(miss.headers().get("x-wrapped").unwrap(), "yes");
    }

    #[tokio::test]
    async fn test_widgets_scenario() {
        let mut chain = MiddlewareChain::new();
        chain.push(ErrorMiddleware::default());
        let mut routes = Routes::new();
        routes.get("/widgets/:id", named("widget"));

        let sink = Arc::new(CapturingSink::default());
        let root: MetricsResponder<_> = trie_router(&routes, &chain, DuplicatePolicy::Replace)
            .unwrap()
            .adding_metrics(sink.clone());

        let res = root.respond(req(Method::GET, "/widgets/7")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_of(res).await, "widget id=7");

        let res = root.respond(req(Method::GET, "/widgets/7/extra")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let requests = sink.named(REQUESTS_TOTAL);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].label("path"), "/widgets/:id");
        assert_eq!(requests[0].label("status"), "200");
        assert_eq!(requests[1].label("path"), UNDEFINED_ROUTE_PATH);
        assert_eq!(requests[1].label("status"), "404");
        assert_eq!(sink.named(REQUEST_DURATION_SECONDS).len(), 2);
    }

    #[tokio::test]
    async fn test_metrics_never_see_captured_values() {
        let mut routes = Routes::new();
        routes.get("/users/:id", named("user"));
        let sink = Arc::new(CapturingSink::default());
        let root = router(&routes).adding_metrics(sink.clone());

        for id in ["1", "2", "%2e%2e", "secret-token"] {
            let path = format!("/users/{id}");
            root.respond(req(Method::GET, &path)).await.unwrap();
        }

        let requests = sink.named(REQUESTS_TOTAL);
        assert_eq!(requests.len(), 4);
        assert!(requests.iter().all(|o| o.label("path") == "/users/:id"));
    }

    #[tokio::test]
    async fn test_handler_error_propagates_unmodified() {
        let mut routes = Routes::new();
        routes.get(
            "/teapot",
            responder_fn(|_req| async {
                Err::<Response, _>(Error::abort(StatusCode::IM_A_TEAPOT, "short and stout"))
            }),
        );
        let router = router(&routes);

        let err = router.respond(req(Method::GET, "/teapot")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(err.to_string(), "short and stout");
    }
}
