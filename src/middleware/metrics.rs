//! Request metrics decorator.
//!
//! # Responsibilities
//! - Time the downstream responder
//! - Record exactly one completion per request: success, failure or cancellation
//! - Derive bounded labels from the matched route, never from raw request input
//!
//! # Design Decisions
//! - Unmatched requests collapse onto sentinel labels; raw paths and methods
//!   from unauthenticated clients would make label cardinality unbounded
//! - Failures count as 500, as if mapped by the error middleware
//! - Completion is recorded from a drop guard, so a cancelled future still counts once
//! - A panicking sink is contained; it can never fail the request
//! - Nothing is recorded while unwinding from a downstream panic

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::http::Method;
use futures_util::future::FutureExt;

use crate::http::{MatchedRoute, Request};
use crate::observability::metrics::{
    MetricsSink, REQUESTS_TOTAL, REQUEST_DURATION_SECONDS, REQUEST_ERRORS_TOTAL,
};
use crate::responder::{Responder, ResponseFuture};

/// Path label for requests that matched no route.
pub const UNDEFINED_ROUTE_PATH: &str = "route_undefined";
/// Method label for requests that matched no route.
pub const UNDEFINED_METHOD: &str = "undefined";

/// Status recorded when downstream fails or is dropped before settling.
const FAILURE_STATUS: u16 = 500;

/// Decorator recording request count, error count and latency.
pub struct MetricsResponder<R> {
    downstream: R,
    sink: Arc<dyn MetricsSink>,
}

impl<R: Responder> MetricsResponder<R> {
    pub fn new(downstream: R, sink: Arc<dyn MetricsSink>) -> Self {
        Self { downstream, sink }
    }
}

impl<R: Responder> Responder for MetricsResponder<R> {
    fn respond(&self, request: Request) -> ResponseFuture {
        let mut completion = Completion {
            sink: self.sink.clone(),
            route: request.matched_route(),
            method: request.method().clone(),
            start: Instant::now(),
            status: None,
        };
        let response = self.downstream.respond(request);

        async move {
            let result = response.await;
            completion.status = Some(match &result {
                Ok(res) => res.status().as_u16(),
                Err(_) => FAILURE_STATUS,
            });
            drop(completion);
            result
        }
        .boxed()
    }
}

/// Records one observation when dropped.
struct Completion {
    sink: Arc<dyn MetricsSink>,
    route: MatchedRoute,
    method: Method,
    start: Instant,
    status: Option<u16>,
}

impl Drop for Completion {
    fn drop(&mut self) {
        let status = self.status.unwrap_or(FAILURE_STATUS);
        let (method, path) = match self.route.get() {
            Some(route) => (self.method.as_str().to_string(), route.template()),
            None => (UNDEFINED_METHOD.to_string(), UNDEFINED_ROUTE_PATH.to_string()),
        };
        let labels = [
            ("method", method),
            ("path", path),
            ("status", status.to_string()),
        ];
        if std::thread::panicking() {
            // A second panic from the sink while unwinding would abort the process.
            tracing::warn!(status, "Downstream panicked; observation dropped");
            return;
        }
        let elapsed = self.start.elapsed();
        let sink = &self.sink;

        let recorded = panic::catch_unwind(AssertUnwindSafe(|| {
            sink.increment_counter(REQUESTS_TOTAL, &labels);
            if status >= 500 {
                sink.increment_counter(REQUEST_ERRORS_TOTAL, &labels);
            }
            sink.record_duration(REQUEST_DURATION_SECONDS, &labels, elapsed);
        }));
        if recorded.is_err() {
            tracing::warn!(status, "Metrics sink panicked; observation dropped");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::http::{Error, Response};
    use crate::responder::responder_fn;
    use crate::routing::Route;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Observation {
        pub name: &'static str,
        pub labels: Vec<(&'static str, String)>,
    }

    impl Observation {
        pub fn label(&self, key: &str) -> &str {
            self.labels
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.as_str())
                .unwrap_or_default()
        }
    }

    /// Sink that keeps every observation in memory.
    #[derive(Default)]
    pub(crate) struct CapturingSink {
        pub observations: Mutex<Vec<Observation>>,
    }

    impl CapturingSink {
        pub fn named(&self, name: &str) -> Vec<Observation> {
            self.observations
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.name == name)
                .cloned()
                .collect()
        }
    }

    impl MetricsSink for CapturingSink {
        fn increment_counter(&self, name: &'static str, labels: &[(&'static str, String)]) {
            self.observations.lock().unwrap().push(Observation {
                name,
                labels: labels.to_vec(),
            });
        }

        fn record_duration(&self, name: &'static str, labels: &[(&'static str, String)], _: Duration) {
            self.observations.lock().unwrap().push(Observation {
                name,
                labels: labels.to_vec(),
            });
        }
    }

    struct PanickingSink;

    impl MetricsSink for PanickingSink {
        fn increment_counter(&self, _: &'static str, _: &[(&'static str, String)]) {
            panic!("sink unavailable");
        }

        fn record_duration(&self, _: &'static str, _: &[(&'static str, String)], _: Duration) {
            panic!("sink unavailable");
        }
    }

    /// Pretends to be a router: marks `/widgets/:id` as matched, then answers.
    fn routed(status: StatusCode) -> impl Responder {
        let route = Arc::new(Route::placeholder(Method::GET, "/widgets/:id"));
        responder_fn(move |req: Request| {
            req.matched_route().set(route.clone());
            async move { Ok(status.into_response()) }
        })
    }

    /// Panics while answering `/`.
    fn exploding() -> impl Responder {
        responder_fn(|req: Request| async move {
            if req.path() == "/" {
                panic!("handler exploded");
            }
            Ok(StatusCode::OK.into_response())
        })
    }

    fn get(path: &str) -> Request {
        Request::from_parts(Method::GET, path).unwrap()
    }

    #[tokio::test]
    async fn test_matched_route_uses_template_label() {
        let sink = Arc::new(CapturingSink::default());
        let responder = MetricsResponder::new(routed(StatusCode::OK), sink.clone());

        responder.respond(get("/widgets/42")).await.unwrap();

        let requests = sink.named(REQUESTS_TOTAL);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].label("path"), "/widgets/:id");
        assert_eq!(requests[0].label("method"), "GET");
        assert_eq!(requests[0].label("status"), "200");
        assert_eq!(sink.named(REQUEST_DURATION_SECONDS).len(), 1);
        assert!(sink.named(REQUEST_ERRORS_TOTAL).is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_request_uses_sentinels() {
        let sink = Arc::new(CapturingSink::default());
        let not_found = responder_fn(|_req| async { Ok(StatusCode::NOT_FOUND.into_response()) });
        let responder = MetricsResponder::new(not_found, sink.clone());

        let req = Request::from_parts(Method::from_bytes(b"EVIL").unwrap(), "/attacker/controlled/1").unwrap();
        responder.respond(req).await.unwrap();

        let requests = sink.named(REQUESTS_TOTAL);
        assert_eq!(requests[0].label("path"), UNDEFINED_ROUTE_PATH);
        assert_eq!(requests[0].label("method"), UNDEFINED_METHOD);
        assert_eq!(requests[0].label("status"), "404");
    }

    #[tokio::test]
    async fn test_failure_counts_as_500_exactly_once() {
        let sink = Arc::new(CapturingSink::default());
        let failing = responder_fn(|_req| async {
            Err::<Response, _>(Error::handler(std::io::Error::other("boom")))
        });
        let responder = MetricsResponder::new(failing, sink.clone());

        assert!(responder.respond(get("/")).await.is_err());

        let requests = sink.named(REQUESTS_TOTAL);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].label("status"), "500");
        assert_eq!(sink.named(REQUEST_ERRORS_TOTAL).len(), 1);
        assert_eq!(sink.named(REQUEST_DURATION_SECONDS).len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_request_recorded_once() {
        let sink = Arc::new(CapturingSink::default());
        let slow = responder_fn(|_req| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(StatusCode::OK.into_response())
        });
        let responder = MetricsResponder::new(slow, sink.clone());

        let outcome = tokio::time::timeout(Duration::from_millis(10), responder.respond(get("/"))).await;
        assert!(outcome.is_err());

        let requests = sink.named(REQUESTS_TOTAL);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].label("status"), "500");
    }

    #[tokio::test]
    async fn test_downstream_panic_with_panicking_sink_unwinds() {
        let responder = MetricsResponder::new(exploding(), Arc::new(PanickingSink));

        let outcome = AssertUnwindSafe(responder.respond(get("/"))).catch_unwind().await;
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn test_downstream_panic_is_not_recorded() {
        let sink = Arc::new(CapturingSink::default());
        let responder = MetricsResponder::new(exploding(), sink.clone());

        let outcome = AssertUnwindSafe(responder.respond(get("/"))).catch_unwind().await;
        assert!(outcome.is_err());
        assert!(sink.named(REQUESTS_TOTAL).is_empty());
    }

    #[tokio::test]
    async fn test_panicking_sink_does_not_fail_request() {
        let responder = MetricsResponder::new(routed(StatusCode::OK), Arc::new(PanickingSink));
        let res = responder.respond(get("/widgets/1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
