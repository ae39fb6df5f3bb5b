//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use tokio::net::TcpListener;

use route_dispatch::config::DispatchConfig;
use route_dispatch::http::{HttpServer, Request};
use route_dispatch::lifecycle::{build_responder, Shutdown};
use route_dispatch::middleware::MiddlewareChain;
use route_dispatch::observability::MetricsSink;
use route_dispatch::routing::Routes;
use route_dispatch::{responder_fn, Error, Response};

/// One recorded metrics call.
#[derive(Debug, Clone)]
pub struct Observation {
    pub name: &'static str,
    pub labels: Vec<(&'static str, String)>,
}

impl Observation {
    pub fn label(&self, key: &str) -> &str {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }
}

/// Sink that keeps every observation in memory.
#[derive(Default)]
pub struct CapturingSink {
    observations: Mutex<Vec<Observation>>,
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

    fn push(&self, name: &'static str, labels: &[(&'static str, String)]) {
        self.observations.lock().unwrap().push(Observation {
            name,
            labels: labels.to_vec(),
        });
    }
}

impl MetricsSink for CapturingSink {
    fn increment_counter(&self, name: &'static str, labels: &[(&'static str, String)]) {
        self.push(name, labels);
    }

    fn record_duration(&self, name: &'static str, labels: &[(&'static str, String)], _: Duration) {
        self.push(name, labels);
    }
}

/// Routes used across the integration tests.
pub fn widget_routes() -> Routes {
    let mut routes = Routes::new();
    routes.get(
        "/widgets/:id",
        responder_fn(|req: Request| async move {
            let id = req.parameters().get("id").unwrap_or_default().to_string();
            Ok((StatusCode::OK, id).into_response())
        }),
    );
    routes.get(
        "/slow",
        responder_fn(|_req| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(StatusCode::OK.into_response())
        }),
    );
    routes.get(
        "/broken",
        responder_fn(|_req| async {
            Err::<Response, _>(Error::handler(std::io::Error::other("database unavailable")))
        }),
    );
    routes
}

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub sink: Arc<CapturingSink>,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn stop(&self) {
        self.shutdown.trigger();
    }
}

/// Start a server for `routes` on 127.0.0.1 with a capturing metrics sink.
pub async fn start_server(mut config: DispatchConfig, routes: Routes) -> TestServer {
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;

    let sink = Arc::new(CapturingSink::default());
    let responder = build_responder(&config, routes, MiddlewareChain::new(), sink.clone()).unwrap();

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, responder);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestServer { addr, sink, shutdown }
}
