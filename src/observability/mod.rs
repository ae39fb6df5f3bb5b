//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch core produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms via an injected MetricsSink)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through all log lines below the request ID middleware
//! - Metrics are cheap (atomic increments in the recorder)

pub mod logging;
pub mod metrics;

pub use metrics::{MetricsSink, RecorderSink};
