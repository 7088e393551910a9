//! Logs and metrics.
//!
//! # Data Flow
//! ```text
//! handlers, chain client, submission trackers, receipt store
//!     → logging.rs (tracing subscriber: pretty or JSON on stdout)
//!     → metrics.rs (requests, lifecycle statuses, anchors, node health)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! Every request span carries the `x-request-id` value. Recording a metric
//! without an installed exporter is a no-op. Signer keys are never logged.

pub mod logging;
pub mod metrics;
