//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! sequencer / reads / blockchain
//!     → logging.rs (tracing subscriber, env filter)
//!     → metrics.rs (counters and gauges, optional Prometheus scrape endpoint)
//! ```
//!
//! # Design Decisions
//! - Every sequence runs inside a span carrying its flow and a UUID
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
