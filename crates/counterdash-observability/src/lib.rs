//! # counterdash-observability
//!
//! Structured logging and OpenTelemetry metrics for the counter dashboard.
//!
//! ## Built-in metrics
//! - `counterdash.writes_submitted`: counter, tagged with action
//! - `counterdash.writes_failed`: counter, tagged with action + stage
//! - `counterdash.decode_fallbacks`: counter
//! - `counterdash.events_presented`: counter, tagged with event
//! - `counterdash.confirmation_latency_ms`: histogram, tagged with action
//!
//! With no global meter provider installed every recording is a no-op.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::DashboardMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
