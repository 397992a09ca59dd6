//! Observability for the chat gateway.
//!
//! Lightweight in-process metrics (no exporter crate). Counters are stored as
//! atomics keyed by label sets and rendered by the `/metrics` handler.

pub mod metrics;

pub use metrics::ChatMetrics;
