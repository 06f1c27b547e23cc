//! fogplane-metrics — control-plane observability counters.
//!
//! Tracks heartbeat arrivals and per-node resource gauges alongside
//! scheduler outcome counters, and renders everything in the Prometheus
//! text exposition format for scraping.

pub mod collector;
pub mod prometheus;

pub use collector::{FleetMetrics, FleetSnapshot, NodeSample};
pub use prometheus::render_prometheus;
