//! Fleet metrics collector.
//!
//! Counters use atomics; per-node gauges live behind an async RwLock
//! keyed by node id. Recording is cheap enough to sit on the heartbeat
//! hot path.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use fogplane_state::NodeClass;

/// Latest observed resource gauges for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSample {
    pub node_class: NodeClass,
    /// Heartbeats received since process start.
    pub heartbeats: u64,
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
}

/// Point-in-time export of all metrics.
#[derive(Debug, Clone, Default)]
pub struct FleetSnapshot {
    /// Node id → latest sample, sorted for stable exposition output.
    pub nodes: BTreeMap<String, NodeSample>,
    pub placements_total: u64,
    pub scheduling_failures_total: u64,
    pub rebalance_runs_total: u64,
}

/// Shared metrics recorder for the whole control plane.
#[derive(Clone, Default)]
pub struct FleetMetrics {
    nodes: Arc<RwLock<BTreeMap<String, NodeSample>>>,
    placements_total: Arc<AtomicU64>,
    scheduling_failures_total: Arc<AtomicU64>,
    rebalance_runs_total: Arc<AtomicU64>,
}

impl FleetMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one heartbeat and refresh the node's gauges.
    pub async fn record_heartbeat(
        &self,
        node_id: &str,
        node_class: NodeClass,
        cpu_usage_percent: f64,
        memory_usage_percent: f64,
    ) {
        let mut nodes = self.nodes.write().await;
        let sample = nodes.entry(node_id.to_string()).or_insert(NodeSample {
            node_class,
            heartbeats: 0,
            cpu_usage_percent: 0.0,
            memory_usage_percent: 0.0,
        });
        sample.heartbeats += 1;
        sample.node_class = node_class;
        sample.cpu_usage_percent = cpu_usage_percent;
        sample.memory_usage_percent = memory_usage_percent;
        debug!(node_id, heartbeats = sample.heartbeats, "heartbeat counted");
    }

    pub fn record_placement(&self) {
        self.placements_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scheduling_failure(&self) {
        self.scheduling_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rebalance_run(&self) {
        self.rebalance_runs_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Export everything for rendering.
    pub async fn snapshot(&self) -> FleetSnapshot {
        FleetSnapshot {
            nodes: self.nodes.read().await.clone(),
            placements_total: self.placements_total.load(Ordering::Relaxed),
            scheduling_failures_total: self.scheduling_failures_total.load(Ordering::Relaxed),
            rebalance_runs_total: self.rebalance_runs_total.load(Ordering::Relaxed),
        }
    }
}
