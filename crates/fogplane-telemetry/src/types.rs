//! Normalized metric value types.
//!
//! These are the shapes the rest of the control plane computes against.
//! All types serialize to/from JSON for storage and API responses.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalized CPU metrics for one node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CpuMetrics {
    /// Busy share of total jiffies since boot, rounded to 2 decimals.
    pub usage_percent: f64,
    /// Number of CPU cores, at least 1.
    pub core_count: u32,
    pub load_average: LoadAverage,
}

impl Default for CpuMetrics {
    fn default() -> Self {
        Self {
            usage_percent: 0.0,
            core_count: 1,
            load_average: LoadAverage::default(),
        }
    }
}

/// 1/5/15-minute load averages.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Normalized memory metrics for one node.
///
/// `used_kb` is availability-based (`total - available`), not the
/// reporter's "used" column: cache and buffers are reclaimable and must
/// not count against placement headroom.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MemoryMetrics {
    pub total_kb: u64,
    pub used_kb: u64,
    pub free_kb: u64,
    pub usage_percent: f64,
    pub shared_kb: u64,
    pub cache_kb: u64,
}

/// Traffic counters for a single physical network interface.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InterfaceStats {
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errors: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errors: u64,
    pub total_bytes: u64,
}

/// The complete normalized result of one heartbeat's raw telemetry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedTelemetry {
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    /// Interface name → counters, loopback/virtual interfaces excluded.
    pub network: HashMap<String, InterfaceStats>,
    /// Unix millis when parsing completed (local clock).
    pub parsed_at: u64,
}
