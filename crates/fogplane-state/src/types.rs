//! Domain types for the Fogplane state store.
//!
//! These types represent the persisted state of nodes and workloads.
//! All types are serializable to/from JSON for storage in redb tables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use fogplane_telemetry::{CpuMetrics, InterfaceStats, MemoryMetrics};

/// Unique identifier for a node in the fleet.
pub type NodeId = String;

/// Unique identifier for a workload.
pub type WorkloadId = String;

// ── Nodes ─────────────────────────────────────────────────────────

/// Hardware class of a reporting node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeClass {
    Cloud,
    Edge,
}

impl NodeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeClass::Cloud => "cloud",
            NodeClass::Edge => "edge",
        }
    }
}

/// The latest normalized telemetry for one node, plus liveness bookkeeping.
///
/// `last_seen_at` is always the registry host's wall clock at ingestion —
/// never the remote node's claim. `reported_at` is what the node said.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    pub node_id: NodeId,
    pub node_class: NodeClass,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    /// Interface name → counters, loopback/virtual interfaces excluded.
    pub network: HashMap<String, InterfaceStats>,
    /// Unix millis, node-supplied.
    pub reported_at: u64,
    /// Unix millis, registry-assigned at ingestion.
    pub last_seen_at: u64,
}

// ── Workloads ─────────────────────────────────────────────────────

/// Protocol surface of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    Rest,
    Grpc,
    Websocket,
    Custom,
}

/// Lifecycle status of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadStatus {
    Registered,
    Scheduled,
    Deploying,
    Running,
    Stopped,
    Error,
}

impl WorkloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadStatus::Registered => "registered",
            WorkloadStatus::Scheduled => "scheduled",
            WorkloadStatus::Deploying => "deploying",
            WorkloadStatus::Running => "running",
            WorkloadStatus::Stopped => "stopped",
            WorkloadStatus::Error => "error",
        }
    }
}

/// Resource requirements and placement preferences for one workload.
///
/// Immutable once supplied. `cpu_cores` and `memory_mb` are interpreted
/// against the scoring formula's availability fractions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadRequirements {
    #[serde(default = "default_cpu_cores")]
    pub cpu_cores: f64,
    #[serde(default = "default_memory_mb")]
    pub memory_mb: f64,
    /// Soft placement hints, e.g. `latency = "low"`.
    #[serde(default)]
    pub affinity_labels: HashMap<String, String>,
    #[serde(default)]
    pub preferred_node_class: Option<NodeClass>,
}

fn default_cpu_cores() -> f64 {
    0.1
}

fn default_memory_mb() -> f64 {
    128.0
}

impl Default for WorkloadRequirements {
    fn default() -> Self {
        Self {
            cpu_cores: default_cpu_cores(),
            memory_mb: default_memory_mb(),
            affinity_labels: HashMap::new(),
            preferred_node_class: None,
        }
    }
}

/// Caller-facing input to scheduling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadSpec {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    pub kind: WorkloadKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: WorkloadRequirements,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// A workload with a placement — the persisted shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkloadRecord {
    pub workload_id: WorkloadId,
    pub name: String,
    pub version: String,
    pub kind: WorkloadKind,
    pub description: String,
    pub requirements: WorkloadRequirements,
    pub labels: HashMap<String, String>,
    pub env: HashMap<String, String>,
    pub status: WorkloadStatus,
    pub assigned_node_id: NodeId,
    pub assigned_node_class: NodeClass,
    /// Unix millis.
    pub created_at: u64,
    /// Unix millis.
    pub updated_at: u64,
}
