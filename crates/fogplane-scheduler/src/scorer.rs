//! Node scoring for placement decisions.
//!
//! Evaluates candidate nodes using a weighted combination of:
//! - **Resource fit**: heavy penalties when headroom can't cover the ask
//! - **Headroom**: prefer nodes with more free CPU and memory
//! - **Class affinity**: cloud for heavy workloads, edge for low-latency
//!
//! Penalties apply before bonuses, so a node failing a hard resource
//! check can still recover partial score from headroom and affinity —
//! the result is a graded ranking, not binary exclusion, even when the
//! whole fleet is tight on resources.

use serde::Serialize;

use fogplane_state::{NodeClass, NodeRecord, WorkloadRequirements};

/// Deducted when free CPU or memory can't cover the requirement.
const RESOURCE_SHORTFALL_PENALTY: f64 = 50.0;
/// Per-resource multiplier on the free fraction.
const HEADROOM_WEIGHT: f64 = 20.0;
/// Heavy workloads (cpu > 0.5 cores or memory > 512 MB) belong on cloud.
const HEAVY_CLASS_BONUS: f64 = 10.0;
/// Low-latency workloads belong on edge.
const LATENCY_AFFINITY_BONUS: f64 = 15.0;

/// A node paired with its suitability score for one set of requirements.
///
/// Ephemeral: produced per scheduling call, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCandidate {
    pub node: NodeRecord,
    /// Suitability in `0.0..=100.0`, higher is better.
    pub score: f64,
}

/// Score a single node for the given requirements.
///
/// Deterministic and pure: same inputs, same score. The constants are
/// load-bearing — placement behavior is defined by them, so they are
/// not tunables.
pub fn score_node(node: &NodeRecord, requirements: &WorkloadRequirements) -> f64 {
    let mut score = 100.0;

    let available_cpu = (100.0 - node.cpu.usage_percent) / 100.0;
    let available_memory = (100.0 - node.memory.usage_percent) / 100.0;

    if available_cpu < requirements.cpu_cores {
        score -= RESOURCE_SHORTFALL_PENALTY;
    }

    // A zero-capacity report fails the memory check outright; never
    // divide by a reporter's zero.
    let memory_fits = node.memory.total_kb > 0
        && available_memory >= requirements.memory_mb / node.memory.total_kb as f64;
    if !memory_fits {
        score -= RESOURCE_SHORTFALL_PENALTY;
    }

    score += available_cpu * HEADROOM_WEIGHT + available_memory * HEADROOM_WEIGHT;

    let heavy = requirements.cpu_cores > 0.5 || requirements.memory_mb > 512.0;
    if heavy {
        score += if node.node_class == NodeClass::Cloud {
            HEAVY_CLASS_BONUS
        } else {
            -HEAVY_CLASS_BONUS
        };
    }

    if requirements
        .affinity_labels
        .get("latency")
        .is_some_and(|v| v == "low")
    {
        score += if node.node_class == NodeClass::Edge {
            LATENCY_AFFINITY_BONUS
        } else {
            -LATENCY_AFFINITY_BONUS
        };
    }

    score.clamp(0.0, 100.0)
}

/// Score all candidates and return them best-first.
///
/// The sort is stable, so equal scores keep the input order — callers
/// passing a node-id-sorted slice get lowest-id-wins tie-breaking.
pub fn rank_candidates(
    nodes: &[NodeRecord],
    requirements: &WorkloadRequirements,
) -> Vec<ScoredCandidate> {
    let mut candidates: Vec<ScoredCandidate> = nodes
        .iter()
        .map(|node| ScoredCandidate {
            node: node.clone(),
            score: score_node(node, requirements),
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}
