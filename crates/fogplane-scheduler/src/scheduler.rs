//! Scheduler — picks the best live node for a workload.
//!
//! Every decision is a single scoring pass over a point-in-time snapshot
//! of the live fleet. The scheduler reads the registry, writes workload
//! records, and owns nothing else; scoring itself lives in [`crate::scorer`].

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::{debug, info, warn};

use fogplane_registry::NodeRegistry;
use fogplane_state::{
    NodeClass, NodeRecord, StateStore, WorkloadRecord, WorkloadRequirements, WorkloadSpec,
    WorkloadStatus,
};

use crate::error::{SchedulerError, SchedulerResult};
use crate::scorer::{rank_candidates, ScoredCandidate};

/// The outcome of a successful placement.
///
/// Ownership of the decision passes to the caller; the scheduler only
/// persists the workload record itself.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementDecision {
    pub workload_id: String,
    pub assigned_node_id: String,
    pub assigned_node_class: NodeClass,
    pub score: f64,
    /// Unix millis.
    pub decided_at: u64,
}

/// Everything a caller needs after scheduling: the decision, the
/// persisted workload, and the chosen node's snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleOutcome {
    pub decision: PlacementDecision,
    pub workload: WorkloadRecord,
    pub node: NodeRecord,
}

/// Aggregate workload counts. Reporting only.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchedulingStats {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_node_class: BTreeMap<String, u64>,
}

/// Schedules workloads onto the best-scoring live node.
#[derive(Clone)]
pub struct Scheduler {
    registry: NodeRegistry,
    store: StateStore,
}

impl Scheduler {
    pub fn new(registry: NodeRegistry, store: StateStore) -> Self {
        Self { registry, store }
    }

    /// Find the best-scoring live node for the given requirements.
    ///
    /// Candidates come from a snapshot of the live fleet, optionally
    /// filtered by class. Ties go to the lowest `node_id` (the snapshot
    /// is id-sorted and ranking is stable). An empty candidate set is a
    /// reportable `NoSuitableNode`, never a panic.
    pub fn find_best_node(
        &self,
        requirements: &WorkloadRequirements,
        preferred_class: Option<NodeClass>,
    ) -> SchedulerResult<ScoredCandidate> {
        let live = self.registry.list_live()?;

        let candidates: Vec<NodeRecord> = match preferred_class {
            Some(class) => live
                .into_iter()
                .filter(|node| node.node_class == class)
                .collect(),
            None => live,
        };

        if candidates.is_empty() {
            warn!(
                class = preferred_class.map(|c| c.as_str()).unwrap_or("any"),
                "no live candidate nodes"
            );
            return Err(SchedulerError::NoSuitableNode);
        }

        let ranked = rank_candidates(&candidates, requirements);
        for candidate in &ranked {
            debug!(
                node_id = %candidate.node.node_id,
                score = candidate.score,
                "scored candidate"
            );
        }

        ranked
            .into_iter()
            .next()
            .ok_or(SchedulerError::NoSuitableNode)
    }

    /// Place a workload: pick a node, synthesize an id, persist the
    /// record as `Scheduled`, and hand the decision back.
    pub fn schedule_workload(&self, spec: WorkloadSpec) -> SchedulerResult<ScheduleOutcome> {
        let preferred = spec.requirements.preferred_node_class;
        let best = self.find_best_node(&spec.requirements, preferred)?;

        let now = epoch_millis();
        let workload_id = format!("{}-{}-{}", spec.name, spec.version, now);

        let workload = WorkloadRecord {
            workload_id: workload_id.clone(),
            name: spec.name,
            version: spec.version,
            kind: spec.kind,
            description: spec.description,
            requirements: spec.requirements,
            labels: spec.labels,
            env: spec.env,
            status: WorkloadStatus::Scheduled,
            assigned_node_id: best.node.node_id.clone(),
            assigned_node_class: best.node.node_class,
            created_at: now,
            updated_at: now,
        };
        self.store.put_workload(&workload)?;

        info!(
            %workload_id,
            node_id = %best.node.node_id,
            score = best.score,
            "workload scheduled"
        );

        Ok(ScheduleOutcome {
            decision: PlacementDecision {
                workload_id,
                assigned_node_id: best.node.node_id.clone(),
                assigned_node_class: best.node.node_class,
                score: best.score,
                decided_at: now,
            },
            workload,
            node: best.node,
        })
    }

    /// Aggregate counts over all workloads.
    pub fn stats(&self) -> SchedulerResult<SchedulingStats> {
        let workloads = self.store.list_workloads()?;

        let mut stats = SchedulingStats {
            total: workloads.len() as u64,
            ..Default::default()
        };
        for workload in &workloads {
            *stats
                .by_status
                .entry(workload.status.as_str().to_string())
                .or_insert(0) += 1;
            *stats
                .by_node_class
                .entry(workload.assigned_node_class.as_str().to_string())
                .or_insert(0) += 1;
        }
        Ok(stats)
    }

    /// Read access for the rebalance analyzer.
    pub(crate) fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub(crate) fn store(&self) -> &StateStore {
        &self.store
    }
}

pub(crate) fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use fogplane_registry::DEFAULT_TTL;
    use fogplane_telemetry::{CpuMetrics, MemoryMetrics, NormalizedTelemetry};
    use std::collections::HashMap;

    fn setup() -> (Scheduler, NodeRegistry) {
        let store = StateStore::open_in_memory().unwrap();
        let registry = NodeRegistry::new(store.clone(), DEFAULT_TTL).unwrap();
        (Scheduler::new(registry.clone(), store), registry)
    }

    fn telemetry(cpu_usage: f64, mem_usage: f64) -> NormalizedTelemetry {
        NormalizedTelemetry {
            cpu: CpuMetrics {
                usage_percent: cpu_usage,
                core_count: 4,
                ..CpuMetrics::default()
            },
            memory: MemoryMetrics {
                total_kb: 8_192_000,
                used_kb: 0,
                free_kb: 0,
                usage_percent: mem_usage,
                shared_kb: 0,
                cache_kb: 0,
            },
            network: HashMap::new(),
            parsed_at: 0,
        }
    }

    fn spec(name: &str) -> WorkloadSpec {
        WorkloadSpec {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            kind: fogplane_state::WorkloadKind::Rest,
            description: String::new(),
            requirements: WorkloadRequirements::default(),
            labels: HashMap::new(),
            env: HashMap::new(),
        }
    }

    #[test]
    fn no_live_nodes_is_a_reportable_failure() {
        let (scheduler, _registry) = setup();
        let result = scheduler.find_best_node(&WorkloadRequirements::default(), None);
        assert!(matches!(result, Err(SchedulerError::NoSuitableNode)));
    }

    #[test]
    fn single_node_wins_regardless_of_score() {
        let (scheduler, registry) = setup();
        // A nearly saturated node still gets the workload when it is
        // the only one alive.
        registry
            .upsert("only", NodeClass::Edge, telemetry(99.0, 99.0), 0)
            .unwrap();

        let outcome = scheduler.schedule_workload(spec("api")).unwrap();
        assert_eq!(outcome.decision.assigned_node_id, "only");
    }

    #[test]
    fn best_scoring_node_selected() {
        let (scheduler, registry) = setup();
        registry
            .upsert("busy", NodeClass::Edge, telemetry(95.0, 90.0), 0)
            .unwrap();
        registry
            .upsert("idle", NodeClass::Edge, telemetry(5.0, 10.0), 0)
            .unwrap();

        let best = scheduler
            .find_best_node(&WorkloadRequirements::default(), None)
            .unwrap();
        assert_eq!(best.node.node_id, "idle");
    }

    #[test]
    fn class_filter_restricts_candidates() {
        let (scheduler, registry) = setup();
        registry
            .upsert("cloud-idle", NodeClass::Cloud, telemetry(5.0, 5.0), 0)
            .unwrap();
        registry
            .upsert("edge-busy", NodeClass::Edge, telemetry(90.0, 90.0), 0)
            .unwrap();

        let best = scheduler
            .find_best_node(&WorkloadRequirements::default(), Some(NodeClass::Edge))
            .unwrap();
        assert_eq!(best.node.node_id, "edge-busy");
    }

    #[test]
    fn class_filter_with_no_match_fails() {
        let (scheduler, registry) = setup();
        registry
            .upsert("cloud-1", NodeClass::Cloud, telemetry(5.0, 5.0), 0)
            .unwrap();

        let result = scheduler
            .find_best_node(&WorkloadRequirements::default(), Some(NodeClass::Edge));
        assert!(matches!(result, Err(SchedulerError::NoSuitableNode)));
    }

    #[test]
    fn equal_scores_break_to_lowest_node_id() {
        let (scheduler, registry) = setup();
        registry
            .upsert("node-b", NodeClass::Edge, telemetry(30.0, 30.0), 0)
            .unwrap();
        registry
            .upsert("node-a", NodeClass::Edge, telemetry(30.0, 30.0), 0)
            .unwrap();

        let best = scheduler
            .find_best_node(&WorkloadRequirements::default(), None)
            .unwrap();
        assert_eq!(best.node.node_id, "node-a");
    }

    #[test]
    fn schedule_synthesizes_id_and_persists() {
        let (scheduler, registry) = setup();
        registry
            .upsert("node-1", NodeClass::Cloud, telemetry(10.0, 10.0), 0)
            .unwrap();

        let outcome = scheduler.schedule_workload(spec("api")).unwrap();

        assert!(outcome.decision.workload_id.starts_with("api-1.0.0-"));
        assert_eq!(outcome.workload.status, WorkloadStatus::Scheduled);
        assert_eq!(outcome.workload.assigned_node_class, NodeClass::Cloud);
        assert!(outcome.decision.decided_at > 0);

        // Persisted under the synthesized id.
        let stored = scheduler
            .store
            .get_workload(&outcome.decision.workload_id)
            .unwrap();
        assert_eq!(stored, Some(outcome.workload));
    }

    #[test]
    fn schedule_honors_preferred_class_from_requirements() {
        let (scheduler, registry) = setup();
        registry
            .upsert("cloud-idle", NodeClass::Cloud, telemetry(5.0, 5.0), 0)
            .unwrap();
        registry
            .upsert("edge-1", NodeClass::Edge, telemetry(50.0, 50.0), 0)
            .unwrap();

        let mut spec = spec("sensor-gw");
        spec.requirements.preferred_node_class = Some(NodeClass::Edge);

        let outcome = scheduler.schedule_workload(spec).unwrap();
        assert_eq!(outcome.decision.assigned_node_class, NodeClass::Edge);
    }

    #[test]
    fn schedule_failure_reason_text() {
        let (scheduler, _registry) = setup();
        let err = scheduler.schedule_workload(spec("api")).unwrap_err();
        assert_eq!(err.to_string(), "no suitable node");
    }

    #[test]
    fn stats_aggregate_by_status_and_class() {
        let (scheduler, registry) = setup();
        registry
            .upsert("cloud-1", NodeClass::Cloud, telemetry(10.0, 10.0), 0)
            .unwrap();

        scheduler.schedule_workload(spec("a")).unwrap();
        scheduler.schedule_workload(spec("b")).unwrap();

        // Flip one to running, as the lifecycle owner would.
        let mut workloads = scheduler.store.list_workloads().unwrap();
        workloads[0].status = WorkloadStatus::Running;
        scheduler.store.put_workload(&workloads[0]).unwrap();

        let stats = scheduler.stats().unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_status.get("scheduled"), Some(&1));
        assert_eq!(stats.by_status.get("running"), Some(&1));
        assert_eq!(stats.by_node_class.get("cloud"), Some(&2));
    }

    #[test]
    fn stats_empty_store() {
        let (scheduler, _registry) = setup();
        let stats = scheduler.stats().unwrap();
        assert_eq!(stats.total, 0);
        assert!(stats.by_status.is_empty());
    }
}
