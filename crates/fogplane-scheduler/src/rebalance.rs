//! Rebalance analysis — advisory detection of badly-placed workloads.
//!
//! Compares each running workload's current-node score against the best
//! achievable score on a live node of the same class. Only a strict
//! improvement of more than 10 points produces a recommendation; the
//! hysteresis keeps marginal score wobble from suggesting churn. The
//! analyzer never moves anything.

use serde::Serialize;
use tracing::{debug, info};

use fogplane_state::WorkloadStatus;

use crate::error::{SchedulerError, SchedulerResult};
use crate::scheduler::Scheduler;
use crate::scorer::score_node;

/// A better score must beat the current one by strictly more than this.
const IMPROVEMENT_THRESHOLD: f64 = 10.0;

/// An advisory suggestion to move one workload. Never auto-applied.
#[derive(Debug, Clone, Serialize)]
pub struct RebalanceRecommendation {
    pub workload_id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    pub score_improvement: f64,
}

/// Read-only analyzer over the scheduler's candidate selection.
#[derive(Clone)]
pub struct RebalanceAnalyzer {
    scheduler: Scheduler,
}

impl RebalanceAnalyzer {
    pub fn new(scheduler: Scheduler) -> Self {
        Self { scheduler }
    }

    /// Analyze all running workloads against the current live fleet.
    ///
    /// A workload whose node has dropped out of the live set scores 0
    /// for its current placement — a vanished node is the worst possible
    /// home, so any viable alternative above the threshold is suggested.
    pub fn analyze(&self) -> SchedulerResult<Vec<RebalanceRecommendation>> {
        let running = self
            .scheduler
            .store()
            .list_workloads_by_status(WorkloadStatus::Running)?;
        let live = self.scheduler.registry().list_live()?;

        let mut recommendations = Vec::new();

        for workload in &running {
            let best = match self
                .scheduler
                .find_best_node(&workload.requirements, Some(workload.assigned_node_class))
            {
                Ok(candidate) => candidate,
                // Nowhere to go: nothing to recommend for this workload.
                Err(SchedulerError::NoSuitableNode) => continue,
                Err(e) => return Err(e),
            };

            if best.node.node_id == workload.assigned_node_id {
                continue;
            }

            let current_score = live
                .iter()
                .find(|node| node.node_id == workload.assigned_node_id)
                .map(|node| score_node(node, &workload.requirements))
                .unwrap_or(0.0);

            debug!(
                workload_id = %workload.workload_id,
                current_score,
                best_score = best.score,
                "rebalance comparison"
            );

            if best.score > current_score + IMPROVEMENT_THRESHOLD {
                recommendations.push(RebalanceRecommendation {
                    workload_id: workload.workload_id.clone(),
                    from_node_id: workload.assigned_node_id.clone(),
                    to_node_id: best.node.node_id.clone(),
                    score_improvement: best.score - current_score,
                });
            }
        }

        info!(
            candidates = running.len(),
            movable = recommendations.len(),
            "rebalance analysis complete"
        );
        Ok(recommendations)
    }
}
