//! fogplane-scheduler — placement scoring and workload scheduling.
//!
//! Three layers, each pure relative to the one below:
//!
//! ```text
//! RebalanceAnalyzer   (advisory: is a running workload badly placed?)
//!   └── Scheduler     (snapshot live nodes, filter, rank, decide)
//!         └── scorer  (stateless: node metrics × requirements → 0..=100)
//! ```
//!
//! Scoring is a single weighted pass — no iterative bin-packing, no
//! preemption. Placement is best-effort against a point-in-time snapshot
//! of the registry; a heartbeat arriving mid-decision is an accepted race.

pub mod error;
pub mod rebalance;
pub mod scheduler;
pub mod scorer;

pub use error::{SchedulerError, SchedulerResult};
pub use rebalance::{RebalanceAnalyzer, RebalanceRecommendation};
pub use scheduler::{PlacementDecision, ScheduleOutcome, Scheduler, SchedulingStats};
pub use scorer::{rank_candidates, score_node, ScoredCandidate};
