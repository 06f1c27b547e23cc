//! fogplane-api — REST API for the Fogplane control plane.
//!
//! Thin adapters only: validation happens at this boundary, everything
//! algorithmic lives in the registry and scheduler crates.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/heartbeat` | Ingest one node heartbeat |
//! | GET | `/api/v1/nodes` | List live nodes |
//! | POST | `/api/v1/schedule` | Schedule a workload |
//! | GET | `/api/v1/schedule/stats` | Scheduling statistics |
//! | POST | `/api/v1/schedule/rebalance` | Advisory rebalance analysis |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;

use axum::routing::{get, post};
use axum::Router;

use fogplane_metrics::FleetMetrics;
use fogplane_registry::NodeRegistry;
use fogplane_scheduler::{RebalanceAnalyzer, Scheduler};

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub registry: NodeRegistry,
    pub scheduler: Scheduler,
    pub analyzer: RebalanceAnalyzer,
    pub metrics: FleetMetrics,
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/nodes", get(handlers::list_nodes))
        .route("/schedule", post(handlers::schedule_workload))
        .route("/schedule/stats", get(handlers::scheduling_stats))
        .route("/schedule/rebalance", post(handlers::rebalance))
        .with_state(state.clone());

    Router::new()
        .route("/heartbeat", post(handlers::heartbeat).with_state(state.clone()))
        .route(
            "/metrics",
            get(handlers::prometheus_metrics).with_state(state),
        )
        .nest("/api/v1", api_routes)
}
