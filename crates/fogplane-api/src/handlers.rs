//! REST API handlers.
//!
//! Each handler validates its input, calls into the core, and returns a
//! uniform JSON envelope. Malformed telemetry is not an error here —
//! the parsers degrade to zeroed metrics and ingestion proceeds.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tracing::{info, warn};

use fogplane_scheduler::SchedulerError;
use fogplane_state::{NodeClass, WorkloadKind, WorkloadRequirements, WorkloadSpec};
use fogplane_telemetry::{parse_heartbeat, HostInfo};

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

// ── Heartbeat ingestion ────────────────────────────────────────────

/// Raw heartbeat body as agents send it.
#[derive(Debug, serde::Deserialize)]
pub struct HeartbeatRequest {
    pub node_id: Option<String>,
    pub node_class: Option<NodeClass>,
    /// Raw `/proc/stat`-style CPU line(s).
    pub cpu: Option<String>,
    /// Raw `free`-style memory summary.
    pub memory: Option<String>,
    /// Raw `/proc/net/dev`-style counter dump.
    pub network: Option<String>,
    /// Node-supplied Unix millis.
    pub timestamp: Option<u64>,
}

impl HeartbeatRequest {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.cpu.is_none() {
            missing.push("cpu");
        }
        if self.memory.is_none() {
            missing.push("memory");
        }
        if self.network.is_none() {
            missing.push("network");
        }
        if self.node_class.is_none() {
            missing.push("node_class");
        }
        missing
    }
}

/// POST /heartbeat
pub async fn heartbeat(
    State(state): State<ApiState>,
    Json(req): Json<HeartbeatRequest>,
) -> impl IntoResponse {
    let missing = req.missing_fields();
    if !missing.is_empty() {
        return error_response(
            &format!("missing required fields: {}", missing.join(", ")),
            StatusCode::BAD_REQUEST,
        )
        .into_response();
    }

    // Presence checked above.
    let (Some(cpu_raw), Some(memory_raw), Some(network_raw), Some(node_class)) =
        (req.cpu, req.memory, req.network, req.node_class)
    else {
        return error_response("missing required fields", StatusCode::BAD_REQUEST)
            .into_response();
    };

    let node_id = req
        .node_id
        .unwrap_or_else(|| format!("node-{}", epoch_millis()));
    let reported_at = req.timestamp.unwrap_or_else(epoch_millis);

    let telemetry = parse_heartbeat(&cpu_raw, &memory_raw, &network_raw, HostInfo::probe());
    if telemetry.memory.total_kb == 0 {
        // Quality signal only; zeroed metrics still count as a heartbeat.
        warn!(%node_id, "heartbeat stored with degraded telemetry");
    }

    let record = match state
        .registry
        .upsert(&node_id, node_class, telemetry, reported_at)
    {
        Ok(record) => record,
        Err(e) => {
            return error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
                .into_response()
        }
    };

    state
        .metrics
        .record_heartbeat(
            &node_id,
            node_class,
            record.cpu.usage_percent,
            record.memory.usage_percent,
        )
        .await;

    info!(
        %node_id,
        class = node_class.as_str(),
        cpu = record.cpu.usage_percent,
        memory = record.memory.usage_percent,
        "heartbeat ingested"
    );

    ApiResponse::ok(serde_json::json!({
        "node_id": node_id,
        "node": record,
    }))
    .into_response()
}

// ── Nodes ──────────────────────────────────────────────────────────

/// GET /api/v1/nodes
pub async fn list_nodes(State(state): State<ApiState>) -> impl IntoResponse {
    match state.registry.list_live() {
        Ok(nodes) => {
            let count = nodes.len();
            ApiResponse::ok(serde_json::json!({
                "nodes": nodes,
                "count": count,
            }))
            .into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
    }
}

// ── Scheduling ─────────────────────────────────────────────────────

/// Workload submission body.
#[derive(Debug, serde::Deserialize)]
pub struct ScheduleRequest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub kind: Option<WorkloadKind>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: WorkloadRequirements,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl ScheduleRequest {
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if self.kind.is_none() {
            missing.push("kind");
        }
        missing
    }
}

/// POST /api/v1/schedule
pub async fn schedule_workload(
    State(state): State<ApiState>,
    Json(req): Json<ScheduleRequest>,
) -> impl IntoResponse {
    let missing = req.missing_fields();
    if !missing.is_empty() {
        return error_response(
            &format!("missing required fields: {}", missing.join(", ")),
            StatusCode::BAD_REQUEST,
        )
        .into_response();
    }
    let (Some(name), Some(kind)) = (req.name, req.kind) else {
        return error_response("missing required fields", StatusCode::BAD_REQUEST)
            .into_response();
    };

    let spec = WorkloadSpec {
        name,
        version: req.version.unwrap_or_else(|| "1.0.0".to_string()),
        kind,
        description: req.description,
        requirements: req.requirements,
        labels: req.labels,
        env: req.env,
    };

    match state.scheduler.schedule_workload(spec) {
        Ok(outcome) => {
            state.metrics.record_placement();
            (StatusCode::CREATED, ApiResponse::ok(outcome)).into_response()
        }
        Err(e @ SchedulerError::NoSuitableNode) => {
            state.metrics.record_scheduling_failure();
            error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
    }
}

/// GET /api/v1/schedule/stats
pub async fn scheduling_stats(State(state): State<ApiState>) -> impl IntoResponse {
    match state.scheduler.stats() {
        Ok(stats) => ApiResponse::ok(stats).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
    }
}

/// POST /api/v1/schedule/rebalance
pub async fn rebalance(State(state): State<ApiState>) -> impl IntoResponse {
    match state.analyzer.analyze() {
        Ok(recommendations) => {
            state.metrics.record_rebalance_run();
            let count = recommendations.len();
            ApiResponse::ok(serde_json::json!({
                "recommendations": recommendations,
                "count": count,
            }))
            .into_response()
        }
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
    }
}

// ── Metrics ────────────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.metrics.snapshot().await;
    let body = fogplane_metrics::render_prometheus(&snapshot);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
