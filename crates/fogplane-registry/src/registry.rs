//! NodeRegistry — heartbeat upserts and TTL-based liveness.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, info};

use fogplane_state::{NodeClass, NodeRecord, StateStore};
use fogplane_telemetry::NormalizedTelemetry;

use crate::error::{RegistryError, RegistryResult};

/// Freshness window after which a silent node is considered gone.
pub const DEFAULT_TTL: Duration = Duration::from_secs(90);

/// Tracks the latest telemetry per node and answers liveness queries.
///
/// Liveness is enforced two ways with one observable contract: reads
/// filter lazily on the TTL predicate (exact), and a background sweep
/// deletes stale records (bounds table growth). Upserts and reads go
/// through the store's per-record transactions, so concurrent heartbeats
/// for different nodes never contend on a shared lock here.
#[derive(Clone)]
pub struct NodeRegistry {
    store: StateStore,
    ttl: Duration,
}

impl NodeRegistry {
    /// Create a registry over the given store.
    ///
    /// Fails fast on a zero TTL — that is a configuration bug, not a
    /// runtime condition.
    pub fn new(store: StateStore, ttl: Duration) -> RegistryResult<Self> {
        if ttl.is_zero() {
            return Err(RegistryError::InvalidTtl);
        }
        Ok(Self { store, ttl })
    }

    /// The configured freshness window.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Record a heartbeat: replace the node's record entirely and stamp
    /// `last_seen_at` from the local clock. Last write wins per node.
    pub fn upsert(
        &self,
        node_id: &str,
        node_class: NodeClass,
        telemetry: NormalizedTelemetry,
        reported_at: u64,
    ) -> RegistryResult<NodeRecord> {
        let record = NodeRecord {
            node_id: node_id.to_string(),
            node_class,
            cpu: telemetry.cpu,
            memory: telemetry.memory,
            network: telemetry.network,
            reported_at,
            last_seen_at: epoch_millis(),
        };
        self.store.put_node(&record)?;
        debug!(
            node_id,
            class = node_class.as_str(),
            cpu = record.cpu.usage_percent,
            memory = record.memory.usage_percent,
            "heartbeat recorded"
        );
        Ok(record)
    }

    /// All live nodes, ordered by `node_id`.
    pub fn list_live(&self) -> RegistryResult<Vec<NodeRecord>> {
        self.list_live_at(epoch_millis())
    }

    /// A single node, if it exists and is still live.
    pub fn get_live(&self, node_id: &str) -> RegistryResult<Option<NodeRecord>> {
        let now = epoch_millis();
        Ok(self
            .store
            .get_node(node_id)?
            .filter(|record| self.is_live(record, now)))
    }

    /// Delete every stale record. Returns the number removed.
    pub fn sweep(&self) -> RegistryResult<u32> {
        self.sweep_at(epoch_millis())
    }

    /// Run the expiry sweep on an interval until the shutdown signal.
    ///
    /// The interval should be at most TTL/3 so a stale record outlives
    /// its TTL by a bounded amount even without any reads.
    pub async fn run(
        &self,
        interval: Duration,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        info!(
            interval_secs = interval.as_secs(),
            ttl_secs = self.ttl.as_secs(),
            "registry expiry sweep started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    match self.sweep() {
                        Ok(0) => {}
                        Ok(removed) => info!(removed, "expired stale nodes"),
                        Err(e) => tracing::error!(error = %e, "expiry sweep failed"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("registry expiry sweep shutting down");
                    break;
                }
            }
        }
    }

    // ── Internal helpers (time injected for testability) ───────────

    fn is_live(&self, record: &NodeRecord, now_ms: u64) -> bool {
        now_ms.saturating_sub(record.last_seen_at) < self.ttl.as_millis() as u64
    }

    fn list_live_at(&self, now_ms: u64) -> RegistryResult<Vec<NodeRecord>> {
        Ok(self
            .store
            .list_nodes()?
            .into_iter()
            .filter(|record| self.is_live(record, now_ms))
            .collect())
    }

    fn sweep_at(&self, now_ms: u64) -> RegistryResult<u32> {
        let stale: Vec<String> = self
            .store
            .list_nodes()?
            .into_iter()
            .filter(|record| !self.is_live(record, now_ms))
            .map(|record| record.node_id)
            .collect();

        if stale.is_empty() {
            return Ok(0);
        }
        Ok(self.store.delete_nodes(&stale)?)
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
