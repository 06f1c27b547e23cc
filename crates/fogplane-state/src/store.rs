//! StateStore — redb-backed state persistence for Fogplane.
//!
//! Provides typed CRUD operations over nodes and workloads. All values
//! are JSON-serialized into redb's `&[u8]` value columns.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(NODES).map_err(map_err!(Table))?;
        txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Nodes ──────────────────────────────────────────────────────

    /// Insert or replace a node record. Whole-record replace, never a
    /// field merge: each heartbeat supersedes the previous one entirely.
    pub fn put_node(&self, record: &NodeRecord) -> StateResult<()> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(NODES).map_err(map_err!(Table))?;
            table
                .insert(record.node_id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Get a node by ID.
    pub fn get_node(&self, node_id: &str) -> StateResult<Option<NodeRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(NODES).map_err(map_err!(Table))?;
        match table.get(node_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: NodeRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List all node records, ordered by `node_id` (redb key order).
    pub fn list_nodes(&self) -> StateResult<Vec<NodeRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(NODES).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: NodeRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    /// Delete a node by ID. Returns true if it existed.
    pub fn delete_node(&self, node_id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(NODES).map_err(map_err!(Table))?;
            existed = table.remove(node_id).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    /// Delete a batch of nodes in one write transaction. Returns the
    /// number that existed.
    pub fn delete_nodes(&self, node_ids: &[String]) -> StateResult<u32> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let mut count = 0;
        {
            let mut table = txn.open_table(NODES).map_err(map_err!(Table))?;
            for node_id in node_ids {
                if table
                    .remove(node_id.as_str())
                    .map_err(map_err!(Write))?
                    .is_some()
                {
                    count += 1;
                }
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(count)
    }

    // ── Workloads ──────────────────────────────────────────────────

    /// Insert or update a workload record.
    pub fn put_workload(&self, record: &WorkloadRecord) -> StateResult<()> {
        let value = serde_json::to_vec(record).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
            table
                .insert(record.workload_id.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(workload_id = %record.workload_id, "workload stored");
        Ok(())
    }

    /// Get a workload by ID.
    pub fn get_workload(&self, workload_id: &str) -> StateResult<Option<WorkloadRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
        match table.get(workload_id).map_err(map_err!(Read))? {
            Some(guard) => {
                let record: WorkloadRecord =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    /// List all workloads, ordered by `workload_id` (redb key order).
    pub fn list_workloads(&self) -> StateResult<Vec<WorkloadRecord>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let record: WorkloadRecord =
                serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(record);
        }
        Ok(results)
    }

    /// List workloads with the given status.
    pub fn list_workloads_by_status(
        &self,
        status: WorkloadStatus,
    ) -> StateResult<Vec<WorkloadRecord>> {
        Ok(self
            .list_workloads()?
            .into_iter()
            .filter(|w| w.status == status)
            .collect())
    }

    /// Delete a workload by ID. Returns true if it existed.
    pub fn delete_workload(&self, workload_id: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
            existed = table
                .remove(workload_id)
                .map_err(map_err!(Write))?
                .is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fogplane_telemetry::{CpuMetrics, MemoryMetrics};
    use std::collections::HashMap;

    fn test_node(id: &str, class: NodeClass) -> NodeRecord {
        NodeRecord {
            node_id: id.to_string(),
            node_class: class,
            cpu: CpuMetrics {
                usage_percent: 25.0,
                ..CpuMetrics::default()
            },
            memory: MemoryMetrics {
                total_kb: 8192,
                used_kb: 4096,
                free_kb: 4096,
                usage_percent: 50.0,
                shared_kb: 0,
                cache_kb: 0,
            },
            network: HashMap::new(),
            reported_at: 1000,
            last_seen_at: 1000,
        }
    }

    fn test_workload(id: &str, status: WorkloadStatus) -> WorkloadRecord {
        WorkloadRecord {
            workload_id: id.to_string(),
            name: "api".to_string(),
            version: "1.0.0".to_string(),
            kind: WorkloadKind::Rest,
            description: String::new(),
            requirements: WorkloadRequirements::default(),
            labels: HashMap::new(),
            env: HashMap::new(),
            status,
            assigned_node_id: "node-1".to_string(),
            assigned_node_class: NodeClass::Edge,
            created_at: 1000,
            updated_at: 1000,
        }
    }

    // ── Node CRUD ──────────────────────────────────────────────────

    #[test]
    fn node_put_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        let node = test_node("node-1", NodeClass::Cloud);

        store.put_node(&node).unwrap();
        let retrieved = store.get_node("node-1").unwrap();

        assert_eq!(retrieved, Some(node));
    }

    #[test]
    fn node_get_nonexistent_returns_none() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(store.get_node("nope").unwrap().is_none());
    }

    #[test]
    fn node_put_replaces_whole_record() {
        let store = StateStore::open_in_memory().unwrap();
        let mut node = test_node("node-1", NodeClass::Cloud);
        node.network
            .insert("eth0".to_string(), Default::default());
        store.put_node(&node).unwrap();

        // A later heartbeat without eth0 fully supersedes the record.
        let replacement = test_node("node-1", NodeClass::Edge);
        store.put_node(&replacement).unwrap();

        let retrieved = store.get_node("node-1").unwrap().unwrap();
        assert_eq!(retrieved.node_class, NodeClass::Edge);
        assert!(retrieved.network.is_empty());
    }

    #[test]
    fn node_list_is_sorted_by_id() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_node(&test_node("node-c", NodeClass::Edge)).unwrap();
        store.put_node(&test_node("node-a", NodeClass::Cloud)).unwrap();
        store.put_node(&test_node("node-b", NodeClass::Edge)).unwrap();

        let ids: Vec<String> = store
            .list_nodes()
            .unwrap()
            .into_iter()
            .map(|n| n.node_id)
            .collect();
        assert_eq!(ids, vec!["node-a", "node-b", "node-c"]);
    }

    #[test]
    fn node_delete() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_node(&test_node("node-1", NodeClass::Cloud)).unwrap();

        assert!(store.delete_node("node-1").unwrap());
        assert!(!store.delete_node("node-1").unwrap());
        assert!(store.get_node("node-1").unwrap().is_none());
    }

    #[test]
    fn node_batch_delete() {
        let store = StateStore::open_in_memory().unwrap();
        store.put_node(&test_node("node-1", NodeClass::Cloud)).unwrap();
        store.put_node(&test_node("node-2", NodeClass::Edge)).unwrap();
        store.put_node(&test_node("node-3", NodeClass::Edge)).unwrap();

        let deleted = store
            .delete_nodes(&["node-1".to_string(), "node-3".to_string(), "ghost".to_string()])
            .unwrap();
        assert_eq!(deleted, 2);

        let remaining = store.list_nodes().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].node_id, "node-2");
    }

    // ── Workload CRUD ──────────────────────────────────────────────

    #[test]
    fn workload_put_and_get() {
        let store = StateStore::open_in_memory().unwrap();
        let workload = test_workload("api-1.0.0-1000", WorkloadStatus::Scheduled);

        store.put_workload(&workload).unwrap();
        let retrieved = store.get_workload("api-1.0.0-1000").unwrap();

        assert_eq!(retrieved, Some(workload));
    }

    #[test]
    fn workload_list_by_status() {
        let store = StateStore::open_in_memory().unwrap();
        store
            .put_workload(&test_workload("w-1", WorkloadStatus::Running))
            .unwrap();
        store
            .put_workload(&test_workload("w-2", WorkloadStatus::Scheduled))
            .unwrap();
        store
            .put_workload(&test_workload("w-3", WorkloadStatus::Running))
            .unwrap();

        let running = store
            .list_workloads_by_status(WorkloadStatus::Running)
            .unwrap();
        assert_eq!(running.len(), 2);

        let stopped = store
            .list_workloads_by_status(WorkloadStatus::Stopped)
            .unwrap();
        assert!(stopped.is_empty());
    }

    #[test]
    fn workload_delete() {
        let store = StateStore::open_in_memory().unwrap();
        store
            .put_workload(&test_workload("w-1", WorkloadStatus::Running))
            .unwrap();

        assert!(store.delete_workload("w-1").unwrap());
        assert!(store.get_workload("w-1").unwrap().is_none());
    }

    // ── Persistence (on-disk) ──────────────────────────────────────

    #[test]
    fn persistence_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("test.redb");

        {
            let store = StateStore::open(&db_path).unwrap();
            store.put_node(&test_node("node-1", NodeClass::Cloud)).unwrap();
        }

        // Reopen the same database file.
        let store = StateStore::open(&db_path).unwrap();
        let node = store.get_node("node-1").unwrap();
        assert!(node.is_some());
        assert_eq!(node.unwrap().node_class, NodeClass::Cloud);
    }

    // ── Edge cases ─────────────────────────────────────────────────

    #[test]
    fn empty_store_operations() {
        let store = StateStore::open_in_memory().unwrap();

        assert!(store.list_nodes().unwrap().is_empty());
        assert!(store.list_workloads().unwrap().is_empty());
        assert!(!store.delete_node("nope").unwrap());
        assert!(!store.delete_workload("nope").unwrap());
        assert_eq!(store.delete_nodes(&["nope".to_string()]).unwrap(), 0);
    }

    #[test]
    fn requirements_defaults_from_partial_json() {
        let requirements: WorkloadRequirements = serde_json::from_str("{}").unwrap();
        assert_eq!(requirements.cpu_cores, 0.1);
        assert_eq!(requirements.memory_mb, 128.0);
        assert!(requirements.affinity_labels.is_empty());
        assert!(requirements.preferred_node_class.is_none());
    }

    #[test]
    fn workload_spec_defaults_version() {
        let spec: WorkloadSpec =
            serde_json::from_str(r#"{"name": "api", "kind": "rest"}"#).unwrap();
        assert_eq!(spec.version, "1.0.0");
        assert_eq!(spec.requirements.cpu_cores, 0.1);
    }
}
