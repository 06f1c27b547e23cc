//! redb table definitions for the Fogplane state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). redb iterates keys in sorted order, which downstream code
//! relies on for deterministic listings.

use redb::TableDefinition;

/// Node records keyed by `{node_id}`.
pub const NODES: TableDefinition<&str, &[u8]> = TableDefinition::new("nodes");

/// Workload records keyed by `{workload_id}`.
pub const WORKLOADS: TableDefinition<&str, &[u8]> = TableDefinition::new("workloads");
