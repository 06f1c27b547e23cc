//! fogplane-telemetry — normalization of raw OS telemetry.
//!
//! Agents report three blobs of semi-structured text per heartbeat: the
//! aggregate CPU accounting line (`/proc/stat` format), a memory summary
//! line (`free` format), and per-interface network counters
//! (`/proc/net/dev` format). This crate turns those blobs into comparable
//! numeric metrics.
//!
//! The parsers are deliberately tolerant: telemetry loss must never block
//! ingestion, so malformed input yields zeroed metrics (logged as a data
//! quality signal) rather than an error.

pub mod host;
pub mod parser;
pub mod types;

pub use host::HostInfo;
pub use parser::{parse_cpu, parse_heartbeat, parse_memory, parse_network, round2};
pub use types::{
    CpuMetrics, InterfaceStats, LoadAverage, MemoryMetrics, NormalizedTelemetry,
};
