//! Parsers for the three raw telemetry formats agents report.
//!
//! Malformed input never errors: each parser falls back to zeroed
//! metrics so a node with a broken collector still counts as alive.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::host::HostInfo;
use crate::types::{CpuMetrics, InterfaceStats, MemoryMetrics, NormalizedTelemetry};

/// Interface name prefixes excluded from network metrics.
const VIRTUAL_INTERFACE_PREFIXES: [&str; 3] = ["lo", "docker", "veth"];

/// Round to 2 decimal places, half away from zero.
///
/// Every percentage the control plane stores or scores goes through this,
/// so placement decisions are reproducible across hosts.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse the aggregate CPU line of a `/proc/stat` dump.
///
/// Expects a line whose first token is exactly `cpu`, followed by the
/// POSIX jiffy counters (user, nice, system, idle, iowait, irq, softirq).
/// Busy time is everything except idle and iowait.
pub fn parse_cpu(raw: &str) -> CpuMetrics {
    let Some(fields) = raw
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .find(|fields| fields.first() == Some(&"cpu"))
    else {
        warn!("no aggregate cpu line in telemetry, returning zeroed cpu metrics");
        return CpuMetrics::default();
    };

    let counter = |idx: usize| -> u64 {
        fields
            .get(idx)
            .and_then(|f| f.parse::<u64>().ok())
            .unwrap_or(0)
    };

    let user = counter(1);
    let nice = counter(2);
    let system = counter(3);
    let idle = counter(4);
    let iowait = counter(5);
    let irq = counter(6);
    let softirq = counter(7);

    let total = user + nice + system + idle + iowait + irq + softirq;
    let used = total.saturating_sub(idle + iowait);
    let usage_percent = if total > 0 {
        round2(100.0 * used as f64 / total as f64)
    } else {
        0.0
    };

    CpuMetrics {
        usage_percent,
        ..CpuMetrics::default()
    }
}

/// Parse the `Mem:` line of a `free` summary.
///
/// Columns: total, used, free, shared, cache, available — in whatever
/// unit the reporter uses consistently (kilobytes by convention). Usage
/// is computed from availability (`total - available`), not the raw
/// "used" column.
pub fn parse_memory(raw: &str) -> MemoryMetrics {
    let Some(fields) = raw
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .find(|fields| fields.first() == Some(&"Mem:"))
    else {
        warn!("no Mem: line in telemetry, returning zeroed memory metrics");
        return MemoryMetrics::default();
    };

    let counter = |idx: usize| -> u64 {
        fields
            .get(idx)
            .and_then(|f| f.parse::<u64>().ok())
            .unwrap_or(0)
    };

    let total = counter(1);
    let shared = counter(4);
    let cache = counter(5);
    let available = counter(6);

    let actual_used = total.saturating_sub(available);
    let usage_percent = if total > 0 {
        round2(100.0 * actual_used as f64 / total as f64)
    } else {
        0.0
    };

    MemoryMetrics {
        total_kb: total,
        used_kb: actual_used,
        free_kb: available,
        usage_percent,
        shared_kb: shared,
        cache_kb: cache,
    }
}

/// Parse a `/proc/net/dev`-style per-interface counter dump.
///
/// Each parsable line is `name: <16+ counters>`. Loopback and virtual
/// interfaces (`lo*`, `docker*`, `veth*`) are excluded; lines with fewer
/// than 16 counters are skipped.
pub fn parse_network(raw: &str) -> HashMap<String, InterfaceStats> {
    let mut interfaces = HashMap::new();

    for line in raw.lines() {
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();

        if VIRTUAL_INTERFACE_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
        {
            continue;
        }

        let fields: Vec<&str> = counters.split_whitespace().collect();
        if fields.len() < 16 {
            continue;
        }

        let counter = |idx: usize| -> u64 { fields[idx].parse::<u64>().unwrap_or(0) };

        let rx_bytes = counter(0);
        let tx_bytes = counter(8);
        interfaces.insert(
            name.to_string(),
            InterfaceStats {
                rx_bytes,
                rx_packets: counter(1),
                rx_errors: counter(2),
                tx_bytes,
                tx_packets: counter(9),
                tx_errors: counter(10),
                total_bytes: rx_bytes + tx_bytes,
            },
        );
    }

    interfaces
}

/// Normalize one heartbeat's raw telemetry.
///
/// Composes the three parsers, merges in locally-probed host info (core
/// count and load average do not travel in the raw blobs), and stamps
/// the parse-completion time. The single entry point for ingestion.
pub fn parse_heartbeat(
    cpu_raw: &str,
    memory_raw: &str,
    network_raw: &str,
    host: HostInfo,
) -> NormalizedTelemetry {
    let mut cpu = parse_cpu(cpu_raw);
    cpu.core_count = host.core_count.max(1);
    cpu.load_average = host.load_average;

    NormalizedTelemetry {
        cpu,
        memory: parse_memory(memory_raw),
        network: parse_network(network_raw),
        parsed_at: epoch_millis(),
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
