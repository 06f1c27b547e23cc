//! Local-system probes for metrics that do not travel in the raw blobs.
//!
//! Core count and load average come from the control-plane host's procfs
//! rather than the heartbeat body. When procfs is unreadable (non-Linux
//! dev machines, containers with a masked /proc) the probe degrades to
//! a single core and zero load instead of failing.

use serde::{Deserialize, Serialize};

use crate::types::LoadAverage;

/// Locally-probed host facts merged into parsed CPU metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HostInfo {
    pub core_count: u32,
    pub load_average: LoadAverage,
}

impl Default for HostInfo {
    fn default() -> Self {
        Self {
            core_count: 1,
            load_average: LoadAverage::default(),
        }
    }
}

impl HostInfo {
    /// Probe the local system. Never fails; unreadable sources default.
    pub fn probe() -> Self {
        let core_count = std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .map(|raw| parse_core_count(&raw))
            .unwrap_or(1);
        let load_average = std::fs::read_to_string("/proc/loadavg")
            .ok()
            .map(|raw| parse_load_average(&raw))
            .unwrap_or_default();

        Self {
            core_count,
            load_average,
        }
    }
}

/// Count `processor` entries in a `/proc/cpuinfo` dump. At least 1.
pub fn parse_core_count(raw: &str) -> u32 {
    let cores = raw
        .lines()
        .filter(|line| line.starts_with("processor"))
        .count() as u32;
    cores.max(1)
}

/// Parse the first three fields of `/proc/loadavg`.
pub fn parse_load_average(raw: &str) -> LoadAverage {
    let mut fields = raw.split_whitespace();
    let mut next = || {
        fields
            .next()
            .and_then(|f| f.parse::<f64>().ok())
            .unwrap_or(0.0)
    };
    LoadAverage {
        one: next(),
        five: next(),
        fifteen: next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_count_from_cpuinfo() {
        let raw = "processor\t: 0\nmodel name\t: x\nprocessor\t: 1\nprocessor\t: 2\n";
        assert_eq!(parse_core_count(raw), 3);
    }

    #[test]
    fn core_count_empty_defaults_to_one() {
        assert_eq!(parse_core_count(""), 1);
    }

    #[test]
    fn load_average_fields() {
        let load = parse_load_average("0.52 0.58 0.59 1/467 12345\n");
        assert_eq!(load.one, 0.52);
        assert_eq!(load.five, 0.58);
        assert_eq!(load.fifteen, 0.59);
    }

    #[test]
    fn load_average_garbage_zeroed() {
        assert_eq!(parse_load_average("not numbers"), LoadAverage::default());
    }
}
