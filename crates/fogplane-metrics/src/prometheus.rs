//! Prometheus text exposition format.
//!
//! Renders a fleet snapshot into the Prometheus text exposition format
//! for scraping by a Prometheus server or compatible agent.

use crate::collector::FleetSnapshot;

/// Render a fleet snapshot into Prometheus text format.
pub fn render_prometheus(snapshot: &FleetSnapshot) -> String {
    let mut out = String::new();

    out.push_str("# HELP fogplane_node_heartbeats_total Heartbeats received per node.\n");
    out.push_str("# TYPE fogplane_node_heartbeats_total counter\n");
    for (node_id, sample) in &snapshot.nodes {
        out.push_str(&format!(
            "fogplane_node_heartbeats_total{{node=\"{}\",class=\"{}\"}} {}\n",
            node_id,
            sample.node_class.as_str(),
            sample.heartbeats
        ));
    }

    out.push_str("# HELP fogplane_node_cpu_usage_percent Latest reported CPU usage per node.\n");
    out.push_str("# TYPE fogplane_node_cpu_usage_percent gauge\n");
    for (node_id, sample) in &snapshot.nodes {
        out.push_str(&format!(
            "fogplane_node_cpu_usage_percent{{node=\"{}\",class=\"{}\"}} {:.2}\n",
            node_id,
            sample.node_class.as_str(),
            sample.cpu_usage_percent
        ));
    }

    out.push_str(
        "# HELP fogplane_node_memory_usage_percent Latest reported memory usage per node.\n",
    );
    out.push_str("# TYPE fogplane_node_memory_usage_percent gauge\n");
    for (node_id, sample) in &snapshot.nodes {
        out.push_str(&format!(
            "fogplane_node_memory_usage_percent{{node=\"{}\",class=\"{}\"}} {:.2}\n",
            node_id,
            sample.node_class.as_str(),
            sample.memory_usage_percent
        ));
    }

    out.push_str("# HELP fogplane_placements_total Successful placement decisions.\n");
    out.push_str("# TYPE fogplane_placements_total counter\n");
    out.push_str(&format!(
        "fogplane_placements_total {}\n",
        snapshot.placements_total
    ));

    out.push_str("# HELP fogplane_scheduling_failures_total Scheduling attempts with no candidate.\n");
    out.push_str("# TYPE fogplane_scheduling_failures_total counter\n");
    out.push_str(&format!(
        "fogplane_scheduling_failures_total {}\n",
        snapshot.scheduling_failures_total
    ));

    out.push_str("# HELP fogplane_rebalance_runs_total Rebalance analysis passes.\n");
    out.push_str("# TYPE fogplane_rebalance_runs_total counter\n");
    out.push_str(&format!(
        "fogplane_rebalance_runs_total {}\n",
        snapshot.rebalance_runs_total
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::NodeSample;
    use fogplane_state::NodeClass;
    use std::collections::BTreeMap;

    fn test_snapshot() -> FleetSnapshot {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "edge-1".to_string(),
            NodeSample {
                node_class: NodeClass::Edge,
                heartbeats: 12,
                cpu_usage_percent: 27.5,
                memory_usage_percent: 50.0,
            },
        );
        FleetSnapshot {
            nodes,
            placements_total: 3,
            scheduling_failures_total: 1,
            rebalance_runs_total: 2,
        }
    }

    #[test]
    fn render_empty() {
        let output = render_prometheus(&FleetSnapshot::default());
        // Type declarations and scalar counters are always present.
        assert!(output.contains("# TYPE fogplane_node_heartbeats_total counter"));
        assert!(output.contains("fogplane_placements_total 0"));
    }

    #[test]
    fn render_node_samples() {
        let output = render_prometheus(&test_snapshot());

        assert!(output
            .contains("fogplane_node_heartbeats_total{node=\"edge-1\",class=\"edge\"} 12"));
        assert!(output
            .contains("fogplane_node_cpu_usage_percent{node=\"edge-1\",class=\"edge\"} 27.50"));
        assert!(output
            .contains("fogplane_node_memory_usage_percent{node=\"edge-1\",class=\"edge\"} 50.00"));
        assert!(output.contains("fogplane_placements_total 3"));
        assert!(output.contains("fogplane_scheduling_failures_total 1"));
        assert!(output.contains("fogplane_rebalance_runs_total 2"));
    }

    #[test]
    fn render_format_is_prometheus_compatible() {
        let output = render_prometheus(&test_snapshot());

        // Every non-comment line is `name{labels} value` or `name value`.
        for line in output.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (head, value) = line.rsplit_once(' ').expect("value separated by space");
            assert!(!head.is_empty());
            assert!(value.parse::<f64>().is_ok(), "non-numeric value: {line}");
        }
    }
}
