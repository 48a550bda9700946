use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::DeviceDescriptor,
    data_aquisition::core::DeviceProber,
    network::{
        device::{DeviceId, ProbeResult},
        edge::Edge,
        network_graph::TopologyGraph,
        node::Node,
    },
    topology::{
        blocked::BlockedInterface,
        builder::build_topology,
        collector::{ProbeSummary, collect},
        error::GraphError,
    },
};

/// Everything the builder produces from one batch of probe results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologyReport {
    pub root: DeviceId,
    /// Leveled nodes with the pruned canonical edges.
    pub graph: TopologyGraph,
    /// Canonical edges with blocked links flagged instead of removed.
    pub annotated_edges: Vec<Edge>,
    pub full_edges: Vec<Edge>,
    pub blocked_interfaces: Vec<BlockedInterface>,
    pub finally_deleted: Vec<Edge>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElapsedTime {
    pub value: f64,
    pub unit: String,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Seconds above one second, milliseconds below.
impl From<Duration> for ElapsedTime {
    fn from(elapsed: Duration) -> Self {
        let seconds = elapsed.as_secs_f64();
        if seconds > 1.0 {
            Self {
                value: round2(seconds),
                unit: "s".to_string(),
            }
        } else {
            Self {
                value: round2(seconds * 1000.0),
                unit: "ms".to_string(),
            }
        }
    }
}

/// Result of one discovery run as returned to CLI and HTTP callers.
///
/// On failure `error` is set, `error_description` explains why and the graph fields are empty.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyResponse {
    pub root: Option<DeviceId>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub edges_with_blocked_links: Vec<Edge>,
    pub blocked_interfaces: Vec<BlockedInterface>,
    pub finally_deleted: Vec<Edge>,
    pub summary: ProbeSummary,
    pub error: bool,
    pub error_description: String,
    pub elapsed_time: ElapsedTime,
}

impl TopologyResponse {
    pub fn from_report(report: TopologyReport, summary: ProbeSummary, elapsed: Duration) -> Self {
        Self {
            root: Some(report.root),
            nodes: report.graph.nodes,
            edges: report.graph.edges,
            edges_with_blocked_links: report.annotated_edges,
            blocked_interfaces: report.blocked_interfaces,
            finally_deleted: report.finally_deleted,
            summary,
            error: false,
            error_description: String::new(),
            elapsed_time: elapsed.into(),
        }
    }

    pub fn failed(error: &GraphError, summary: ProbeSummary, elapsed: Duration) -> Self {
        Self {
            root: None,
            nodes: Vec::new(),
            edges: Vec::new(),
            edges_with_blocked_links: Vec::new(),
            blocked_interfaces: Vec::new(),
            finally_deleted: Vec::new(),
            summary,
            error: true,
            error_description: error.to_string(),
            elapsed_time: elapsed.into(),
        }
    }

    /// The graph the caller asked for: pruned, or with blocked links flagged.
    pub fn graph(&self, annotated: bool) -> TopologyGraph {
        let edges = if annotated {
            &self.edges_with_blocked_links
        } else {
            &self.edges
        };
        TopologyGraph::new(self.nodes.clone(), edges.clone())
    }
}

/// Run the builder over already collected results.
pub fn respond(mut results: Vec<ProbeResult>, started: Instant) -> TopologyResponse {
    let summary = ProbeSummary::from_results(&results);
    info!(
        successful = summary.successful,
        failed = summary.failed(),
        "\n{}",
        summary.render()
    );

    match build_topology(&mut results) {
        Ok(report) => {
            let elapsed = started.elapsed();
            info!(elapsed = %humantime::format_duration(elapsed), "discovery finished");
            TopologyResponse::from_report(report, summary, elapsed)
        }
        Err(e) => {
            warn!("topology not built: {e}");
            TopologyResponse::failed(&e, summary, started.elapsed())
        }
    }
}

/// Probe every device and build the topology.
pub async fn discover<P>(prober: &P, devices: &[DeviceDescriptor], max_workers: usize) -> TopologyResponse
where
    P: DeviceProber + ?Sized,
{
    let started = Instant::now();
    if devices.is_empty() {
        warn!("inventory is empty");
        return TopologyResponse::failed(&GraphError::EmptyDeviceSet, ProbeSummary::default(), started.elapsed());
    }
    let results = collect(prober, devices, max_workers).await;
    respond(results, started)
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        network::device::ProbeStatus,
        topology::fixtures::ring_with_alternate,
    };

    /// Serves canned results from the ring fixture, keyed by inventory position.
    struct CannedProber {
        results: Vec<ProbeResult>,
    }

    #[async_trait]
    impl DeviceProber for CannedProber {
        async fn probe(&self, id: DeviceId, device: &DeviceDescriptor) -> ProbeResult {
            match self.results.iter().find(|r| r.id == id) {
                Some(result) => result.clone(),
                None => ProbeResult::failed(id, &device.host, &device.device_type, ProbeStatus::Timeout),
            }
        }
    }

    fn inventory(count: usize) -> Vec<DeviceDescriptor> {
        (0..count)
            .map(|i| {
                serde_json::from_value(serde_json::json!({
                    "host": format!("10.0.0.{}", i + 1),
                    "username": "admin",
                    "password": "cisco",
                }))
                .unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn test_discover_ring() {
        let prober = CannedProber {
            results: ring_with_alternate(),
        };
        let response = discover(&prober, &inventory(5), 2).await;

        assert!(!response.error);
        assert!(response.error_description.is_empty());
        assert_eq!(response.root, Some(DeviceId(1)));
        assert_eq!(response.nodes.len(), 5);
        assert_eq!(response.edges_with_blocked_links.len(), 5);
        assert_eq!(response.edges.len(), 4);
        assert_eq!(response.blocked_interfaces.len(), 1);
        assert_eq!(response.finally_deleted.len(), 1);
        assert_eq!(response.summary.successful, 5);
        assert!(["s", "ms"].contains(&response.elapsed_time.unit.as_str()));

        assert_eq!(response.graph(true).edges.iter().filter(|e| e.blocked).count(), 1);
        assert!(response.graph(false).edges.iter().all(|e| !e.blocked));
    }

    #[tokio::test]
    async fn test_discover_counts_timeouts() {
        // Sixth inventory entry has no canned result and times out.
        let prober = CannedProber {
            results: ring_with_alternate(),
        };
        let response = discover(&prober, &inventory(6), 8).await;

        assert!(!response.error);
        assert_eq!(response.nodes.len(), 5);
        assert_eq!(response.summary.total, 6);
        assert_eq!(response.summary.statuses["timeout"].devices, vec!["10.0.0.6"]);
    }

    #[tokio::test]
    async fn test_discover_empty_inventory() {
        let prober = CannedProber { results: Vec::new() };
        let response = discover(&prober, &[], 8).await;
        assert!(response.error);
        assert_eq!(response.error_description, GraphError::EmptyDeviceSet.to_string());
        assert!(response.nodes.is_empty());
    }

    #[test]
    fn test_error_response_shape() {
        let mut results = ring_with_alternate();
        results[3].prompt = "SW1".to_string();
        let response = respond(results, Instant::now());

        assert!(response.error);
        assert!(response.nodes.is_empty());
        assert!(response.edges.is_empty());
        assert!(response.edges_with_blocked_links.is_empty());
        assert_eq!(response.summary.total, 5);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], true);
        assert!(json["error_description"].as_str().unwrap().contains("SW1"));
        assert!(json["elapsed_time"]["value"].is_number());
    }

    #[test]
    fn test_elapsed_time_rounding() {
        let elapsed = ElapsedTime::from(Duration::from_millis(1234));
        assert_eq!(elapsed.value, 1.23);
        assert_eq!(elapsed.unit, "s");

        let elapsed = ElapsedTime::from(Duration::from_micros(250_500));
        assert_eq!(elapsed.value, 250.5);
        assert_eq!(elapsed.unit, "ms");
    }
}
