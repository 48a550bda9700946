use std::collections::BTreeMap;

use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    config::DeviceDescriptor,
    data_aquisition::core::DeviceProber,
    network::device::{DeviceId, ProbeResult},
};

/// Probe every device with at most `max_workers` probes in flight.
///
/// Ids are the inventory positions, fixed before anything is dispatched. The returned list
/// holds exactly one result per descriptor, in completion order.
pub async fn collect<P>(prober: &P, devices: &[DeviceDescriptor], max_workers: usize) -> Vec<ProbeResult>
where
    P: DeviceProber + ?Sized,
{
    let workers = devices.len().min(max_workers).max(1);
    info!(devices = devices.len(), workers, "collecting probe results");

    // Built before streaming so the future stays `Send` when awaited from an HTTP handler.
    let probes: Vec<_> = devices
        .iter()
        .enumerate()
        .map(|(index, device)| prober.probe(DeviceId(index), device))
        .collect();
    let results: Vec<ProbeResult> = stream::iter(probes)
        .buffer_unordered(workers)
        .collect()
        .await;

    debug!(results = results.len(), "collection finished");
    results
}

const STATUS_BUCKETS: [&str; 4] = ["success", "authentication_failure", "timeout", "other_failure"];

/// Devices that ended up with one particular status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusBucket {
    pub count: usize,
    pub percentage: f64,
    /// `"<prompt> - <host>"`, or just the host when no prompt was read.
    pub devices: Vec<String>,
}

/// Per-status breakdown of one collection run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeSummary {
    pub total: usize,
    pub successful: usize,
    /// Keyed by `ProbeStatus::bucket`.
    pub statuses: BTreeMap<String, StatusBucket>,
}

fn device_label(result: &ProbeResult) -> String {
    if result.prompt.is_empty() {
        result.host_address.clone()
    } else {
        format!("{} - {}", result.prompt, result.host_address)
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 10000.0).round() / 100.0
}

impl ProbeSummary {
    pub fn from_results(results: &[ProbeResult]) -> Self {
        let mut ordered: Vec<&ProbeResult> = results.iter().collect();
        ordered.sort_by_key(|r| r.id);

        // Every bucket is reported, empty or not.
        let mut statuses: BTreeMap<String, StatusBucket> = STATUS_BUCKETS
            .iter()
            .map(|name| (name.to_string(), StatusBucket::default()))
            .collect();
        for result in ordered {
            let bucket = statuses.entry(result.status.bucket().to_string()).or_default();
            bucket.count += 1;
            bucket.devices.push(device_label(result));
        }
        let total = results.len();
        for bucket in statuses.values_mut() {
            bucket.percentage = percentage(bucket.count, total);
        }
        let successful = results.iter().filter(|r| r.is_success()).count();

        Self {
            total,
            successful,
            statuses,
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.successful
    }

    /// Human readable report for the log and the CLI.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Successful connections: {}/{} ({:.2}%)\n",
            self.successful,
            self.total,
            percentage(self.successful, self.total)
        );
        for (name, bucket) in &self.statuses {
            out.push_str(&format!(
                "{name}: {} ({:.2}%)\n",
                bucket.count, bucket.percentage
            ));
            for device in &bucket.devices {
                out.push_str(&format!("  {device}\n"));
            }
        }
        out
    }
}
