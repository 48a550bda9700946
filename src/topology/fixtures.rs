//! Hand-built probe results shared by the topology tests.

use crate::network::device::{CdpRow, DeviceId, ProbeResult, ProbeStatus, StpRole, StpRow};

/// Successful probe of `prompt`. The k-th neighbor is reached through local port `G 0/k`
/// and every neighbor answers on `G 1/0`.
pub fn probe(id: usize, prompt: &str, is_root: bool, neighbors: &[&str]) -> ProbeResult {
    let cdp_rows = neighbors
        .iter()
        .enumerate()
        .map(|(k, neighbor)| CdpRow {
            local_interface: format!("G 0/{k}"),
            neighbor_prompt: neighbor.to_string(),
            neighbor_interface: "G 1/0".to_string(),
        })
        .collect();
    ProbeResult {
        id: DeviceId(id),
        device_type: "cisco_ios".to_string(),
        host_address: format!("10.0.0.{}", id + 1),
        prompt: prompt.to_string(),
        status: ProbeStatus::Success,
        stp_rows: Vec::new(),
        cdp_rows,
        is_root,
        level: None,
    }
}

/// Add an STP row with `role` on the port facing `neighbor`.
pub fn with_role(mut result: ProbeResult, neighbor: &str, role: StpRole) -> ProbeResult {
    if let Some(row) = result.cdp_rows.iter().find(|row| row.neighbor_prompt == neighbor) {
        result.stp_rows.push(StpRow {
            interface: row.local_interface.clone(),
            role,
            status: if role.is_blocking() { "BLK" } else { "FWD" }.to_string(),
            cost: 4,
        });
    }
    result
}

/// Five switches in a ring rooted at SW2, every link reported from both ends:
/// SW2-SW1, SW2-SW4, SW1-SW3, SW4-SW5, SW3-SW5.
pub fn ring() -> Vec<ProbeResult> {
    vec![
        probe(0, "SW1", false, &["SW2", "SW3"]),
        probe(1, "SW2", true, &["SW1", "SW4"]),
        probe(2, "SW3", false, &["SW1", "SW5"]),
        probe(3, "SW4", false, &["SW2", "SW5"]),
        probe(4, "SW5", false, &["SW4", "SW3"]),
    ]
}

/// `ring` with SW3's port towards SW1 in the Alternate role.
pub fn ring_with_alternate() -> Vec<ProbeResult> {
    let mut results = ring();
    results[2] = with_role(results[2].clone(), "SW1", StpRole::Alternate);
    results
}
