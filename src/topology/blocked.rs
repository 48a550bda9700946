use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    network::{
        device::{DeviceId, ProbeResult},
        edge::{Edge, UndirectedEdgeKey},
    },
    topology::builder::PromptIndex,
};

/// A port in the Alternate role together with the link behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedInterface {
    pub device_id: DeviceId,
    pub device: String,
    pub interface: String,
    pub neighbor_id: DeviceId,
    pub neighbor: String,
    pub neighbor_interface: String,
}

impl BlockedInterface {
    pub fn key(&self) -> UndirectedEdgeKey {
        UndirectedEdgeKey::new(self.device_id, self.neighbor_id)
    }
}

/// Blocked candidates, one per Alternate port whose CDP neighbor was probed.
///
/// An Alternate port without a CDP row, or facing a device we did not probe, yields nothing.
pub fn identify_blocked_links(results: &[ProbeResult]) -> Vec<BlockedInterface> {
    let index = PromptIndex::new(results);
    let mut candidates = Vec::new();
    for result in results.iter().filter(|r| r.is_success()) {
        for port in result.blocking_ports() {
            let Some(row) = result.cdp_row_on(&port.interface) else {
                debug!(device = %result.prompt, interface = %port.interface, "blocked port has no CDP neighbor");
                continue;
            };
            let Some(neighbor_id) = index.resolve(&row.neighbor_prompt) else {
                debug!(device = %result.prompt, neighbor = %row.neighbor_prompt, "blocked port faces an unprobed device");
                continue;
            };
            candidates.push(BlockedInterface {
                device_id: result.id,
                device: result.prompt.clone(),
                interface: port.interface.clone(),
                neighbor_id,
                neighbor: row.neighbor_prompt.clone(),
                neighbor_interface: row.neighbor_interface.clone(),
            });
        }
    }
    candidates
}

/// Outcome of matching blocked candidates against the canonical edge list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockedLinkResolution {
    /// Canonical edges removed because of a blocked candidate, in removal order.
    pub finally_deleted: Vec<Edge>,
    /// Canonical edges that remain.
    pub pruned: Vec<Edge>,
}

impl BlockedLinkResolution {
    /// Canonical list with finally deleted links kept but flagged.
    pub fn annotate(finally_deleted: &[Edge], canonical: &[Edge]) -> Vec<Edge> {
        let deleted: HashSet<UndirectedEdgeKey> = finally_deleted.iter().map(Edge::key).collect();
        canonical
            .iter()
            .cloned()
            .map(|mut edge| {
                if deleted.contains(&edge.key()) {
                    edge.mark_blocked();
                }
                edge
            })
            .collect()
    }
}

/// Remove, for each candidate, the first canonical edge joining the same two devices in
/// either orientation. Candidates with nothing left to match are dropped; when both ends of a
/// link report an Alternate port the second report finds the edge already gone.
pub fn resolve_blocked_links(candidates: &[BlockedInterface], canonical: &[Edge]) -> BlockedLinkResolution {
    let mut pruned = canonical.to_vec();
    let mut finally_deleted = Vec::new();
    for candidate in candidates {
        let key = candidate.key();
        match pruned.iter().position(|edge| edge.key() == key) {
            Some(pos) => finally_deleted.push(pruned.remove(pos)),
            None => debug!(
                device = %candidate.device,
                neighbor = %candidate.neighbor,
                "blocked link not in canonical list"
            ),
        }
    }
    BlockedLinkResolution {
        finally_deleted,
        pruned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        network::device::StpRole,
        topology::{
            builder::build_edges,
            fixtures::{probe, ring, ring_with_alternate, with_role},
        },
    };
    use proptest::prelude::*;

    fn id_of(results: &[ProbeResult], prompt: &str) -> DeviceId {
        results.iter().find(|r| r.prompt == prompt).unwrap().id
    }

    #[test]
    fn test_alternate_port_is_pruned_and_annotated() {
        let results = ring_with_alternate();
        let sw1 = id_of(&results, "SW1");
        let sw3 = id_of(&results, "SW3");

        let candidates = identify_blocked_links(&results);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].device, "SW3");
        assert_eq!(candidates[0].interface, "G 0/0");
        assert_eq!(candidates[0].neighbor, "SW1");
        assert_eq!(candidates[0].neighbor_interface, "G 1/0");

        let edges = build_edges(&results);
        let resolution = resolve_blocked_links(&candidates, &edges.canonical);
        let blocked_key = UndirectedEdgeKey::new(sw1, sw3);

        assert_eq!(resolution.finally_deleted.len(), 1);
        assert_eq!(resolution.finally_deleted[0].key(), blocked_key);
        assert_eq!(resolution.pruned.len(), edges.canonical.len() - 1);
        assert!(resolution.pruned.iter().all(|e| e.key() != blocked_key));

        let annotated = BlockedLinkResolution::annotate(&resolution.finally_deleted, &edges.canonical);
        assert_eq!(annotated.len(), edges.canonical.len());
        for edge in &annotated {
            assert_eq!(edge.blocked, edge.key() == blocked_key);
        }
        let flagged = annotated.iter().find(|e| e.blocked).unwrap();
        assert!(flagged.dashes);
        assert_eq!(flagged.color.as_deref(), Some("red"));
    }

    #[test]
    fn test_both_ends_alternate_removes_once() {
        let mut results = ring_with_alternate();
        results[0] = with_role(results[0].clone(), "SW3", StpRole::Alternate);
        let candidates = identify_blocked_links(&results);
        assert_eq!(candidates.len(), 2);

        let edges = build_edges(&results);
        let resolution = resolve_blocked_links(&candidates, &edges.canonical);
        assert_eq!(resolution.finally_deleted.len(), 1);
        assert_eq!(resolution.pruned.len(), edges.canonical.len() - 1);
    }

    #[test]
    fn test_alternate_without_cdp_neighbor_is_ignored() {
        let mut results = ring();
        results[2].stp_rows.push(crate::network::device::StpRow {
            interface: "G 3/3".to_string(),
            role: StpRole::Alternate,
            status: "BLK".to_string(),
            cost: 4,
        });
        assert!(identify_blocked_links(&results).is_empty());
    }

    #[test]
    fn test_other_roles_are_not_blocked() {
        let results = vec![
            with_role(probe(0, "SW1", true, &["SW2"]), "SW2", StpRole::Designated),
            with_role(probe(1, "SW2", false, &["SW1"]), "SW1", StpRole::Root),
        ];
        assert!(identify_blocked_links(&results).is_empty());
    }

    proptest! {
        #[test]
        fn prop_blocked_match_ignores_orientation(a in 0usize..50, b in 0usize..50, stored_forward: bool) {
            prop_assume!(a != b);
            let (from, to) = if stored_forward { (a, b) } else { (b, a) };
            let canonical = vec![
                Edge::new(DeviceId(from), DeviceId(to), "link".to_string()),
                Edge::new(DeviceId(50), DeviceId(51), "other".to_string()),
            ];
            let candidate = BlockedInterface {
                device_id: DeviceId(a),
                device: format!("SW{a}"),
                interface: "G 0/0".to_string(),
                neighbor_id: DeviceId(b),
                neighbor: format!("SW{b}"),
                neighbor_interface: "G 0/1".to_string(),
            };
            let resolution = resolve_blocked_links(&[candidate], &canonical);
            prop_assert_eq!(resolution.finally_deleted.len(), 1);
            prop_assert_eq!(&resolution.finally_deleted[0], &canonical[0]);
            prop_assert_eq!(resolution.pruned.len(), 1);

            let annotated = BlockedLinkResolution::annotate(&resolution.finally_deleted, &canonical);
            prop_assert!(annotated[0].blocked);
            prop_assert!(!annotated[1].blocked);
        }
    }
}
