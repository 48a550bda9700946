/*!
Topology graph construction.

Pure functions over a completed batch of probe results:
- `check_unique_prompts`: prompts are the join key for CDP neighbor names and must be unique.
- `find_root_bridge`: first successful device whose STP data marks it as root.
- `assign_levels`: breadth-first hop distance from the root over CDP adjacency.
- `build_edges`: full (as reported) and canonical (one per unordered pair) edge lists.
- `build_topology`: all of the above plus blocked-link resolution.
*/

use std::collections::{HashMap, HashSet};

use petgraph::{algo::kosaraju_scc, graphmap::DiGraphMap};
use tracing::{debug, info, warn};

use crate::{
    network::{
        device::{DeviceId, ProbeResult},
        edge::{Edge, UndirectedEdgeKey},
        network_graph::TopologyGraph,
        node::Node,
    },
    topology::{
        blocked::{BlockedLinkResolution, identify_blocked_links, resolve_blocked_links},
        error::GraphError,
        report::TopologyReport,
    },
};

/// Lookup from a neighbor name to the device that carries it as prompt.
/// Only successful probes are indexed; failed probes have no usable prompt.
pub struct PromptIndex<'a> {
    by_prompt: HashMap<&'a str, DeviceId>,
}

impl<'a> PromptIndex<'a> {
    pub fn new(results: &'a [ProbeResult]) -> Self {
        let mut by_prompt = HashMap::new();
        for result in results.iter().filter(|r| r.is_success()) {
            // First in iteration order wins; duplicates are rejected before this is used.
            by_prompt.entry(result.prompt.as_str()).or_insert(result.id);
        }
        Self { by_prompt }
    }

    pub fn resolve(&self, prompt: &str) -> Option<DeviceId> {
        self.by_prompt.get(prompt).copied()
    }
}

/// Canonical and full edge lists built from CDP adjacency rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeSets {
    /// One edge per resolved CDP row, oriented as reported.
    pub full: Vec<Edge>,
    /// One edge per unordered pair; the first report of a pair is kept.
    pub canonical: Vec<Edge>,
}

pub fn check_unique_prompts(results: &[ProbeResult]) -> Result<(), GraphError> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for result in results.iter().filter(|r| r.is_success()) {
        *counts.entry(result.prompt.as_str()).or_default() += 1;
    }
    // Report the first offender in input order so the error is deterministic.
    for result in results.iter().filter(|r| r.is_success()) {
        let count = counts[result.prompt.as_str()];
        if count > 1 {
            return Err(GraphError::DuplicatePrompt {
                prompt: result.prompt.clone(),
                count,
            });
        }
    }
    Ok(())
}

/// Locate the root bridge and set its level to 0.
///
/// The first successful device marked as root in iteration order wins. More than one marker
/// means the devices disagree about the spanning tree; this is logged, not resolved.
pub fn find_root_bridge(results: &mut [ProbeResult]) -> Option<DeviceId> {
    let mut roots = results.iter_mut().filter(|r| r.is_success() && r.is_root);
    let root = roots.next()?;
    root.level = Some(0);
    let root_id = root.id;
    let others: Vec<DeviceId> = roots.map(|r| r.id).collect();
    if !others.is_empty() {
        warn!(root = %root_id, ?others, "several devices claim to be the root bridge, using the first");
    }
    Some(root_id)
}

/// Directed adjacency as each device reports it through CDP, restricted to resolvable neighbors.
fn cdp_adjacency(results: &[ProbeResult], index: &PromptIndex<'_>) -> DiGraphMap<DeviceId, ()> {
    let mut adjacency = DiGraphMap::new();
    for result in results.iter().filter(|r| r.is_success()) {
        adjacency.add_node(result.id);
        for row in &result.cdp_rows {
            if let Some(neighbor) = index.resolve(&row.neighbor_prompt) {
                adjacency.add_edge(result.id, neighbor, ());
            }
        }
    }
    adjacency
}

/// Assign every device reachable from `root` its hop distance and return the node list in
/// discovery order. Levels are computed from scratch: whatever `level` the input carried is
/// overwritten, and devices not reached end up with `None`.
pub fn assign_levels(results: &mut [ProbeResult], root: DeviceId) -> Vec<Node> {
    let adjacency = {
        let index = PromptIndex::new(results);
        cdp_adjacency(results, &index)
    };
    let position: HashMap<DeviceId, usize> = results
        .iter()
        .enumerate()
        .map(|(pos, r)| (r.id, pos))
        .collect();
    let Some(&root_pos) = position.get(&root) else {
        return Vec::new();
    };

    let mut levels: HashMap<DeviceId, u32> = HashMap::from([(root, 0)]);
    let mut discovered = vec![root];
    let mut frontier = vec![root];
    let mut current = 0u32;
    while !frontier.is_empty() {
        let mut next = Vec::new();
        for device in frontier {
            for neighbor in adjacency.neighbors(device) {
                if !position.contains_key(&neighbor) || levels.contains_key(&neighbor) {
                    continue;
                }
                levels.insert(neighbor, current + 1);
                discovered.push(neighbor);
                next.push(neighbor);
            }
        }
        debug!(level = current + 1, discovered = next.len(), "level assigned");
        frontier = next;
        current += 1;
    }

    for result in results.iter_mut() {
        result.level = levels.get(&result.id).copied();
    }
    debug_assert_eq!(results[root_pos].level, Some(0));

    let unreachable = results
        .iter()
        .filter(|r| r.is_success() && r.level.is_none())
        .count();
    if unreachable > 0 {
        warn!(unreachable, "devices not connected to the root bridge are left out of the graph");
    }

    discovered
        .into_iter()
        .map(|id| {
            let result = &results[position[&id]];
            Node::new(result, levels[&id])
        })
        .collect()
}

fn edge_title(result: &ProbeResult, local_interface: &str, neighbor: &str, neighbor_interface: &str) -> String {
    format!(
        "{}: {local_interface} <-> {neighbor}: {neighbor_interface}",
        result.prompt
    )
}

pub fn build_edges(results: &[ProbeResult]) -> EdgeSets {
    let index = PromptIndex::new(results);
    let mut full = Vec::new();
    for result in results.iter().filter(|r| r.is_success()) {
        for row in &result.cdp_rows {
            let Some(neighbor) = index.resolve(&row.neighbor_prompt) else {
                debug!(device = %result.prompt, neighbor = %row.neighbor_prompt, "neighbor was not probed");
                continue;
            };
            full.push(Edge::new(
                result.id,
                neighbor,
                edge_title(result, &row.local_interface, &row.neighbor_prompt, &row.neighbor_interface),
            ));
        }
    }
    let canonical = canonicalize(&full);
    EdgeSets { full, canonical }
}

/// Collapse edges describing the same unordered pair, keeping the first one seen.
pub fn canonicalize(edges: &[Edge]) -> Vec<Edge> {
    let mut seen: HashSet<UndirectedEdgeKey> = HashSet::with_capacity(edges.len());
    edges
        .iter()
        .filter(|edge| seen.insert(edge.key()))
        .cloned()
        .collect()
}

/// Removing every link behind an Alternate port should leave a tree over the leveled nodes.
/// Anything else means the STP and CDP views disagree, which is worth a warning but not an error.
fn warn_unless_spanning_tree(graph: &TopologyGraph) {
    let (stable, _) = graph.to_stable_graph();
    let components = kosaraju_scc(&stable).len();
    let (nodes, edges) = (stable.node_count(), stable.edge_count());
    if components > 1 || edges + 1 != nodes {
        warn!(nodes, edges, components, "pruned graph is not a spanning tree");
    }
}

/// Build the leveled, de-duplicated topology from a batch of probe results.
///
/// Levels are recomputed and written back into `results`; levels carried by the input are
/// discarded. Failed probes are skipped throughout.
pub fn build_topology(results: &mut [ProbeResult]) -> Result<TopologyReport, GraphError> {
    for result in results.iter_mut() {
        result.level = None;
    }
    if results.is_empty() {
        return Err(GraphError::EmptyDeviceSet);
    }
    if !results.iter().any(ProbeResult::is_success) {
        return Err(GraphError::NoSuccessfulProbes);
    }
    check_unique_prompts(results)?;

    let root = find_root_bridge(results).ok_or(GraphError::NoRootBridgeFound)?;
    info!(%root, "root bridge found");

    let nodes = assign_levels(results, root);
    let edges = build_edges(results);
    let candidates = identify_blocked_links(results);
    let BlockedLinkResolution { finally_deleted, pruned } =
        resolve_blocked_links(&candidates, &edges.canonical);
    let annotated = BlockedLinkResolution::annotate(&finally_deleted, &edges.canonical);

    let graph = TopologyGraph::new(nodes, pruned);
    warn_unless_spanning_tree(&graph);
    info!(
        nodes = graph.nodes.len(),
        full_edges = edges.full.len(),
        canonical_edges = edges.canonical.len(),
        blocked = finally_deleted.len(),
        "topology built"
    );

    Ok(TopologyReport {
        root,
        graph,
        annotated_edges: annotated,
        full_edges: edges.full,
        blocked_interfaces: candidates,
        finally_deleted,
    })
}
