use std::collections::HashMap;

use petgraph::{Undirected, graph::NodeIndex, prelude::StableGraph};
use serde::{Deserialize, Serialize};

use crate::network::{device::DeviceId, edge::Edge, node::Node};

/// Leveled node list plus edge list, the shape handed to callers and the web frontend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl TopologyGraph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Export into a petgraph graph. Edges whose endpoints are not in the node list are skipped.
    pub fn to_stable_graph(&self) -> (StableGraph<Node, Edge, Undirected>, HashMap<DeviceId, NodeIndex>) {
        let mut graph = StableGraph::default();
        let mut node_id_to_index_map = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let index = graph.add_node(node.clone());
            node_id_to_index_map.insert(node.id, index);
        }
        for edge in &self.edges {
            if let (Some(&from), Some(&to)) = (
                node_id_to_index_map.get(&edge.from),
                node_id_to_index_map.get(&edge.to),
            ) {
                graph.add_edge(from, to, edge.clone());
            }
        }
        (graph, node_id_to_index_map)
    }

    /// Text tree of the nodes ordered by level, indented by depth.
    pub fn render_tree(&self) -> String {
        let mut sorted: Vec<&Node> = self.nodes.iter().collect();
        sorted.sort_by_key(|node| (node.level, node.id));

        let mut out = String::new();
        for node in sorted {
            let indent = "--".repeat(node.level as usize);
            out.push_str(&format!(
                "{indent}{} - {}, Level: {}\n",
                node.label, node.title, node.level
            ));
        }
        out
    }
}
