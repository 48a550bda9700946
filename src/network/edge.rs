use serde::{Deserialize, Serialize};

use crate::network::device::DeviceId;

const BLOCKED_EDGE_COLOR: &str = "red";

/// A link between two probed devices, oriented the way it was reported by CDP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: DeviceId,
    pub to: DeviceId,
    pub title: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub blocked: bool,
    /// Visual marker for blocked links.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dashes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Edge {
    pub fn new(from: DeviceId, to: DeviceId, title: String) -> Self {
        Self {
            from,
            to,
            title,
            blocked: false,
            dashes: false,
            color: None,
        }
    }

    pub fn key(&self) -> UndirectedEdgeKey {
        UndirectedEdgeKey::new(self.from, self.to)
    }

    pub fn mark_blocked(&mut self) {
        self.blocked = true;
        self.dashes = true;
        self.color = Some(BLOCKED_EDGE_COLOR.to_string());
    }
}

/// Unordered endpoint pair. Two reports of the same physical link share one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UndirectedEdgeKey {
    pub a: DeviceId,
    pub b: DeviceId,
}

impl UndirectedEdgeKey {
    pub fn new(a: DeviceId, b: DeviceId) -> Self {
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        UndirectedEdgeKey { a, b }
    }
}
