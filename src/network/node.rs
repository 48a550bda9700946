use serde::{Deserialize, Serialize};

use crate::network::device::{DeviceId, ProbeResult};

/// A device placed in the leveled topology. `level` is the hop distance from the root bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: DeviceId,
    pub label: String,
    pub level: u32,
    pub title: String,
}

impl Node {
    pub fn new(result: &ProbeResult, level: u32) -> Self {
        Self {
            id: result.id,
            label: result.prompt.clone(),
            level,
            title: result.title(),
        }
    }
}
