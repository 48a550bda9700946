/*!
Topology module

Turns an inventory of switches into a leveled Layer-2 graph rooted at the spanning tree root.

Structure:
- `collector`: Probes all devices through a `DeviceProber` with a bounded pool and summarizes outcomes.
- `builder`: Prompt uniqueness gate, root bridge lookup, breadth-first leveling and edge de-duplication.
- `blocked`: Finds links behind Alternate ports and derives the pruned and annotated edge lists.
- `report`: The response handed to the CLI and HTTP layers, plus `discover` tying everything together.
- `error`: Conditions that stop graph construction.
*/

pub mod blocked;
pub mod builder;
pub mod collector;
pub mod error;
pub mod report;

#[cfg(test)]
mod fixtures;

pub use report::{TopologyResponse, discover, respond};
