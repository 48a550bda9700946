/*
 * This module defines the switch-level data model shared by the collector and the builder,
 * and the leveled graph format returned to callers.
 */

pub mod device;
pub mod node;
pub mod edge;
pub mod network_graph;
