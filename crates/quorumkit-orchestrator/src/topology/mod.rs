//! Topology definition types.
//!
//! This module provides the membership registry of a replica set or sharded
//! cluster, and a YAML manifest format for declaring one.

mod group;
mod manifest;

pub use group::{NodeRole, TopologyGroup, TopologyKind};
pub use manifest::{NodeManifest, TopologyManifest};
