//! Replica set and sharded cluster orchestration for test fixtures.
//!
//! This crate manages a group of locally-run database server processes as one
//! logical topology, and drives it through startup, configuration
//! propagation, stability confirmation and teardown. Consensus and shard
//! routing stay inside the database engine; this crate only issues its
//! control-plane commands and observes its reported state.
//!
//! # Overview
//!
//! The orchestrator handles:
//! - **Startup**: waking every stopped node, leaving running nodes alone
//! - **Initiation**: sending the one-time configuration command to the control node
//! - **Stability**: polling engine status until every started node is healthy
//! - **Disturbance**: stopping and starting single nodes by port during a test
//! - **Teardown**: stopping every running node, best effort
//!
//! # Architecture
//!
//! - [`node`]: The managed node contract and a process-backed implementation
//! - [`admin`]: The admin command contract and a shell-backed implementation
//! - [`topology`]: Topology groups, node roles and YAML manifests
//! - [`controller`]: The setup/teardown state machine
//! - [`error`]: Error types for orchestration operations
//!
//! # Example
//!
//! ```ignore
//! use quorumkit_orchestrator::{
//!     NodeRole, ProcessNode, ProcessNodeConfig, ShellAdminClient, TopologyController,
//!     TopologyGroup,
//! };
//! use quorumkit_core::ConfigurationDocument;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> quorumkit_orchestrator::Result<()> {
//!     let mut group = TopologyGroup::replica_set(ConfigurationDocument::new(json!({
//!         "_id": "rs0",
//!         "members": [
//!             { "_id": 0, "host": "localhost:27017" },
//!             { "_id": 1, "host": "localhost:27018" },
//!         ],
//!     })));
//!
//!     for port in [27017, 27018] {
//!         let config = ProcessNodeConfig::builder("mongod", port)
//!             .args(["--replSet", "rs0", "--port", &port.to_string()])
//!             .build();
//!         group.add_member(NodeRole::Member, Arc::new(ProcessNode::new(config)))?;
//!     }
//!
//!     let mut controller =
//!         TopologyController::new(Arc::new(group), Arc::new(ShellAdminClient::new()));
//!
//!     controller.setup().await?;
//!     // ... run the test body ...
//!     controller.teardown().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod admin;
pub mod controller;
pub mod error;
pub mod node;
pub mod topology;

#[cfg(test)]
#[allow(missing_docs)]
pub(crate) mod testing;

// Re-export commonly used types at the crate root
pub use admin::{AdminCommandClient, SharedAdminClient, ShellAdminClient, ShellAdminConfig};
pub use controller::{ControllerConfig, ControllerPhase, TopologyController};
pub use error::{Result, TopologyError};
pub use node::{ManagedNode, ProcessNode, ProcessNodeConfig, SharedNode};
pub use topology::{NodeManifest, NodeRole, TopologyGroup, TopologyKind, TopologyManifest};
