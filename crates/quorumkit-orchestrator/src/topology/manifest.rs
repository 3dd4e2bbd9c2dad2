//! YAML topology manifests.
//!
//! A manifest declares a topology of process-backed nodes so that fixtures
//! can be described in a file instead of code:
//!
//! ```yaml
//! kind: replica_set
//! username: admin
//! password: secret
//! configuration:
//!   _id: rs0
//!   members:
//!     - { _id: 0, host: "localhost:27017" }
//!     - { _id: 1, host: "localhost:27018" }
//! nodes:
//!   - role: member
//!     binary: mongod
//!     port: 27017
//!     args: ["--replSet", "rs0", "--port", "27017", "--dbpath", "/tmp/rs0-0"]
//!   - role: member
//!     binary: mongod
//!     port: 27018
//!     args: ["--replSet", "rs0", "--port", "27018", "--dbpath", "/tmp/rs0-1"]
//! ```

use quorumkit_core::ConfigurationDocument;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::node::{ProcessNode, ProcessNodeConfig};
use crate::topology::{NodeRole, TopologyGroup, TopologyKind};

/// One node entry of a manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeManifest {
    /// Role of the node.
    pub role: NodeRole,

    /// Process settings.
    #[serde(flatten)]
    pub process: ProcessNodeConfig,
}

/// Declarative description of a topology.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyManifest {
    /// Topology kind.
    pub kind: TopologyKind,

    /// Payload of the initiation command.
    #[serde(default)]
    pub configuration: ConfigurationDocument,

    /// Username for admin commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password for admin commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Port of the replica set member addressed for admin commands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_connection: Option<u16>,

    /// Nodes in declared order.
    #[serde(default)]
    pub nodes: Vec<NodeManifest>,
}

impl TopologyManifest {
    /// Parses a manifest from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a manifest file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading topology manifest");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Serializes the manifest to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Builds a group of stopped process-backed nodes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a node role does not fit the kind.
    pub fn into_group(self) -> Result<TopologyGroup> {
        let mut group = match self.kind {
            TopologyKind::ReplicaSet => TopologyGroup::replica_set(self.configuration),
            TopologyKind::Sharded => TopologyGroup::sharded(self.configuration),
        };

        if let Some(username) = self.username {
            group.set_username(username);
        }
        if let Some(password) = self.password {
            group.set_password(password);
        }
        if let Some(port) = self.default_connection {
            group.set_default_connection(port);
        }

        for node in self.nodes {
            group.add_member(node.role, Arc::new(ProcessNode::new(node.process)))?;
        }

        Ok(group)
    }
}
