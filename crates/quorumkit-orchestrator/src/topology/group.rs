//! Topology group definitions.
//!
//! A group is the declarative registry of the nodes taking part in one
//! replica set or sharded cluster. It is built once, then only read; node
//! readiness is the one piece of state that changes, and it lives inside
//! each node.

use quorumkit_core::{ConfigurationDocument, Credentials, ServerAddress};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TopologyError};
use crate::node::SharedNode;

/// The shape of a topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    /// A single flat list of replica set members.
    ReplicaSet,

    /// Shards, config servers and routers.
    Sharded,
}

impl TopologyKind {
    /// Returns the name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReplicaSet => "replica-set",
            Self::Sharded => "sharded",
        }
    }
}

/// The role a node plays in its topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// A replica set member.
    Member,

    /// A shard server.
    Shard,

    /// A config server.
    Config,

    /// A query router.
    Router,
}

impl NodeRole {
    /// Returns the name of this role.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Shard => "shard",
            Self::Config => "config",
            Self::Router => "router",
        }
    }

    /// Returns true if the role can be registered in a topology of `kind`.
    pub fn fits(&self, kind: TopologyKind) -> bool {
        match kind {
            TopologyKind::ReplicaSet => matches!(self, Self::Member),
            TopologyKind::Sharded => !matches!(self, Self::Member),
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Membership registry of a replica set or sharded cluster.
///
/// # Example
///
/// ```ignore
/// use quorumkit_orchestrator::topology::{NodeRole, TopologyGroup};
///
/// let mut group = TopologyGroup::replica_set(config)
///     .with_credentials("admin", "secret");
/// group.add_member(NodeRole::Member, node_a)?;
/// group.add_member(NodeRole::Member, node_b)?;
///
/// assert!(group.is_authentication_set());
/// let control = group.control_node()?;
/// ```
pub struct TopologyGroup {
    kind: TopologyKind,
    members: Vec<SharedNode>,
    shards: Vec<SharedNode>,
    configs: Vec<SharedNode>,
    routers: Vec<SharedNode>,
    default_connection: Option<u16>,
    configuration: ConfigurationDocument,
    username: Option<String>,
    password: Option<String>,
}

impl TopologyGroup {
    fn new(kind: TopologyKind, configuration: ConfigurationDocument) -> Self {
        Self {
            kind,
            members: Vec::new(),
            shards: Vec::new(),
            configs: Vec::new(),
            routers: Vec::new(),
            default_connection: None,
            configuration,
            username: None,
            password: None,
        }
    }

    /// Creates an empty replica set group.
    pub fn replica_set(configuration: ConfigurationDocument) -> Self {
        Self::new(TopologyKind::ReplicaSet, configuration)
    }

    /// Creates an empty sharded group.
    pub fn sharded(configuration: ConfigurationDocument) -> Self {
        Self::new(TopologyKind::Sharded, configuration)
    }

    /// Sets both credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Sets the username.
    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = Some(username.into());
    }

    /// Sets the password.
    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = Some(password.into());
    }

    /// Returns the username, if set.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the password, if set.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Chooses the replica set member addressed for admin commands.
    ///
    /// Without a choice, the first registered member is used.
    pub fn set_default_connection(&mut self, port: u16) {
        self.default_connection = Some(port);
    }

    /// Registers a node under a role.
    ///
    /// Host and port uniqueness is not checked.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the role does not exist in this
    /// kind of topology.
    pub fn add_member(&mut self, role: NodeRole, node: SharedNode) -> Result<()> {
        if !role.fits(self.kind) {
            return Err(TopologyError::configuration(format!(
                "role {} cannot be registered in a {} topology",
                role,
                self.kind.name()
            )));
        }

        match role {
            NodeRole::Member => self.members.push(node),
            NodeRole::Shard => self.shards.push(node),
            NodeRole::Config => self.configs.push(node),
            NodeRole::Router => self.routers.push(node),
        }
        Ok(())
    }

    /// Returns the topology kind.
    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    /// Returns the replica set members.
    pub fn members(&self) -> &[SharedNode] {
        &self.members
    }

    /// Returns the shard servers.
    pub fn shards(&self) -> &[SharedNode] {
        &self.shards
    }

    /// Returns the config servers.
    pub fn configs(&self) -> &[SharedNode] {
        &self.configs
    }

    /// Returns the routers.
    pub fn routers(&self) -> &[SharedNode] {
        &self.routers
    }

    /// Returns every node in declared order.
    ///
    /// Sharded topologies list shards, then config servers, then routers.
    pub fn nodes(&self) -> impl Iterator<Item = &SharedNode> {
        self.members
            .iter()
            .chain(self.shards.iter())
            .chain(self.configs.iter())
            .chain(self.routers.iter())
    }

    /// Returns the number of registered nodes.
    pub fn len(&self) -> usize {
        self.members.len() + self.shards.len() + self.configs.len() + self.routers.len()
    }

    /// Returns true if no node is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the configuration document.
    pub fn configuration(&self) -> &ConfigurationDocument {
        &self.configuration
    }

    /// Returns the first registered router.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no router is registered.
    pub fn first_router(&self) -> Result<&SharedNode> {
        self.routers
            .first()
            .ok_or_else(|| TopologyError::configuration("at least one router required"))
    }

    /// Returns the replica set member addressed for admin commands.
    pub fn default_connection(&self) -> Result<&SharedNode> {
        if self.kind != TopologyKind::ReplicaSet {
            return Err(TopologyError::configuration(
                "default connection is only defined for replica sets",
            ));
        }

        match self.default_connection {
            Some(port) => self.members.iter().find(|n| n.port() == port).ok_or_else(|| {
                TopologyError::configuration(format!(
                    "default connection port {} is not a registered member",
                    port
                ))
            }),
            None => self
                .members
                .first()
                .ok_or_else(|| TopologyError::configuration("at least one member required")),
        }
    }

    /// Returns the node that receives the initiation command.
    pub fn control_node(&self) -> Result<&SharedNode> {
        match self.kind {
            TopologyKind::ReplicaSet => self.default_connection(),
            TopologyKind::Sharded => self.first_router(),
        }
    }

    /// Finds the first node with `port` whose readiness equals `want_ready`.
    ///
    /// Shards are searched before config servers, and config servers before
    /// routers.
    pub fn find_by_port_and_state(&self, port: u16, want_ready: bool) -> Option<&SharedNode> {
        self.nodes()
            .find(|n| n.port() == port && n.is_ready() == want_ready)
    }

    /// Finds the stopped node bound to `port`.
    pub fn starting_node(&self, port: u16) -> Option<&SharedNode> {
        self.find_by_port_and_state(port, false)
    }

    /// Finds the running node bound to `port`.
    pub fn stopping_node(&self, port: u16) -> Option<&SharedNode> {
        self.find_by_port_and_state(port, true)
    }

    /// Returns the credentials when both username and password are non-empty.
    pub fn credentials(&self) -> Option<Credentials> {
        Credentials::from_parts(self.username.as_deref(), self.password.as_deref())
    }

    /// Returns true iff both username and password are non-empty.
    pub fn is_authentication_set(&self) -> bool {
        self.credentials().is_some()
    }

    /// Counts the nodes that are ready right now.
    pub fn number_of_started_nodes(&self) -> usize {
        self.nodes().filter(|n| n.is_ready()).count()
    }

    /// Returns the addresses of the ready nodes, in declared order.
    pub fn ready_addresses(&self) -> Vec<ServerAddress> {
        self.nodes()
            .filter(|n| n.is_ready())
            .map(|n| n.address())
            .collect()
    }
}

impl fmt::Debug for TopologyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addresses = |nodes: &[SharedNode]| {
            nodes
                .iter()
                .map(|n| n.address().to_string())
                .collect::<Vec<_>>()
        };

        f.debug_struct("TopologyGroup")
            .field("kind", &self.kind)
            .field("members", &addresses(&self.members))
            .field("shards", &addresses(&self.shards))
            .field("configs", &addresses(&self.configs))
            .field("routers", &addresses(&self.routers))
            .field("default_connection", &self.default_connection)
            .field("authentication", &self.is_authentication_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::SpyNode;
    use std::sync::Arc;

    fn sharded_group() -> (TopologyGroup, Vec<Arc<SpyNode>>) {
        let mut group = TopologyGroup::sharded(ConfigurationDocument::default());
        let shard = SpyNode::stopped(27018);
        let config = SpyNode::stopped(27019);
        let router = SpyNode::stopped(27017);

        group.add_member(NodeRole::Shard, shard.clone()).unwrap();
        group.add_member(NodeRole::Config, config.clone()).unwrap();
        group.add_member(NodeRole::Router, router.clone()).unwrap();

        (group, vec![shard, config, router])
    }

    #[test]
    fn test_find_by_port_and_state() {
        let (group, nodes) = sharded_group();

        let found = group.find_by_port_and_state(27019, false).unwrap();
        assert_eq!(found.port(), 27019);
        assert!(group.find_by_port_and_state(27019, true).is_none());

        nodes[1].set_ready(true);
        assert!(group.find_by_port_and_state(27019, false).is_none());
        assert_eq!(group.stopping_node(27019).unwrap().port(), 27019);

        assert!(group.starting_node(1).is_none());
        assert!(group.stopping_node(1).is_none());
    }

    #[test]
    fn test_find_prefers_shards_over_configs_and_routers() {
        let mut group = TopologyGroup::sharded(ConfigurationDocument::default());
        let router = SpyNode::with_host("router-host", 30000, false);
        let config = SpyNode::with_host("config-host", 30000, false);
        let shard = SpyNode::with_host("shard-host", 30000, false);

        group.add_member(NodeRole::Router, router).unwrap();
        group.add_member(NodeRole::Config, config).unwrap();
        group.add_member(NodeRole::Shard, shard).unwrap();

        assert_eq!(group.starting_node(30000).unwrap().host(), "shard-host");
    }

    #[test]
    fn test_first_router() {
        let mut group = TopologyGroup::sharded(ConfigurationDocument::default());
        group.add_member(NodeRole::Shard, SpyNode::stopped(27018)).unwrap();
        group.add_member(NodeRole::Shard, SpyNode::stopped(27020)).unwrap();
        group.add_member(NodeRole::Config, SpyNode::stopped(27019)).unwrap();

        let err = group.first_router().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("at least one router required"));

        group.add_member(NodeRole::Router, SpyNode::stopped(27017)).unwrap();
        group.add_member(NodeRole::Shard, SpyNode::stopped(27021)).unwrap();
        group.add_member(NodeRole::Router, SpyNode::stopped(27016)).unwrap();

        assert_eq!(group.first_router().unwrap().port(), 27017);
        assert_eq!(group.control_node().unwrap().port(), 27017);
    }

    #[test]
    fn test_authentication_requires_both_parts() {
        let mut group = TopologyGroup::replica_set(ConfigurationDocument::default());
        assert!(!group.is_authentication_set());

        group.set_username("admin");
        assert!(!group.is_authentication_set());

        group.set_password("");
        assert!(!group.is_authentication_set());

        group.set_password("secret");
        assert!(group.is_authentication_set());
        assert_eq!(group.credentials().unwrap().username(), "admin");

        let only_password =
            TopologyGroup::replica_set(ConfigurationDocument::default()).with_credentials("", "secret");
        assert!(!only_password.is_authentication_set());
    }

    #[test]
    fn test_role_must_fit_kind() {
        let mut replica = TopologyGroup::replica_set(ConfigurationDocument::default());
        assert!(replica
            .add_member(NodeRole::Router, SpyNode::stopped(27017))
            .unwrap_err()
            .is_configuration());

        let mut sharded = TopologyGroup::sharded(ConfigurationDocument::default());
        assert!(sharded
            .add_member(NodeRole::Member, SpyNode::stopped(27017))
            .unwrap_err()
            .is_configuration());
        assert!(sharded.is_empty());
    }

    #[test]
    fn test_default_connection() {
        let mut group = TopologyGroup::replica_set(ConfigurationDocument::default());
        assert!(group.default_connection().unwrap_err().is_configuration());

        group.add_member(NodeRole::Member, SpyNode::stopped(27017)).unwrap();
        group.add_member(NodeRole::Member, SpyNode::stopped(27018)).unwrap();
        assert_eq!(group.default_connection().unwrap().port(), 27017);

        group.set_default_connection(27018);
        assert_eq!(group.control_node().unwrap().port(), 27018);

        group.set_default_connection(1);
        assert!(group.default_connection().unwrap_err().is_configuration());

        let (sharded, _) = sharded_group();
        assert!(sharded.default_connection().is_err());
    }

    #[test]
    fn test_started_nodes_are_observed_live() {
        let (group, nodes) = sharded_group();
        assert_eq!(group.number_of_started_nodes(), 0);
        assert!(group.ready_addresses().is_empty());

        nodes[0].set_ready(true);
        nodes[2].set_ready(true);
        assert_eq!(group.number_of_started_nodes(), 2);
        assert_eq!(
            group.ready_addresses(),
            vec![
                ServerAddress::new("localhost", 27018),
                ServerAddress::new("localhost", 27017),
            ]
        );
        assert_eq!(group.len(), 3);
    }
}
