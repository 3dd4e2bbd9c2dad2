//! The topology controller.

use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::admin::SharedAdminClient;
use crate::controller::{ControllerConfig, ControllerPhase};
use crate::error::{Result, TopologyError};
use crate::topology::{TopologyGroup, TopologyKind};

/// Drives one setup/teardown cycle of a topology group.
///
/// All work happens sequentially on the calling task: nodes start and stop
/// one at a time in the group's declared order, and every admin command
/// opens and releases its own connection.
///
/// # Lifecycle
///
/// 1. `setup()` wakes stopped nodes, sends the initiation command to the
///    control node, and waits until the engine reports every started node
///    healthy
/// 2. The test body runs; `start_node()`, `stop_node()` and
///    `wait_until_stable()` may be used to disturb the topology
/// 3. `teardown()` stops every ready node
///
/// # Example
///
/// ```ignore
/// use quorumkit_orchestrator::{ShellAdminClient, TopologyController, TopologyManifest};
/// use std::sync::Arc;
///
/// let group = Arc::new(TopologyManifest::from_file("replica-set.yml")?.into_group()?);
/// let mut controller = TopologyController::new(group, Arc::new(ShellAdminClient::new()));
///
/// controller.setup().await?;
/// controller.stop_node(27018).await?;
/// controller.wait_until_stable().await?;
/// controller.teardown().await?;
/// ```
pub struct TopologyController {
    group: Arc<TopologyGroup>,
    admin: SharedAdminClient,
    config: ControllerConfig,
    phase: ControllerPhase,
}

impl TopologyController {
    /// Creates a controller with the default configuration.
    pub fn new(group: Arc<TopologyGroup>, admin: SharedAdminClient) -> Self {
        Self::with_config(group, admin, ControllerConfig::default())
    }

    /// Creates a controller with the given configuration.
    pub fn with_config(
        group: Arc<TopologyGroup>,
        admin: SharedAdminClient,
        config: ControllerConfig,
    ) -> Self {
        Self {
            group,
            admin,
            config,
            phase: ControllerPhase::Idle,
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    /// Returns the group this controller drives.
    pub fn group(&self) -> &TopologyGroup {
        &self.group
    }

    fn transition(&mut self, next: ControllerPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(TopologyError::invalid_state_transition(
                self.phase.name(),
                next.name(),
            ));
        }
        debug!(from = %self.phase, to = %next, "Controller phase change");
        self.phase = next;
        Ok(())
    }

    /// Brings the topology up.
    ///
    /// # Errors
    ///
    /// Any start, initiation or stability error aborts setup and is
    /// returned unmodified. The phase stays where the failure happened, and
    /// `teardown()` remains available.
    pub async fn setup(&mut self) -> Result<()> {
        self.transition(ControllerPhase::WakingNodes)?;
        info!(
            kind = self.group.kind().name(),
            nodes = self.group.len(),
            "Setting up topology"
        );
        self.wake_nodes().await?;

        self.transition(ControllerPhase::Initiating)?;
        self.initiate().await?;

        self.transition(ControllerPhase::AwaitingStability)?;
        self.wait_until_stable().await?;

        self.transition(ControllerPhase::Running)?;
        info!(kind = self.group.kind().name(), "Topology is running");
        Ok(())
    }

    /// Starts every node that is not ready, in declared order.
    async fn wake_nodes(&self) -> Result<()> {
        let mut started = 0usize;

        for node in self.group.nodes() {
            if node.is_ready() {
                debug!(node = %node.address(), "Node already running");
                continue;
            }
            node.start().await?;
            started += 1;
        }

        info!(started, total = self.group.len(), "Started topology nodes");
        Ok(())
    }

    /// Sends the initiation command to the control node.
    async fn initiate(&self) -> Result<()> {
        let target = self.group.control_node()?.address();
        let credentials = self.group.credentials();

        let result = self
            .admin
            .initiate(&target, self.group.configuration(), credentials.as_ref())
            .await?;

        info!(
            target = %target,
            client = self.admin.name(),
            ok = result.ok(),
            result = %result,
            "Initiation command returned"
        );
        Ok(())
    }

    /// Waits until the topology reports itself stable.
    ///
    /// Replica sets poll the seed list of every ready node until the
    /// engine reports as many healthy members as there are started nodes.
    /// Sharded clusters poll the first router until every shard of the
    /// group is registered. The seed list and expected counts are read
    /// fresh on each call. The wait is bounded only when
    /// `ControllerConfig::stability_timeout` is set.
    pub async fn wait_until_stable(&self) -> Result<()> {
        let credentials = self.group.credentials();

        match self.group.kind() {
            TopologyKind::ReplicaSet => {
                let seeds = self.group.ready_addresses();
                let expected = self.group.number_of_started_nodes();
                self.bounded(
                    format!("topology to report {} healthy nodes", expected),
                    self.admin
                        .poll_stability(&seeds, expected, credentials.as_ref()),
                )
                .await
            }
            TopologyKind::Sharded => {
                let router = self.group.first_router()?.address();
                let expected = self.group.shards().len();
                self.bounded(
                    format!("router {} to report {} registered shards", router, expected),
                    self.admin
                        .poll_shard_registration(&router, expected, credentials.as_ref()),
                )
                .await
            }
        }
    }

    /// Applies the configured stability timeout to `poll`.
    async fn bounded<F>(&self, condition: String, poll: F) -> Result<()>
    where
        F: Future<Output = Result<()>>,
    {
        match self.config.stability_timeout() {
            Some(limit) => tokio::time::timeout(limit, poll).await.map_err(|_| {
                TopologyError::timeout(format!("{} within {}ms", condition, limit.as_millis()))
            })?,
            None => poll.await,
        }
    }

    /// Starts the stopped node bound to `port`.
    ///
    /// Unknown ports and ports whose node is already running are ignored.
    pub async fn start_node(&self, port: u16) -> Result<()> {
        match self.group.starting_node(port) {
            Some(node) => {
                info!(node = %node.address(), "Starting node on request");
                node.start().await
            }
            None => {
                debug!(port, "No stopped node on port, nothing to start");
                Ok(())
            }
        }
    }

    /// Stops the running node bound to `port`.
    ///
    /// Unknown ports and ports whose node is already stopped are ignored.
    pub async fn stop_node(&self, port: u16) -> Result<()> {
        match self.group.stopping_node(port) {
            Some(node) => {
                info!(node = %node.address(), "Stopping node on request");
                node.stop().await
            }
            None => {
                debug!(port, "No running node on port, nothing to stop");
                Ok(())
            }
        }
    }

    /// Stops every ready node, in declared order.
    ///
    /// Every ready node gets a stop attempt even when an earlier one fails;
    /// failures are collected into a single `TeardownFailed` error.
    pub async fn teardown(&mut self) -> Result<()> {
        self.transition(ControllerPhase::ShuttingDown)?;
        info!(kind = self.group.kind().name(), "Stopping topology nodes");

        let mut errors = Vec::new();
        let mut stopped = 0usize;

        for node in self.group.nodes() {
            if !node.is_ready() {
                continue;
            }
            match node.stop().await {
                Ok(()) => stopped += 1,
                Err(e) => {
                    error!(node = %node.address(), error = %e, "Failed to stop node");
                    errors.push(e.to_string());
                }
            }
        }

        self.transition(ControllerPhase::Done)?;

        if errors.is_empty() {
            info!(stopped, "Topology teardown complete");
            Ok(())
        } else {
            Err(TopologyError::teardown_failed(errors.join("; ")))
        }
    }
}

impl std::fmt::Debug for TopologyController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyController")
            .field("group", &self.group)
            .field("admin", &self.admin.name())
            .field("config", &self.config)
            .field("phase", &self.phase)
            .finish()
    }
}
