//! Admin command client trait definition.

use async_trait::async_trait;
use quorumkit_core::{CommandResult, ConfigurationDocument, Credentials, ServerAddress};
use std::sync::Arc;

use crate::error::Result;

/// Client for the engine's administrative commands.
///
/// Every call opens its own short-lived connection and releases it before
/// returning, on the success and the failure path alike. Connections are
/// never pooled or reused across calls.
///
/// # Lifecycle
///
/// 1. `initiate()` once, against the control node
/// 2. `poll_stability()` against the seed list of ready nodes (replica
///    sets), or `poll_shard_registration()` through the first router
///    (sharded clusters)
#[async_trait]
pub trait AdminCommandClient: Send + Sync {
    /// Issues the one-time initiation command carrying `config`.
    ///
    /// The reply is returned as-is; callers do not validate it.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the target cannot be reached.
    async fn initiate(
        &self,
        target: &ServerAddress,
        config: &ConfigurationDocument,
        credentials: Option<&Credentials>,
    ) -> Result<CommandResult>;

    /// Returns once the engine reports exactly `expected_ready` healthy
    /// members.
    ///
    /// There is no internal deadline; callers bound the wait.
    async fn poll_stability(
        &self,
        seeds: &[ServerAddress],
        expected_ready: usize,
        credentials: Option<&Credentials>,
    ) -> Result<()>;

    /// Returns once `router` reports exactly `expected_shards` registered
    /// shards.
    ///
    /// Routers answer no replica set status, so sharded clusters are
    /// checked through the router's shard listing instead. No internal
    /// deadline either.
    async fn poll_shard_registration(
        &self,
        router: &ServerAddress,
        expected_shards: usize,
        credentials: Option<&Credentials>,
    ) -> Result<()>;

    /// Returns the name of this client.
    fn name(&self) -> &str;
}

/// A shared admin client, injected into the controller.
pub type SharedAdminClient = Arc<dyn AdminCommandClient>;
