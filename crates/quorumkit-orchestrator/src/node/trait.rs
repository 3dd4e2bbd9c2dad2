//! Managed node trait definition.

use async_trait::async_trait;
use quorumkit_core::ServerAddress;
use std::sync::Arc;

use crate::error::Result;

/// Capability contract for one managed database server process.
///
/// The node owns its readiness flag. The orchestrator only reads it, and
/// reads it again before every decision instead of caching it.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; readiness is queried through
/// `&self`, so implementations keep it behind interior mutability
/// (typically an `AtomicBool`). They also implement `Debug`, so groups and
/// lookup results can be printed.
///
/// # Example
///
/// ```ignore
/// use quorumkit_orchestrator::node::{ManagedNode, ProcessNode, ProcessNodeConfig};
///
/// let node = ProcessNode::new(
///     ProcessNodeConfig::builder("mongod", 27017)
///         .args(["--replSet", "rs0", "--port", "27017"])
///         .build(),
/// );
/// node.start().await?;
/// assert!(node.is_ready());
/// node.stop().await?;
/// ```
#[async_trait]
pub trait ManagedNode: std::fmt::Debug + Send + Sync {
    /// Launches the server process and returns once it is ready.
    ///
    /// # Errors
    ///
    /// Returns `ProcessStartFailed` if the process cannot be launched or
    /// never becomes ready.
    async fn start(&self) -> Result<()>;

    /// Stops the server process.
    ///
    /// Best effort. Returns `ProcessStopFailed` if the process does not
    /// respond.
    async fn stop(&self) -> Result<()>;

    /// Returns true if the process is running and accepting connections.
    fn is_ready(&self) -> bool;

    /// Returns the host the process listens on.
    fn host(&self) -> &str;

    /// Returns the port the process listens on.
    fn port(&self) -> u16;

    /// Returns the node address.
    fn address(&self) -> ServerAddress {
        ServerAddress::new(self.host(), self.port())
    }
}

/// A shared managed node, as registered in a topology group.
pub type SharedNode = Arc<dyn ManagedNode>;
