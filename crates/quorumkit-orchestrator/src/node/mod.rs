//! Managed server nodes.
//!
//! This module provides the capability contract the orchestrator consumes
//! for a single server process, and a process-backed implementation.

mod process;
mod r#trait;

pub use process::{ProcessNode, ProcessNodeConfig, ProcessNodeConfigBuilder};
pub use r#trait::{ManagedNode, SharedNode};
