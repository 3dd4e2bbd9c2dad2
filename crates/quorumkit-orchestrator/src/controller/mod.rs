//! Topology lifecycle orchestration.
//!
//! This module provides the controller that drives a topology group through
//! startup, initiation, stability confirmation and teardown.

mod config;
mod phase;
mod topology_controller;

pub use config::{ControllerConfig, ControllerConfigBuilder};
pub use phase::ControllerPhase;
pub use topology_controller::TopologyController;
