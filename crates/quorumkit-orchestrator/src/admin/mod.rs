//! Administrative command clients.
//!
//! This module provides the trait the controller uses to issue control-plane
//! commands (initiation, status polling) and a shell-based implementation.

mod shell;
mod r#trait;

pub use r#trait::{AdminCommandClient, SharedAdminClient};
pub use shell::{ShellAdminClient, ShellAdminConfig, ShellAdminConfigBuilder};
