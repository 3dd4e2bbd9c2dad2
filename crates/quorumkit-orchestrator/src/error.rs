//! Error types for the orchestrator crate.
//!
//! Every fatal error reaches the caller of `setup`/`teardown` unmodified;
//! there is no translation layer between the collaborators and the harness.

use thiserror::Error;

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors that can occur while orchestrating a topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The topology is misconfigured for the requested operation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A managed node failed to start.
    #[error("failed to start node {node}: {reason}")]
    ProcessStartFailed {
        /// The node address.
        node: String,
        /// The reason for the failure.
        reason: String,
    },

    /// A managed node failed to stop.
    #[error("failed to stop node {node}: {reason}")]
    ProcessStopFailed {
        /// The node address.
        node: String,
        /// The reason for the failure.
        reason: String,
    },

    /// An administrative connection or command failed at the transport level.
    #[error("transport error against {target}: {reason}")]
    Transport {
        /// The address (or seed list) the command was sent to.
        target: String,
        /// The reason for the failure.
        reason: String,
    },

    /// Timeout waiting for condition.
    #[error("timeout waiting for {condition}")]
    Timeout {
        /// The condition that timed out.
        condition: String,
    },

    /// One or more nodes could not be stopped during teardown.
    #[error("teardown failed: {0}")]
    TeardownFailed(String),

    /// Invalid controller phase transition.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// The current phase.
        from: String,
        /// The requested phase.
        to: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TopologyError {
    /// Creates a configuration error.
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration(reason.into())
    }

    /// Creates a process start failed error.
    pub fn process_start_failed(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProcessStartFailed {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Creates a process stop failed error.
    pub fn process_stop_failed(node: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProcessStopFailed {
            node: node.into(),
            reason: reason.into(),
        }
    }

    /// Creates a transport error.
    pub fn transport(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(condition: impl Into<String>) -> Self {
        Self::Timeout {
            condition: condition.into(),
        }
    }

    /// Creates a teardown failed error.
    pub fn teardown_failed(reason: impl Into<String>) -> Self {
        Self::TeardownFailed(reason.into())
    }

    /// Creates an invalid state transition error.
    pub fn invalid_state_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidStateTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Creates a serialization error.
    pub fn serialization(reason: impl Into<String>) -> Self {
        Self::Serialization(reason.into())
    }

    /// Returns true if the error means "try again later" while polling.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Io(_))
    }

    /// Returns true if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<serde_json::Error> for TopologyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for TopologyError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TopologyError::configuration("at least one router required");
        assert_eq!(
            err.to_string(),
            "configuration error: at least one router required"
        );

        let err = TopologyError::process_start_failed("localhost:27017", "binary not found");
        assert_eq!(
            err.to_string(),
            "failed to start node localhost:27017: binary not found"
        );
    }

    #[test]
    fn test_error_retryable() {
        assert!(TopologyError::transport("localhost:27017", "refused").is_retryable());
        assert!(!TopologyError::configuration("test").is_retryable());
        assert!(!TopologyError::timeout("test").is_retryable());
        assert!(!TopologyError::process_stop_failed("n", "r").is_retryable());
    }

    #[test]
    fn test_error_is_configuration() {
        assert!(TopologyError::configuration("x").is_configuration());
        assert!(!TopologyError::teardown_failed("x").is_configuration());
    }
}
