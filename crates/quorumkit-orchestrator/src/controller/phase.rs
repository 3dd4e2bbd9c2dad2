//! Controller phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of one setup/teardown cycle.
///
/// Setup walks `Idle → WakingNodes → Initiating → AwaitingStability →
/// Running`. Teardown moves to `ShuttingDown` from any earlier phase, so a
/// failed setup can still be cleaned up, and ends in `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerPhase {
    /// Constructed, nothing done yet.
    Idle,
    /// Starting stopped nodes.
    WakingNodes,
    /// Sending the initiation command.
    Initiating,
    /// Waiting for the engine to report all members healthy.
    AwaitingStability,
    /// Topology is live.
    Running,
    /// Stopping ready nodes.
    ShuttingDown,
    /// Cycle finished.
    Done,
}

impl ControllerPhase {
    /// Returns the name of this phase.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::WakingNodes => "waking-nodes",
            Self::Initiating => "initiating",
            Self::AwaitingStability => "awaiting-stability",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Done => "done",
        }
    }

    /// Returns true if `next` directly follows this phase.
    pub fn can_transition_to(&self, next: ControllerPhase) -> bool {
        use ControllerPhase::*;

        match (self, next) {
            (Idle, WakingNodes)
            | (WakingNodes, Initiating)
            | (Initiating, AwaitingStability)
            | (AwaitingStability, Running)
            | (ShuttingDown, Done) => true,
            (Done, _) | (ShuttingDown, _) => false,
            (_, ShuttingDown) => true,
            _ => false,
        }
    }

    /// Returns true once the cycle has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for ControllerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
