//! Engine-reported replica set and sharded cluster status.
//!
//! The replica set stability check counts the members that the engine
//! itself reports as healthy and in a data-bearing role. The sharded check
//! counts the shards a router has registered. Everything else in either
//! reply is ignored.

use serde::{Deserialize, Serialize};

use crate::error::StatusParseError;

/// Replication state of a member as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemberState {
    /// Not yet an active member of any set.
    Startup,
    /// Accepting writes.
    Primary,
    /// Replicating from the primary.
    Secondary,
    /// Catching up or performing maintenance.
    Recovering,
    /// Joined the set and running initial sync.
    Startup2,
    /// State not known from the reporting member's view.
    Unknown,
    /// Votes in elections, holds no data.
    Arbiter,
    /// Unreachable from the reporting member.
    Down,
    /// Rolling back writes after a failover.
    Rollback,
    /// Removed from the set configuration.
    Removed,
}

impl MemberState {
    /// Maps the engine's numeric state code.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Startup,
            1 => Self::Primary,
            2 => Self::Secondary,
            3 => Self::Recovering,
            5 => Self::Startup2,
            7 => Self::Arbiter,
            8 => Self::Down,
            9 => Self::Rollback,
            10 => Self::Removed,
            _ => Self::Unknown,
        }
    }

    /// Returns true for primary and secondary.
    pub fn is_data_bearing(&self) -> bool {
        matches!(self, Self::Primary | Self::Secondary)
    }
}

/// One entry of the `members` array of a status reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberStatus {
    /// Member address as `host:port`.
    pub name: String,

    /// `1` when reachable, `0` otherwise.
    #[serde(default)]
    pub health: f64,

    /// Numeric replication state.
    pub state: i32,

    /// Human-readable replication state.
    #[serde(rename = "stateStr", default)]
    pub state_str: String,
}

impl MemberStatus {
    /// Returns the decoded replication state.
    pub fn member_state(&self) -> MemberState {
        MemberState::from_code(self.state)
    }

    /// Returns true if the member is reachable and primary or secondary.
    pub fn is_healthy(&self) -> bool {
        self.health == 1.0 && self.member_state().is_data_bearing()
    }
}

/// Rejects replies whose `ok` field is not `1`.
fn ensure_ok(value: &serde_json::Value) -> Result<(), StatusParseError> {
    let ok = value.get("ok").and_then(|v| v.as_f64()).unwrap_or(0.0);
    if ok != 1.0 {
        let message = value
            .get("errmsg")
            .and_then(|v| v.as_str())
            .unwrap_or("no error message")
            .to_string();
        return Err(StatusParseError::CommandFailed(message));
    }
    Ok(())
}

/// Decoded reply of the replica set status command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaSetStatus {
    /// Replica set name.
    #[serde(default)]
    pub set: Option<String>,

    /// Members as seen by the answering node.
    #[serde(default)]
    pub members: Vec<MemberStatus>,
}

impl ReplicaSetStatus {
    /// Decodes a status reply, rejecting replies with `ok: 0`.
    pub fn from_json(reply: &str) -> Result<Self, StatusParseError> {
        let value: serde_json::Value = serde_json::from_str(reply)?;
        ensure_ok(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Number of members that are reachable and primary or secondary.
    pub fn healthy_members(&self) -> usize {
        self.members.iter().filter(|m| m.is_healthy()).count()
    }

    /// Returns the current primary, if one is elected.
    pub fn primary(&self) -> Option<&MemberStatus> {
        self.members
            .iter()
            .find(|m| m.member_state() == MemberState::Primary)
    }
}

/// One entry of the `shards` array of a shard listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardEntry {
    /// Shard name.
    #[serde(rename = "_id")]
    pub id: String,

    /// Connection string of the shard.
    pub host: String,
}

/// Decoded reply of a router's shard listing command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardList {
    /// Shards registered with the cluster.
    #[serde(default)]
    pub shards: Vec<ShardEntry>,
}

impl ShardList {
    /// Decodes a shard listing, rejecting replies with `ok: 0`.
    pub fn from_json(reply: &str) -> Result<Self, StatusParseError> {
        let value: serde_json::Value = serde_json::from_str(reply)?;
        ensure_ok(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Number of registered shards.
    pub fn registered(&self) -> usize {
        self.shards.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_MEMBERS: &str = r#"{
        "set": "rs0",
        "ok": 1,
        "members": [
            {"name": "localhost:27017", "health": 1, "state": 1, "stateStr": "PRIMARY"},
            {"name": "localhost:27018", "health": 1, "state": 2, "stateStr": "SECONDARY"},
            {"name": "localhost:27019", "health": 1, "state": 5, "stateStr": "STARTUP2"}
        ]
    }"#;

    #[test]
    fn test_healthy_members_counts_primary_and_secondary() {
        let status = ReplicaSetStatus::from_json(THREE_MEMBERS).unwrap();
        assert_eq!(status.set.as_deref(), Some("rs0"));
        assert_eq!(status.members.len(), 3);
        assert_eq!(status.healthy_members(), 2);
        assert_eq!(status.primary().unwrap().name, "localhost:27017");
    }

    #[test]
    fn test_unreachable_secondary_is_not_healthy() {
        let member = MemberStatus {
            name: "localhost:27018".to_string(),
            health: 0.0,
            state: 2,
            state_str: "SECONDARY".to_string(),
        };
        assert!(!member.is_healthy());
    }

    #[test]
    fn test_not_initialized_reply_is_an_error() {
        let reply = r#"{"ok": 0, "errmsg": "no replset config has been received", "code": 94}"#;
        match ReplicaSetStatus::from_json(reply) {
            Err(StatusParseError::CommandFailed(msg)) => {
                assert!(msg.contains("no replset config"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_member_state_codes() {
        assert_eq!(MemberState::from_code(1), MemberState::Primary);
        assert_eq!(MemberState::from_code(7), MemberState::Arbiter);
        assert_eq!(MemberState::from_code(42), MemberState::Unknown);
        assert!(!MemberState::Arbiter.is_data_bearing());
    }

    #[test]
    fn test_shard_list_counts_registered_shards() {
        let reply = r#"{
            "shards": [
                {"_id": "shard0", "host": "localhost:27018", "state": 1},
                {"_id": "shard1", "host": "localhost:27020", "state": 1}
            ],
            "ok": 1
        }"#;
        let list = ShardList::from_json(reply).unwrap();
        assert_eq!(list.registered(), 2);
        assert_eq!(list.shards[0].id, "shard0");
    }

    #[test]
    fn test_shard_list_rejects_failed_reply() {
        let reply = r#"{"ok": 0, "errmsg": "no such command: 'listShards'", "code": 59}"#;
        assert!(matches!(
            ShardList::from_json(reply),
            Err(StatusParseError::CommandFailed(_))
        ));
    }
}
