//! Opaque configuration payloads and raw command replies.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Engine-native configuration payload passed to an initiation command.
///
/// The orchestrator never inspects the contents; it only forwards them to
/// the admin client. For a replica set this is the member layout
/// (`{"_id": "rs0", "members": [...]}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationDocument(Value);

impl ConfigurationDocument {
    /// Wraps a configuration payload.
    pub fn new(configuration: Value) -> Self {
        Self(configuration)
    }

    /// Returns the wrapped payload.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the document and returns the payload.
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for ConfigurationDocument {
    fn default() -> Self {
        Self(Value::Object(serde_json::Map::new()))
    }
}

impl fmt::Display for ConfigurationDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raw reply of an administrative command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandResult(Value);

impl CommandResult {
    /// Wraps a command reply.
    pub fn new(reply: Value) -> Self {
        Self(reply)
    }

    /// Returns true if the engine reported `ok: 1`.
    pub fn ok(&self) -> bool {
        self.0
            .get("ok")
            .and_then(Value::as_f64)
            .map(|ok| ok == 1.0)
            .unwrap_or(false)
    }

    /// Returns the engine error message, if any.
    pub fn errmsg(&self) -> Option<&str> {
        self.0.get("errmsg").and_then(Value::as_str)
    }

    /// Returns the raw reply.
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
