//! Credentials for authenticated administrative commands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Username and password pair used to authenticate admin commands.
///
/// A `Credentials` value only exists when both parts are non-empty, so
/// holding one is equivalent to "authentication is set".
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Builds credentials from optional parts.
    ///
    /// Returns `None` unless both username and password are present and
    /// non-empty.
    ///
    /// ```
    /// use quorumkit_core::Credentials;
    ///
    /// assert!(Credentials::from_parts(Some("admin"), Some("secret")).is_some());
    /// assert!(Credentials::from_parts(Some("admin"), None).is_none());
    /// assert!(Credentials::from_parts(Some(""), Some("secret")).is_none());
    /// ```
    pub fn from_parts(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some(Self {
                username: u.to_string(),
                password: p.to_string(),
            }),
            _ => None,
        }
    }

    /// Returns the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the password.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
