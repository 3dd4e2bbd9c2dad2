//! Server address type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AddressParseError;

/// Network location of one managed server node.
///
/// Displayed and parsed as `host:port`, the form accepted by engine
/// connection strings and seed lists.
///
/// # Examples
///
/// ```
/// use quorumkit_core::ServerAddress;
///
/// let addr = ServerAddress::new("127.0.0.1", 27018);
/// assert_eq!(addr.to_string(), "127.0.0.1:27018");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    /// Creates a new address.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the host name.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Joins a seed list into the comma-separated host list of a
    /// connection string (`h1:p1,h2:p2`).
    pub fn join_seed_list(seeds: &[ServerAddress]) -> String {
        seeds
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ServerAddress {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| AddressParseError::MissingPort(s.to_string()))?;

        if host.is_empty() {
            return Err(AddressParseError::EmptyHost(s.to_string()));
        }

        let port = port.parse::<u16>().map_err(|_| AddressParseError::InvalidPort {
            input: s.to_string(),
            port: port.to_string(),
        })?;

        Ok(Self::new(host, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_and_parse() {
        let addr: ServerAddress = "db.local:27019".parse().unwrap();
        assert_eq!(addr.host(), "db.local");
        assert_eq!(addr.port(), 27019);
        assert_eq!(addr.to_string(), "db.local:27019");
    }

    #[test]
    fn test_address_parse_errors() {
        assert_eq!(
            "localhost".parse::<ServerAddress>(),
            Err(AddressParseError::MissingPort("localhost".to_string()))
        );
        assert_eq!(
            ":27017".parse::<ServerAddress>(),
            Err(AddressParseError::EmptyHost(":27017".to_string()))
        );
        assert!(matches!(
            "localhost:99999".parse::<ServerAddress>(),
            Err(AddressParseError::InvalidPort { .. })
        ));
    }

    #[test]
    fn test_join_seed_list() {
        let seeds = vec![
            ServerAddress::new("localhost", 27017),
            ServerAddress::new("localhost", 27018),
        ];
        assert_eq!(
            ServerAddress::join_seed_list(&seeds),
            "localhost:27017,localhost:27018"
        );
        assert_eq!(ServerAddress::join_seed_list(&[]), "");
    }
}
