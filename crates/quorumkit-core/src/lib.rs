//! Quorumkit Core - value types shared by the topology orchestrator.
//!
//! This crate provides the small, engine-agnostic types that flow between
//! the orchestrator and its collaborators:
//!
//! - [`address`]: Network addresses of managed server nodes (`ServerAddress`)
//! - [`credentials`]: Optional shared credentials for administrative commands
//! - [`document`]: Opaque configuration payloads and raw command replies
//! - [`status`]: Engine-reported replica set and shard status, used for stability checks
//! - [`error`]: Error types for parsing these values
//!
//! # Example
//!
//! ```
//! use quorumkit_core::{ConfigurationDocument, ServerAddress};
//! use serde_json::json;
//!
//! let address: ServerAddress = "localhost:27017".parse().unwrap();
//! assert_eq!(address.port(), 27017);
//!
//! let config = ConfigurationDocument::new(json!({
//!     "_id": "rs0",
//!     "members": [{ "_id": 0, "host": address.to_string() }],
//! }));
//! assert!(config.as_value().is_object());
//! ```

pub mod address;
pub mod credentials;
pub mod document;
pub mod error;
pub mod status;

pub use address::ServerAddress;
pub use credentials::Credentials;
pub use document::{CommandResult, ConfigurationDocument};
pub use error::{AddressParseError, StatusParseError};
pub use status::{MemberState, MemberStatus, ReplicaSetStatus, ShardEntry, ShardList};
