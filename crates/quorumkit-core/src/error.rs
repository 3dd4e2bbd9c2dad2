//! Error types for core value parsing.

use thiserror::Error;

/// Errors produced when parsing a `host:port` address.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressParseError {
    /// The input had no `:` separating host and port.
    #[error("missing port in address: {0}")]
    MissingPort(String),

    /// The host part was empty.
    #[error("empty host in address: {0}")]
    EmptyHost(String),

    /// The port part was not a valid `u16`.
    #[error("invalid port in address {input}: {port}")]
    InvalidPort { input: String, port: String },
}

/// Errors produced when decoding an engine status reply.
#[derive(Debug, Error)]
pub enum StatusParseError {
    /// The reply was not valid JSON or did not match the expected shape.
    #[error("malformed status reply: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The engine answered with `ok: 0`.
    #[error("status command failed: {0}")]
    CommandFailed(String),
}
