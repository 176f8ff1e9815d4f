//! Error types for the core library.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Peer locator could not be parsed
    #[error("invalid address {locator:?}: {reason}")]
    InvalidAddress { locator: String, reason: String },
    /// Peer identity is empty or not alphanumeric
    #[error("invalid peer id {0:?}")]
    InvalidPeerId(String),
    /// No value stored under the key
    #[error("key not found: {0}")]
    NotFound(String),
    /// Address book holds no dialable address for the peer
    #[error("no known address for peer {0}")]
    UnknownPeer(String),
    /// Liveness probe failed
    #[error("peer unreachable: {0}")]
    Unreachable(String),
    /// Deadline exceeded
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    /// Store engine failure
    #[error("store failure: {0}")]
    Store(String),
}

impl Error {
    pub(crate) fn invalid_address(locator: &str, reason: impl Into<String>) -> Self {
        Error::InvalidAddress {
            locator: locator.to_string(),
            reason: reason.into(),
        }
    }
}
