//! Error types for the discovery protocol.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for the discovery crate.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Errors raised by the handshake client, rendezvous service and probes.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Rendezvous service refused or could not be reached
    #[error("failed to connect to rendezvous service {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// Connection attempt exceeded its deadline
    #[error("timed out connecting to rendezvous service {addr} after {after:?}")]
    ConnectTimeout { addr: String, after: Duration },
    /// Exchange exceeded its deadline
    #[error("discovery exchange timed out after {0:?}")]
    Timeout(Duration),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported protocol version {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },
    #[error("payload is not valid UTF-8: {0}")]
    InvalidPayload(#[from] std::str::Utf8Error),
    #[error("malformed peer list: {0}")]
    Decode(#[from] serde_json::Error),
    /// Announced locator did not parse
    #[error("invalid announcement: {0}")]
    Address(#[from] corelib::Error),
    #[error("unexpected probe message")]
    UnexpectedMessage,
}

impl DiscoveryError {
    /// Whether startup must abort.
    ///
    /// Only failing to reach the rendezvous service is fatal; everything that
    /// goes wrong after the connection is up degrades to an isolated node.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DiscoveryError::Connect { .. } | DiscoveryError::ConnectTimeout { .. }
        )
    }
}
