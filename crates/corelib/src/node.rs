//! Node identity abstractions.
//!
//! Every participant in the overlay is identified by a `PeerId`. Remote ids
//! arrive as text inside peer locators; the local id is derived once at
//! startup and stays fixed for the life of the process.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

/// Identity of a peer in the overlay.
///
/// Always a non-empty ASCII alphanumeric string, so it can be embedded in a
/// locator without escaping.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PeerId(String);

impl PeerId {
    /// Validate and wrap a textual peer id.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::InvalidPeerId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Derive a peer id from arbitrary seed bytes.
    ///
    /// Takes the first 128 bits of the BLAKE3 digest and renders them as 32
    /// lowercase hex characters.
    pub fn derive(seed: &[u8]) -> Self {
        let digest = blake3::hash(seed);
        let mut prefix = [0u8; 16];
        prefix.copy_from_slice(&digest.as_bytes()[..16]);
        Self(format!("{:032x}", u128::from_be_bytes(prefix)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PeerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Identity of the local process.
///
/// Keep this small and cheap to clone; key material is not modelled here.
#[derive(Clone, Debug)]
pub struct Identity {
    peer_id: PeerId,
}

impl Identity {
    /// Generate a fresh identity for a node listening on `port`.
    ///
    /// The seed mixes wall-clock time, process id and port so that two nodes
    /// started on the same host in the same instant still differ.
    pub fn generate(port: u16) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        let mut seed = Vec::with_capacity(16 + 4 + 2);
        seed.extend_from_slice(&nanos.to_le_bytes());
        seed.extend_from_slice(&std::process::id().to_le_bytes());
        seed.extend_from_slice(&port.to_le_bytes());

        Self {
            peer_id: PeerId::derive(&seed),
        }
    }

    /// Wrap an existing peer id (fixed identities in tests and tooling).
    pub fn from_peer_id(peer_id: PeerId) -> Self {
        Self { peer_id }
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }
}
