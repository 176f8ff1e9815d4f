//! Discovery and probe messages.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use corelib::NodeAddress;

use crate::codec::encode_frame;
use crate::error::Result;

/// Probe request payload.
pub const PING: &[u8] = b"ping";

/// Probe reply payload.
pub const PONG: &[u8] = b"pong";

/// A node announcing its own locator to the rendezvous service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Announcement {
    address: String,
}

impl Announcement {
    pub fn new(address: &NodeAddress) -> Self {
        Self {
            address: address.to_string(),
        }
    }

    /// Decode a received payload. Only UTF-8 is checked here; use
    /// `parse_address` to validate the locator itself.
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let address = std::str::from_utf8(payload)?;
        Ok(Self {
            address: address.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.address
    }

    pub fn parse_address(&self) -> Result<NodeAddress> {
        Ok(self.address.parse()?)
    }

    pub fn to_frame(&self) -> Result<Bytes> {
        encode_frame(self.address.as_bytes())
    }
}

/// Ordered peer locators returned by the rendezvous service.
///
/// Serialized as a plain JSON array of strings. Order is kept so bootstrap
/// attempts are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerList(Vec<String>);

impl PeerList {
    pub fn new(peers: Vec<String>) -> Self {
        Self(peers)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }

    /// Decode a JSON array. A JSON `null` is read as an empty list.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let peers: Option<Vec<String>> = serde_json::from_slice(bytes)?;
        Ok(Self(peers.unwrap_or_default()))
    }
}

impl FromIterator<String> for PeerList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PeerList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
