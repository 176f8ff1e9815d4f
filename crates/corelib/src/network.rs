//! Contracts between the bootstrap/control layers and the store engine.
//!
//! The distributed hash table is consumed as a black box through
//! `DhtEngine`. Peer addresses live in an `AddressBook`, and reachability is
//! checked by a `LivenessProbe`. None of these traits attach deadlines;
//! callers wrap calls in `tokio::time::timeout` with their configured limits.

use async_trait::async_trait;
use bytes::Bytes;

use crate::address::NodeAddress;
use crate::error::Result;
use crate::node::PeerId;
use crate::peer::{Liveness, Ttl};

/// Key-value overlay with peer membership.
///
/// # Thread Safety
///
/// Implementations must tolerate concurrent calls from the bootstrap manager
/// and every in-flight control-plane request; callers add no locking.
#[async_trait]
pub trait DhtEngine: Send + Sync + 'static {
    /// Store `value` under `key`.
    async fn put(&self, key: &str, value: Bytes) -> Result<()>;

    /// Fetch the value under `key`, or `Error::NotFound`.
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Probe a peer already present in the address book.
    async fn ping(&self, peer: &PeerId) -> Result<()>;

    /// Insert `peer` into the routing structure, or re-tag it if present.
    async fn update(&self, peer: &PeerId, liveness: Liveness) -> Result<()>;
}

/// Peer address registry.
pub trait AddressBook: Send + Sync + 'static {
    fn add_address(&self, peer: &PeerId, address: &NodeAddress, ttl: Ttl);

    /// Unexpired addresses for `peer`, in insertion order.
    fn addresses(&self, peer: &PeerId) -> Vec<NodeAddress>;

    fn peers(&self) -> Vec<PeerId>;
}

/// Reachability check against a single address.
#[async_trait]
pub trait LivenessProbe: Send + Sync + 'static {
    async fn probe(&self, address: &NodeAddress) -> Result<()>;
}
