//! Reference distributed store engine.
//!
//! `MemoryDht` keeps values and membership in process. It stands in for a
//! Kademlia engine behind the `DhtEngine` contract: routing, replication and
//! expiry are outside its remit, but it honours the same concurrency and
//! error semantics the bootstrap and control layers rely on.
//!
//! # Concurrency
//!
//! - Values: `DashMap`, sharded locking, last write wins per key.
//! - Membership: `parking_lot::RwLock<BTreeMap>`; the lock is never held
//!   across an `.await`.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::network::{AddressBook, DhtEngine, LivenessProbe};
use crate::node::PeerId;
use crate::peer::Liveness;

/// Membership entry for one peer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingEntry {
    pub liveness: Liveness,
    pub joined_at: Instant,
    /// Last successful ping, if any.
    pub last_seen: Option<Instant>,
}

/// In-process `DhtEngine`.
pub struct MemoryDht {
    values: DashMap<String, Bytes>,
    routing: RwLock<BTreeMap<PeerId, RoutingEntry>>,
    address_book: Arc<dyn AddressBook>,
    probe: Arc<dyn LivenessProbe>,
}

impl MemoryDht {
    pub fn new(address_book: Arc<dyn AddressBook>, probe: Arc<dyn LivenessProbe>) -> Self {
        Self {
            values: DashMap::new(),
            routing: RwLock::new(BTreeMap::new()),
            address_book,
            probe,
        }
    }

    /// Snapshot of the membership table, ordered by peer id.
    pub fn routing_table(&self) -> Vec<(PeerId, RoutingEntry)> {
        self.routing
            .read()
            .iter()
            .map(|(peer, entry)| (peer.clone(), entry.clone()))
            .collect()
    }

    pub fn contains(&self, peer: &PeerId) -> bool {
        self.routing.read().contains_key(peer)
    }

    /// Number of peers in the membership table.
    pub fn len(&self) -> usize {
        self.routing.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.routing.read().is_empty()
    }

    /// Number of stored values.
    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    fn mark_seen(&self, peer: &PeerId) {
        if let Some(entry) = self.routing.write().get_mut(peer) {
            entry.liveness = Liveness::Live;
            entry.last_seen = Some(Instant::now());
        }
    }
}

#[async_trait]
impl DhtEngine for MemoryDht {
    async fn put(&self, key: &str, value: Bytes) -> Result<()> {
        trace!(key = %key, len = value.len(), "put");
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Bytes> {
        self.values
            .get(key)
            .map(|v| v.value().clone())
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn ping(&self, peer: &PeerId) -> Result<()> {
        let addresses = self.address_book.addresses(peer);
        if addresses.is_empty() {
            return Err(Error::UnknownPeer(peer.to_string()));
        }

        let mut last_err = None;
        for address in &addresses {
            match self.probe.probe(address).await {
                Ok(()) => {
                    self.mark_seen(peer);
                    return Ok(());
                }
                Err(e) => {
                    debug!(peer = %peer, address = %address, error = %e, "probe failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| Error::Unreachable(peer.to_string())))
    }

    async fn update(&self, peer: &PeerId, liveness: Liveness) -> Result<()> {
        let now = Instant::now();
        let mut routing = self.routing.write();
        let entry = routing.entry(peer.clone()).or_insert_with(|| RoutingEntry {
            liveness,
            joined_at: now,
            last_seen: None,
        });
        entry.liveness = liveness;
        if liveness.is_live() {
            entry.last_seen = Some(now);
        }
        debug!(peer = %peer, liveness = ?liveness, members = routing.len(), "membership updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::NodeAddress;
    use crate::peer::Ttl;
    use crate::peerstore::Peerstore;
    use std::collections::HashSet;

    /// Probe that succeeds only for the listed dial targets.
    struct ReachableSet(HashSet<String>);

    #[async_trait]
    impl LivenessProbe for ReachableSet {
        async fn probe(&self, address: &NodeAddress) -> Result<()> {
            if self.0.contains(&address.dial_target()) {
                Ok(())
            } else {
                Err(Error::Unreachable(address.to_string()))
            }
        }
    }

    fn engine_with(reachable: &[&str]) -> (MemoryDht, Arc<Peerstore>) {
        let book = Arc::new(Peerstore::new());
        let probe = ReachableSet(reachable.iter().map(|s| s.to_string()).collect());
        (MemoryDht::new(book.clone(), Arc::new(probe)), book)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (dht, _) = engine_with(&[]);
        dht.put("k1", Bytes::from_static(b"v1")).await.unwrap();
        assert_eq!(dht.get("k1").await.unwrap(), Bytes::from_static(b"v1"));
        assert_eq!(dht.value_count(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (dht, _) = engine_with(&[]);
        assert_eq!(
            dht.get("missing").await,
            Err(Error::NotFound("missing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let (dht, _) = engine_with(&[]);
        dht.put("k", Bytes::from_static(b"old")).await.unwrap();
        dht.put("k", Bytes::from_static(b"new")).await.unwrap();
        assert_eq!(dht.get("k").await.unwrap(), Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn test_ping_unknown_peer() {
        let (dht, _) = engine_with(&[]);
        let peer = PeerId::parse("QmGhost").unwrap();
        assert_eq!(
            dht.ping(&peer).await,
            Err(Error::UnknownPeer("QmGhost".to_string()))
        );
    }

    #[tokio::test]
    async fn test_ping_tries_every_address() {
        let (dht, book) = engine_with(&["10.0.0.2:4001"]);
        let dead: NodeAddress = "/ip4/10.0.0.1/tcp/4001/p2p/QmA".parse().unwrap();
        let alive: NodeAddress = "/ip4/10.0.0.2/tcp/4001/p2p/QmA".parse().unwrap();
        book.add_address(dead.peer_id(), &dead, Ttl::Permanent);
        book.add_address(alive.peer_id(), &alive, Ttl::Permanent);

        assert!(dht.ping(dead.peer_id()).await.is_ok());
    }

    #[tokio::test]
    async fn test_ping_unreachable() {
        let (dht, book) = engine_with(&[]);
        let dead: NodeAddress = "/ip4/10.0.0.1/tcp/4001/p2p/QmA".parse().unwrap();
        book.add_address(dead.peer_id(), &dead, Ttl::Permanent);

        assert!(matches!(
            dht.ping(dead.peer_id()).await,
            Err(Error::Unreachable(_))
        ));
    }

    #[tokio::test]
    async fn test_update_inserts_and_retags() {
        let (dht, book) = engine_with(&["10.0.0.1:4001"]);
        let peer: NodeAddress = "/ip4/10.0.0.1/tcp/4001/p2p/QmA".parse().unwrap();
        book.add_address(peer.peer_id(), &peer, Ttl::Permanent);

        dht.update(peer.peer_id(), Liveness::Unresponsive).await.unwrap();
        assert!(dht.contains(peer.peer_id()));
        assert_eq!(dht.routing_table()[0].1.liveness, Liveness::Unresponsive);

        // A later successful ping promotes the entry.
        dht.ping(peer.peer_id()).await.unwrap();
        let (_, entry) = &dht.routing_table()[0];
        assert_eq!(entry.liveness, Liveness::Live);
        assert!(entry.last_seen.is_some());
        assert_eq!(dht.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_puts_distinct_keys() {
        let (dht, _) = engine_with(&[]);
        let dht = Arc::new(dht);

        let mut handles = Vec::new();
        for i in 0..32 {
            let dht = dht.clone();
            handles.push(tokio::spawn(async move {
                dht.put(&format!("key-{i}"), Bytes::from(format!("value-{i}")))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        for i in 0..32 {
            let value = dht.get(&format!("key-{i}")).await.unwrap();
            assert_eq!(value, Bytes::from(format!("value-{i}")));
        }
    }
}
