//! Tests for the reference store engine wired to the in-memory address book.
//!
//! # Test Strategy
//!
//! 1. **Basic functionality**: put/get, membership updates
//! 2. **Liveness**: ping resolves addresses through the address book
//! 3. **Edge cases**: unknown keys, unknown peers, expired addresses
//! 4. **Thread safety**: concurrent writers and readers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use corelib::{
    AddressBook, DhtEngine, Error, Liveness, LivenessProbe, MemoryDht, NodeAddress, Peerstore,
    Result, Ttl,
};

/// Probe that accepts every address and counts calls.
#[derive(Default)]
struct CountingProbe {
    calls: AtomicUsize,
}

#[async_trait]
impl LivenessProbe for CountingProbe {
    async fn probe(&self, _address: &NodeAddress) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn setup() -> (Arc<MemoryDht>, Arc<Peerstore>, Arc<CountingProbe>) {
    let book = Arc::new(Peerstore::new());
    let probe = Arc::new(CountingProbe::default());
    let dht = Arc::new(MemoryDht::new(book.clone(), probe.clone()));
    (dht, book, probe)
}

fn locator(s: &str) -> NodeAddress {
    s.parse().expect("valid locator")
}

// ============================================================================
// Basic Functionality Tests
// ============================================================================

#[tokio::test]
async fn test_empty_engine() {
    let (dht, _, _) = setup();
    assert!(dht.is_empty());
    assert_eq!(dht.value_count(), 0);
    assert!(dht.routing_table().is_empty());
}

#[tokio::test]
async fn test_put_get_round_trip() {
    let (dht, _, _) = setup();
    dht.put("k1", Bytes::from_static(b"v1")).await.unwrap();

    let value = dht.get("k1").await.unwrap();
    assert_eq!(&value[..], b"v1", "stored value should come back unchanged");
}

#[tokio::test]
async fn test_membership_is_ordered_by_peer_id() {
    let (dht, _, _) = setup();
    for id in ["QmC", "QmA", "QmB"] {
        let peer = corelib::PeerId::parse(id).unwrap();
        dht.update(&peer, Liveness::Live).await.unwrap();
    }

    let ids: Vec<String> = dht
        .routing_table()
        .into_iter()
        .map(|(peer, _)| peer.to_string())
        .collect();
    assert_eq!(ids, vec!["QmA", "QmB", "QmC"]);
}

// ============================================================================
// Liveness Tests
// ============================================================================

#[tokio::test]
async fn test_ping_uses_address_book() {
    let (dht, book, probe) = setup();
    let peer = locator("/ip4/10.1.0.1/tcp/4001/p2p/QmPeer");
    book.add_address(peer.peer_id(), &peer, Ttl::Permanent);

    dht.ping(peer.peer_id()).await.unwrap();
    assert_eq!(probe.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_ping_skips_expired_addresses() {
    let (dht, book, probe) = setup();
    let peer = locator("/ip4/10.1.0.1/tcp/4001/p2p/QmPeer");
    book.add_address(peer.peer_id(), &peer, Ttl::For(Duration::ZERO));

    let result = dht.ping(peer.peer_id()).await;
    assert_eq!(result, Err(Error::UnknownPeer("QmPeer".to_string())));
    assert_eq!(probe.calls.load(Ordering::SeqCst), 0, "expired address must not be dialed");
}

// ============================================================================
// Edge Cases
// ============================================================================

#[tokio::test]
async fn test_empty_key_and_value() {
    let (dht, _, _) = setup();
    dht.put("", Bytes::new()).await.unwrap();
    assert_eq!(dht.get("").await.unwrap(), Bytes::new());
}

#[tokio::test]
async fn test_update_is_idempotent() {
    let (dht, _, _) = setup();
    let peer = corelib::PeerId::parse("QmSame").unwrap();
    dht.update(&peer, Liveness::Live).await.unwrap();
    dht.update(&peer, Liveness::Live).await.unwrap();
    assert_eq!(dht.len(), 1);
}

// ============================================================================
// Thread Safety Tests
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_readers_and_writers() {
    let (dht, _, _) = setup();

    let writers: Vec<_> = (0..16)
        .map(|i| {
            let dht = dht.clone();
            tokio::spawn(async move {
                for j in 0..16 {
                    dht.put(&format!("w{i}-k{j}"), Bytes::from(format!("{i}:{j}")))
                        .await
                        .unwrap();
                }
            })
        })
        .collect();

    for writer in writers {
        writer.await.unwrap();
    }

    let readers: Vec<_> = (0..16)
        .map(|i| {
            let dht = dht.clone();
            tokio::spawn(async move {
                for j in 0..16 {
                    let value = dht.get(&format!("w{i}-k{j}")).await.unwrap();
                    assert_eq!(value, Bytes::from(format!("{i}:{j}")));
                }
            })
        })
        .collect();

    for reader in readers {
        reader.await.unwrap();
    }
    assert_eq!(dht.value_count(), 256);
}
