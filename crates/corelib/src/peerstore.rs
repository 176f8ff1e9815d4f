//! In-memory address book.

use std::time::Instant;

use dashmap::DashMap;

use crate::address::NodeAddress;
use crate::network::AddressBook;
use crate::node::PeerId;
use crate::peer::Ttl;

#[derive(Clone, Debug)]
struct AddrEntry {
    address: NodeAddress,
    /// `None` for permanent entries.
    expires: Option<Instant>,
}

impl AddrEntry {
    #[inline]
    fn is_live(&self, now: Instant) -> bool {
        self.expires.map_or(true, |deadline| deadline > now)
    }
}

/// Address book keyed by peer id.
///
/// Re-adding a known address refreshes its TTL instead of duplicating it.
/// Expired entries are filtered on read and dropped on the next write for
/// that peer.
#[derive(Debug, Default)]
pub struct Peerstore {
    entries: DashMap<PeerId, Vec<AddrEntry>>,
}

impl Peerstore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AddressBook for Peerstore {
    fn add_address(&self, peer: &PeerId, address: &NodeAddress, ttl: Ttl) {
        let now = Instant::now();
        let expires = ttl.deadline_from(now);

        let mut list = self.entries.entry(peer.clone()).or_default();
        list.retain(|entry| entry.is_live(now));

        match list.iter_mut().find(|entry| &entry.address == address) {
            Some(existing) => existing.expires = expires,
            None => list.push(AddrEntry {
                address: address.clone(),
                expires,
            }),
        }
    }

    fn addresses(&self, peer: &PeerId) -> Vec<NodeAddress> {
        let now = Instant::now();
        self.entries
            .get(peer)
            .map(|list| {
                list.iter()
                    .filter(|entry| entry.is_live(now))
                    .map(|entry| entry.address.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn peers(&self) -> Vec<PeerId> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn addr(s: &str) -> NodeAddress {
        s.parse().unwrap()
    }

    #[test]
    fn test_add_and_lookup() {
        let store = Peerstore::new();
        let a = addr("/ip4/10.0.0.1/tcp/4001/p2p/QmA");
        store.add_address(a.peer_id(), &a, Ttl::Permanent);

        assert_eq!(store.addresses(a.peer_id()), vec![a.clone()]);
        assert_eq!(store.peers(), vec![a.peer_id().clone()]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_address_is_not_repeated() {
        let store = Peerstore::new();
        let a = addr("/ip4/10.0.0.1/tcp/4001/p2p/QmA");
        store.add_address(a.peer_id(), &a, Ttl::For(Duration::from_secs(60)));
        store.add_address(a.peer_id(), &a, Ttl::Permanent);

        assert_eq!(store.addresses(a.peer_id()).len(), 1);
    }

    #[test]
    fn test_multiple_addresses_keep_insertion_order() {
        let store = Peerstore::new();
        let first = addr("/ip4/10.0.0.1/tcp/4001/p2p/QmA");
        let second = addr("/dns4/a.local/tcp/4001/p2p/QmA");
        store.add_address(first.peer_id(), &first, Ttl::Permanent);
        store.add_address(second.peer_id(), &second, Ttl::Permanent);

        assert_eq!(store.addresses(first.peer_id()), vec![first, second]);
    }

    #[test]
    fn test_expired_entries_are_hidden() {
        let store = Peerstore::new();
        let a = addr("/ip4/10.0.0.1/tcp/4001/p2p/QmA");
        store.add_address(a.peer_id(), &a, Ttl::For(Duration::ZERO));

        assert!(store.addresses(a.peer_id()).is_empty());
    }

    #[test]
    fn test_unknown_peer_has_no_addresses() {
        let store = Peerstore::new();
        let unknown = PeerId::parse("QmNobody").unwrap();
        assert!(store.addresses(&unknown).is_empty());
        assert!(store.is_empty());
    }
}
