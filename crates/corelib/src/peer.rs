//! Peer records and liveness tags.

use std::time::{Duration, Instant};

use crate::address::NodeAddress;
use crate::node::PeerId;

/// How long an address-book entry stays valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ttl {
    /// Never expires; used for peers learned through bootstrap.
    Permanent,
    For(Duration),
}

impl Ttl {
    /// Absolute expiry for an entry recorded at `now`, or `None` if it never expires.
    pub fn deadline_from(self, now: Instant) -> Option<Instant> {
        match self {
            Ttl::Permanent => None,
            // An unrepresentable deadline is as good as permanent.
            Ttl::For(d) => now.checked_add(d),
        }
    }
}

/// Outcome of the most recent liveness probe against a peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Liveness {
    Live,
    Unresponsive,
}

impl Liveness {
    pub fn is_live(self) -> bool {
        matches!(self, Liveness::Live)
    }
}

/// A peer learned from the rendezvous service.
///
/// Only `refresh` mutates a record, and only after a successful probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerRecord {
    pub identity: PeerId,
    pub address: NodeAddress,
    pub ttl: Ttl,
    pub last_seen: Option<Instant>,
}

impl PeerRecord {
    pub fn new(address: NodeAddress, ttl: Ttl) -> Self {
        Self {
            identity: address.peer_id().clone(),
            address,
            ttl,
            last_seen: None,
        }
    }

    pub fn refresh(&mut self, ttl: Ttl) {
        self.ttl = ttl;
        self.last_seen = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permanent_ttl_has_no_deadline() {
        assert_eq!(Ttl::Permanent.deadline_from(Instant::now()), None);
    }

    #[test]
    fn test_finite_ttl_deadline() {
        let now = Instant::now();
        let deadline = Ttl::For(Duration::from_secs(5)).deadline_from(now);
        assert_eq!(deadline, Some(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_record_refresh() {
        let address: NodeAddress = "/ip4/127.0.0.1/tcp/4001/p2p/QmA".parse().unwrap();
        let mut record = PeerRecord::new(address, Ttl::For(Duration::from_secs(1)));
        assert_eq!(record.identity.as_str(), "QmA");
        assert!(record.last_seen.is_none());

        record.refresh(Ttl::Permanent);
        assert_eq!(record.ttl, Ttl::Permanent);
        assert!(record.last_seen.is_some());
    }
}
