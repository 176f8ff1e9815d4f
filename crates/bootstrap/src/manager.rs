//! Bootstrap manager.
//!
//! Walks the peer list handed out by the rendezvous service and brings each
//! peer into the local view of the overlay.
//!
//! # Algorithm
//!
//! For every locator, in list order:
//!
//! 1. Parse it into a `NodeAddress`; a bad locator is recorded and skipped
//! 2. Skip it if it names this node
//! 3. Register the address with a permanent TTL
//! 4. Ping the peer, bounded by `ping_timeout`
//! 5. Ask the membership policy, and on `Join` update the engine
//!
//! Failures are scoped to one peer. Nothing here aborts the loop, so the
//! node always finishes bootstrap and goes on to serve.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};

use corelib::{AddressBook, DhtEngine, Liveness, NodeAddress, PeerId, PeerRecord, Ttl};
use discovery::PeerList;

use crate::policy::{MembershipDecision, MembershipPolicy};
use crate::report::{BootstrapReport, PeerOutcome};

pub struct BootstrapManager {
    engine: Arc<dyn DhtEngine>,
    address_book: Arc<dyn AddressBook>,
    policy: Arc<dyn MembershipPolicy>,
    ping_timeout: Duration,
    local_peer: Option<PeerId>,
}

impl BootstrapManager {
    /// Create a manager.
    ///
    /// # Arguments
    /// * `engine` - Store engine receiving `ping` and `update`
    /// * `address_book` - Where discovered addresses are registered
    /// * `policy` - Decides which probed peers join
    /// * `ping_timeout` - Deadline for each ping; expiry counts as unresponsive
    pub fn new(
        engine: Arc<dyn DhtEngine>,
        address_book: Arc<dyn AddressBook>,
        policy: Arc<dyn MembershipPolicy>,
        ping_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            address_book,
            policy,
            ping_timeout,
            local_peer: None,
        }
    }

    /// Skip locators carrying this node's own identity.
    pub fn with_local_peer(mut self, peer: PeerId) -> Self {
        self.local_peer = Some(peer);
        self
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Process `peers` sequentially and report what happened to each entry.
    pub async fn run(&self, peers: &PeerList) -> BootstrapReport {
        let span = info_span!("bootstrap", policy = self.policy.name(), peers = peers.len());
        async {
            let mut report = BootstrapReport::new();
            if peers.is_empty() {
                info!("no peers to bootstrap from; running as the first node");
                return report;
            }

            for entry in peers {
                report.push(self.bootstrap_peer(entry).await);
            }

            info!(
                joined = report.joined(),
                live = report.live(),
                unresponsive = report.unresponsive(),
                malformed = report.malformed(),
                failed = report.failed(),
                "bootstrap finished"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn bootstrap_peer(&self, entry: &str) -> PeerOutcome {
        let address: NodeAddress = match entry.parse() {
            Ok(address) => address,
            Err(error) => {
                warn!(entry, error = %error, "skipping malformed peer locator");
                return PeerOutcome::Malformed {
                    entry: entry.to_string(),
                    error,
                };
            }
        };

        let mut record = PeerRecord::new(address, Ttl::Permanent);
        if self.local_peer.as_ref() == Some(&record.identity) {
            debug!(peer = %record.identity, "skipping own locator");
            return PeerOutcome::Local {
                peer: record.identity,
            };
        }

        self.address_book
            .add_address(&record.identity, &record.address, record.ttl);

        let liveness = self.probe(&record.identity).await;
        if liveness.is_live() {
            record.refresh(Ttl::Permanent);
        }

        match self.policy.decide(&record.identity, liveness) {
            MembershipDecision::Reject => {
                info!(peer = %record.identity, ?liveness, "peer not admitted by policy");
                PeerOutcome::Rejected { record, liveness }
            }
            MembershipDecision::Join(tag) => match self.engine.update(&record.identity, tag).await {
                Ok(()) => {
                    info!(peer = %record.identity, address = %record.address, liveness = ?tag, "peer joined");
                    PeerOutcome::Joined {
                        record,
                        liveness: tag,
                    }
                }
                Err(error) => {
                    warn!(peer = %record.identity, error = %error, "routing table update failed");
                    PeerOutcome::UpdateFailed {
                        record,
                        liveness: tag,
                        error,
                    }
                }
            },
        }
    }

    async fn probe(&self, peer: &PeerId) -> Liveness {
        match timeout(self.ping_timeout, self.engine.ping(peer)).await {
            Ok(Ok(())) => Liveness::Live,
            Ok(Err(error)) => {
                warn!(peer = %peer, error = %error, "peer did not answer ping");
                Liveness::Unresponsive
            }
            Err(_) => {
                warn!(peer = %peer, after = ?self.ping_timeout, "ping timed out");
                Liveness::Unresponsive
            }
        }
    }
}
