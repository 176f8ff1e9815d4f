//! Rendezvous service.
//!
//! Collects announcements from joining nodes and hands each newcomer the
//! locators of nodes that announced before it. One connection carries one
//! exchange:
//!
//! 1. Read an announcement frame (bounded by `read_timeout`)
//! 2. Validate the announced locator
//! 3. Reply with up to `max_peers` of the most recently registered peers,
//!    oldest first, never including the announcer itself
//! 4. Register the announcer
//!
//! A peer that announces again replaces its previous address and moves to
//! the most-recent end of the registry.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::time::timeout;
use tracing::{info, info_span, warn, Instrument};

use corelib::NodeAddress;

use crate::accept::{next_connection, ACCEPT_BACKOFF};
use crate::codec::{read_frame, write_frame, MAX_FRAME_LEN};
use crate::error::{DiscoveryError, Result};
use crate::protocol::{Announcement, PeerList};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RendezvousConfig {
    /// Maximum peers returned to a newcomer.
    pub max_peers: usize,
    /// Deadline for receiving the announcement.
    pub read_timeout: Duration,
}

impl Default for RendezvousConfig {
    fn default() -> Self {
        Self {
            max_peers: 20,
            read_timeout: Duration::from_secs(5),
        }
    }
}

/// Registered peers in announcement order.
#[derive(Debug, Default)]
pub struct Registry {
    peers: RwLock<Vec<NodeAddress>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<NodeAddress> {
        self.peers.read().clone()
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    /// Return the peers to hand to `announcer`, then register it.
    ///
    /// Both steps happen under one write lock so concurrent newcomers see a
    /// consistent registry. Only the `max_peers + 1` most recent entries are
    /// kept, since older ones can never appear in a reply.
    pub fn exchange(&self, announcer: NodeAddress, max_peers: usize) -> PeerList {
        let mut peers = self.peers.write();

        let known: Vec<String> = peers
            .iter()
            .filter(|p| p.peer_id() != announcer.peer_id())
            .map(ToString::to_string)
            .collect();
        let skip = known.len().saturating_sub(max_peers);
        let reply = known.into_iter().skip(skip).collect();

        peers.retain(|p| p.peer_id() != announcer.peer_id());
        peers.push(announcer);

        let excess = peers.len().saturating_sub(max_peers + 1);
        peers.drain(..excess);
        reply
    }
}

/// TCP server for the rendezvous protocol.
pub struct RendezvousServer {
    listener: TcpListener,
    registry: Arc<Registry>,
    config: RendezvousConfig,
}

impl RendezvousServer {
    pub async fn bind(addr: impl ToSocketAddrs, config: RendezvousConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            registry: Arc::new(Registry::new()),
            config,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared handle to the registry, usable after `serve` takes ownership.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Run the accept loop. Each connection is served on its own task.
    pub async fn serve(self) -> Result<()> {
        let local = self.local_addr()?;
        let span = info_span!("rendezvous", addr = %local);
        self.accept_loop().instrument(span).await
    }

    async fn accept_loop(self) -> Result<()> {
        info!(max_peers = self.config.max_peers, "rendezvous service listening");
        loop {
            let (stream, peer_addr) =
                next_connection(|| self.listener.accept(), ACCEPT_BACKOFF).await;
            let registry = self.registry.clone();
            let config = self.config;

            tokio::spawn(
                async move {
                    if let Err(e) = handle_announcement(stream, &registry, config).await {
                        warn!(remote = %peer_addr, error = %e, "announcement rejected");
                    }
                }
                .in_current_span(),
            );
        }
    }
}

async fn handle_announcement(
    mut stream: TcpStream,
    registry: &Registry,
    config: RendezvousConfig,
) -> Result<()> {
    let payload = timeout(config.read_timeout, read_frame(&mut stream, MAX_FRAME_LEN))
        .await
        .map_err(|_| DiscoveryError::Timeout(config.read_timeout))??;

    let address = Announcement::from_payload(&payload)?.parse_address()?;
    let peer = address.peer_id().clone();

    let reply = registry.exchange(address, config.max_peers);
    write_frame(&mut stream, &reply.to_json()?).await?;
    stream.shutdown().await.ok();

    info!(peer = %peer, returned = reply.len(), registered = registry.len(), "peer registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> NodeAddress {
        s.parse().unwrap()
    }

    #[test]
    fn test_first_peer_gets_empty_list() {
        let registry = Registry::new();
        let reply = registry.exchange(addr("/ip4/10.0.0.1/tcp/1/p2p/QmA"), 20);
        assert!(reply.is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_newcomer_sees_earlier_peers_in_order() {
        let registry = Registry::new();
        registry.exchange(addr("/ip4/10.0.0.1/tcp/1/p2p/QmA"), 20);
        registry.exchange(addr("/ip4/10.0.0.2/tcp/1/p2p/QmB"), 20);

        let reply = registry.exchange(addr("/ip4/10.0.0.3/tcp/1/p2p/QmC"), 20);
        assert_eq!(
            reply.into_inner(),
            vec![
                "/ip4/10.0.0.1/tcp/1/p2p/QmA".to_string(),
                "/ip4/10.0.0.2/tcp/1/p2p/QmB".to_string(),
            ]
        );
    }

    #[test]
    fn test_reannounce_replaces_address() {
        let registry = Registry::new();
        registry.exchange(addr("/ip4/10.0.0.1/tcp/1/p2p/QmA"), 20);
        registry.exchange(addr("/ip4/10.0.0.2/tcp/1/p2p/QmB"), 20);

        let reply = registry.exchange(addr("/ip4/10.0.0.9/tcp/1/p2p/QmA"), 20);
        assert_eq!(reply.into_inner(), vec!["/ip4/10.0.0.2/tcp/1/p2p/QmB".to_string()]);

        let snapshot: Vec<String> = registry.snapshot().iter().map(|a| a.to_string()).collect();
        assert_eq!(
            snapshot,
            vec![
                "/ip4/10.0.0.2/tcp/1/p2p/QmB".to_string(),
                "/ip4/10.0.0.9/tcp/1/p2p/QmA".to_string(),
            ]
        );
    }

    #[test]
    fn test_registry_stays_bounded() {
        let registry = Registry::new();
        for i in 0..1000 {
            let locator = format!("/ip4/10.0.{}.{}/tcp/1/p2p/Qm{i}", i / 250, i % 250);
            registry.exchange(addr(&locator), 20);
        }
        assert_eq!(registry.len(), 21);

        let reply = registry.exchange(addr("/ip4/10.9.9.9/tcp/1/p2p/QmLast"), 20);
        assert_eq!(reply.len(), 20);
        assert_eq!(
            reply.iter().last().map(String::as_str),
            Some("/ip4/10.0.3.249/tcp/1/p2p/Qm999")
        );
        assert_eq!(registry.len(), 21);
    }

    #[test]
    fn test_reply_is_capped_to_most_recent() {
        let registry = Registry::new();
        for i in 1..=5 {
            registry.exchange(addr(&format!("/ip4/10.0.0.{i}/tcp/1/p2p/Qm{i}")), 2);
        }

        let reply = registry.exchange(addr("/ip4/10.0.0.9/tcp/1/p2p/QmNew"), 2);
        assert_eq!(
            reply.into_inner(),
            vec![
                "/ip4/10.0.0.4/tcp/1/p2p/Qm4".to_string(),
                "/ip4/10.0.0.5/tcp/1/p2p/Qm5".to_string(),
            ]
        );
    }
}
