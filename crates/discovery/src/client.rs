//! Discovery handshake client.
//!
//! A one-shot exchange with the rendezvous service:
//!
//! 1. `connect` dials the service. The local end of this connection tells
//!    the caller which IP to advertise.
//! 2. `announce` sends this node's locator and reads back the initial
//!    `PeerList`, then shuts the connection down.
//!
//! Connect failures are fatal to startup. Failures during the exchange are
//! reported as non-fatal errors (`DiscoveryError::is_fatal` returns false)
//! and callers fall back to running as an isolated node.

use std::net::IpAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, info_span, Instrument, Span};

use corelib::NodeAddress;

use crate::codec::{read_frame, write_frame, MAX_FRAME_LEN};
use crate::error::{DiscoveryError, Result};
use crate::protocol::{Announcement, PeerList};

/// Deadlines for the two phases of the handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub exchange: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            exchange: Duration::from_secs(5),
        }
    }
}

/// Client for a single rendezvous service.
#[derive(Clone, Debug)]
pub struct DiscoveryClient {
    rendezvous: String,
    timeouts: Timeouts,
    max_response: usize,
    span: Span,
}

impl DiscoveryClient {
    pub fn new(rendezvous: impl Into<String>, timeouts: Timeouts) -> Self {
        let rendezvous = rendezvous.into();
        let span = info_span!("discovery", rendezvous = %rendezvous);
        Self {
            rendezvous,
            timeouts,
            max_response: MAX_FRAME_LEN,
            span,
        }
    }

    /// Cap on the size of the peer-list response.
    pub fn with_max_response(mut self, max_response: usize) -> Self {
        self.max_response = max_response;
        self
    }

    pub fn rendezvous(&self) -> &str {
        &self.rendezvous
    }

    /// Open the connection to the rendezvous service.
    pub async fn connect(&self) -> Result<DiscoverySession> {
        self.dial().instrument(self.span.clone()).await
    }

    async fn dial(&self) -> Result<DiscoverySession> {
        let stream = timeout(self.timeouts.connect, TcpStream::connect(&self.rendezvous))
            .await
            .map_err(|_| DiscoveryError::ConnectTimeout {
                addr: self.rendezvous.clone(),
                after: self.timeouts.connect,
            })?
            .map_err(|source| DiscoveryError::Connect {
                addr: self.rendezvous.clone(),
                source,
            })?;

        let local_ip = stream
            .local_addr()
            .map_err(|source| DiscoveryError::Connect {
                addr: self.rendezvous.clone(),
                source,
            })?
            .ip();

        debug!(local_ip = %local_ip, "connected to rendezvous service");

        Ok(DiscoverySession {
            stream,
            local_ip,
            exchange_timeout: self.timeouts.exchange,
            max_response: self.max_response,
            span: self.span.clone(),
        })
    }
}

/// An open connection to the rendezvous service, consumed by `announce`.
#[derive(Debug)]
pub struct DiscoverySession {
    stream: TcpStream,
    local_ip: IpAddr,
    exchange_timeout: Duration,
    max_response: usize,
    span: Span,
}

impl DiscoverySession {
    /// Local IP of the connection, used as the advertised address.
    pub fn local_ip(&self) -> IpAddr {
        self.local_ip
    }

    /// Announce `address` and return the peers the service knows about.
    ///
    /// The connection is shut down before returning, whatever the outcome.
    pub async fn announce(self, address: &NodeAddress) -> Result<PeerList> {
        let span = self.span.clone();
        let DiscoverySession {
            mut stream,
            exchange_timeout,
            max_response,
            ..
        } = self;

        async move {
            let announcement = Announcement::new(address);
            let exchange = async {
                write_frame(&mut stream, announcement.as_str().as_bytes()).await?;
                let payload = read_frame(&mut stream, max_response).await?;
                PeerList::from_json(&payload)
            };

            let result = match timeout(exchange_timeout, exchange).await {
                Ok(result) => result,
                Err(_) => Err(DiscoveryError::Timeout(exchange_timeout)),
            };

            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "failed to shut down discovery connection");
            }

            if let Ok(peers) = &result {
                info!(peers = peers.len(), "received initial peer list");
            }
            result
        }
        .instrument(span)
        .await
    }
}
