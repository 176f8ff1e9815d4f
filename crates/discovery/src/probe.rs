//! Liveness probing over TCP.
//!
//! `ProbeResponder` listens on the node's P2P port and answers `ping` with
//! `pong`; `TcpProbe` is the dialing side, used by the store engine's
//! `ping`. Both speak the frame format from `codec`.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::time::timeout;
use tracing::{debug, info, info_span, trace, Instrument};

use corelib::{LivenessProbe, NodeAddress};

use crate::accept::{next_connection, ACCEPT_BACKOFF};
use crate::codec::{read_frame, write_frame};
use crate::error::{DiscoveryError, Result};
use crate::protocol::{PING, PONG};

/// Probe frames are tiny; anything bigger is not a probe.
const MAX_PROBE_LEN: usize = 64;

/// How long the responder waits for a request before dropping the connection.
const RESPONDER_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Dials a peer and expects `pong` within `timeout`.
#[derive(Clone, Copy, Debug)]
pub struct TcpProbe {
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl LivenessProbe for TcpProbe {
    async fn probe(&self, address: &NodeAddress) -> corelib::Result<()> {
        let target = address.dial_target();

        let exchange = async {
            let mut stream = TcpStream::connect(&target).await?;
            write_frame(&mut stream, PING).await?;
            let reply = read_frame(&mut stream, MAX_PROBE_LEN).await?;
            stream.shutdown().await.ok();

            if reply.as_ref() != PONG {
                return Err(DiscoveryError::UnexpectedMessage);
            }
            Ok::<(), DiscoveryError>(())
        };

        match timeout(self.timeout, exchange).await {
            Ok(Ok(())) => {
                trace!(addr = %target, "probe answered");
                Ok(())
            }
            Ok(Err(e)) => Err(corelib::Error::Unreachable(format!("{}: {}", target, e))),
            Err(_) => Err(corelib::Error::Timeout(self.timeout)),
        }
    }
}

/// Answers liveness probes on the P2P port.
pub struct ProbeResponder {
    listener: TcpListener,
}

impl ProbeResponder {
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the accept loop; each connection is answered on its own task.
    pub async fn serve(self) -> Result<()> {
        let local = self.local_addr()?;
        let span = info_span!("probe_responder", addr = %local);
        self.accept_loop().instrument(span).await
    }

    async fn accept_loop(self) -> Result<()> {
        info!("answering liveness probes");
        loop {
            let (stream, remote) =
                next_connection(|| self.listener.accept(), ACCEPT_BACKOFF).await;
            tokio::spawn(
                async move {
                    if let Err(e) = answer(stream).await {
                        debug!(remote = %remote, error = %e, "probe connection dropped");
                    }
                }
                .in_current_span(),
            );
        }
    }
}

async fn answer(mut stream: TcpStream) -> Result<()> {
    let request = timeout(RESPONDER_READ_TIMEOUT, read_frame(&mut stream, MAX_PROBE_LEN))
        .await
        .map_err(|_| DiscoveryError::Timeout(RESPONDER_READ_TIMEOUT))??;

    if request.as_ref() != PING {
        return Err(DiscoveryError::UnexpectedMessage);
    }

    write_frame(&mut stream, PONG).await?;
    stream.shutdown().await.ok();
    Ok(())
}
