//! Node startup pipeline and lifecycle.
//!
//! Startup is strictly sequential:
//!
//! 1. Connect to the rendezvous service (fatal on failure)
//! 2. Pick the advertised IP
//! 3. Bind the liveness responder on the P2P port (fatal)
//! 4. Bind the control-plane port (fatal)
//! 5. Generate the identity and build this node's locator
//! 6. Build the address book and store engine
//! 7. Announce and fetch the initial peers (degraded on failure)
//! 8. Bootstrap from those peers
//! 9. Start serving the control plane
//!
//! Every fatal step comes before the node announces itself, so a failed
//! start never leaves a registered locator or a bound port behind.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};

use bootstrap::{BootstrapManager, BootstrapReport};
use control::{build_router, ControlServer, ControlState};
use corelib::{Identity, MemoryDht, NodeAddress, Peerstore};
use discovery::{DiscoveryClient, PeerList, ProbeResponder, TcpProbe};

use crate::config::NodeConfig;

pub struct NodeRuntime;

impl NodeRuntime {
    pub async fn start(config: NodeConfig) -> anyhow::Result<RunningNode> {
        let span = info_span!("node", discovery = %config.discovery);
        Self::start_inner(config).instrument(span).await
    }

    async fn start_inner(config: NodeConfig) -> anyhow::Result<RunningNode> {
        let client = DiscoveryClient::new(config.discovery.clone(), config.discovery_timeouts());
        let session = client
            .connect()
            .await
            .context("cannot reach the rendezvous service")?;

        let advertised_ip = config.listen_ip.unwrap_or_else(|| session.local_ip());
        let bind_ip: IpAddr = if advertised_ip.is_ipv4() {
            Ipv4Addr::UNSPECIFIED.into()
        } else {
            Ipv6Addr::UNSPECIFIED.into()
        };

        let responder = ProbeResponder::bind((bind_ip, config.p2p_port))
            .await
            .with_context(|| format!("cannot bind P2P port {}", config.p2p_port))?;
        let p2p_port = responder.local_addr()?.port();

        let control_port = config.control_port_for(p2p_port)?;
        let server = ControlServer::bind((config.control_host, control_port))
            .await
            .with_context(|| format!("cannot bind control port {control_port}"))?;
        let control_addr = server.local_addr()?;

        let identity = Identity::generate(p2p_port);
        let address = NodeAddress::new(advertised_ip, p2p_port, identity.peer_id().clone());
        info!(address = %address, "node identity ready");

        let peerstore = Arc::new(Peerstore::new());
        let probe = Arc::new(TcpProbe::new(config.ping_timeout()));
        let engine = Arc::new(MemoryDht::new(peerstore.clone(), probe));
        let responder_task = tokio::spawn(responder.serve());

        let peers = match session.announce(&address).await {
            Ok(peers) => peers,
            Err(e) => {
                warn!(error = %e, "discovery exchange failed; starting without peers");
                PeerList::default()
            }
        };

        let manager = BootstrapManager::new(
            engine.clone(),
            peerstore.clone(),
            config.membership.build(),
            config.ping_timeout(),
        )
        .with_local_peer(identity.peer_id().clone());
        let report = manager.run(&peers).await;

        let router = build_router(ControlState::new(engine.clone(), config.request_timeout()));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let control_task = tokio::spawn(
            server
                .serve_with_shutdown(router, async {
                    stop_rx.await.ok();
                })
                .in_current_span(),
        );

        info!(
            address = %address,
            control = %control_addr,
            peers = engine.len(),
            "node running"
        );

        Ok(RunningNode {
            address,
            control_addr,
            engine,
            peerstore,
            report,
            stop: stop_tx,
            control_task,
            responder_task,
        })
    }
}

/// A started node. Dropping it leaves the background tasks running until the
/// runtime stops; call `shutdown` for an orderly stop.
pub struct RunningNode {
    address: NodeAddress,
    control_addr: SocketAddr,
    engine: Arc<MemoryDht>,
    peerstore: Arc<Peerstore>,
    report: BootstrapReport,
    stop: oneshot::Sender<()>,
    control_task: JoinHandle<std::io::Result<()>>,
    responder_task: JoinHandle<discovery::Result<()>>,
}

impl RunningNode {
    /// Locator this node announced.
    pub fn address(&self) -> &NodeAddress {
        &self.address
    }

    pub fn control_addr(&self) -> SocketAddr {
        self.control_addr
    }

    pub fn engine(&self) -> &Arc<MemoryDht> {
        &self.engine
    }

    pub fn peerstore(&self) -> &Arc<Peerstore> {
        &self.peerstore
    }

    pub fn bootstrap_report(&self) -> &BootstrapReport {
        &self.report
    }

    /// Stop accepting control requests, drain in-flight ones, then stop
    /// answering probes. Both ports are closed when this returns.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        let _ = self.stop.send(());
        let control = self.control_task.await;

        self.responder_task.abort();
        // Cancellation is the expected outcome; waiting for it releases the port.
        let _ = self.responder_task.await;

        control
            .context("control plane task panicked")?
            .context("control plane failed")?;
        info!(address = %self.address, "node stopped");
        Ok(())
    }
}
