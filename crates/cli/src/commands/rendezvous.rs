//! `kad-node rendezvous`: run the rendezvous service until interrupted.

use anyhow::Context;
use tracing::info;

use discovery::RendezvousServer;

use crate::config::RendezvousArgs;

pub async fn run(args: RendezvousArgs) -> anyhow::Result<()> {
    let server = RendezvousServer::bind(args.listen.as_str(), args.rendezvous_config())
        .await
        .with_context(|| format!("cannot bind rendezvous service on {}", args.listen))?;
    info!(addr = %server.local_addr()?, "rendezvous service started");

    tokio::select! {
        result = server.serve() => result.context("rendezvous service failed"),
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("shutting down");
            Ok(())
        }
    }
}
