//! `kad-node node`: run a node until interrupted.

use tracing::info;

use crate::config::NodeConfig;
use crate::runtime::NodeRuntime;

pub async fn run(config: NodeConfig) -> anyhow::Result<()> {
    let node = NodeRuntime::start(config).await?;

    let report = node.bootstrap_report();
    info!(
        address = %node.address(),
        control = %node.control_addr(),
        joined = report.joined(),
        live = report.live(),
        "ready; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    node.shutdown().await
}
