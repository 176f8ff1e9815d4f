//! CLI entry point for kad-node.

use clap::Parser;
use kad_node::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    kad_node::logging::init(config.log_level, config.disable_logging)?;
    config.run().await
}
