//! Subcommand implementations.

pub mod client;
pub mod node;
pub mod rendezvous;

use std::io::Write;

use anyhow::Context;

use crate::config::{CliConfig, Command};
use client::ControlClient;

impl CliConfig {
    /// Run the selected subcommand to completion.
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Node(config) => node::run(config).await,
            Command::Rendezvous(args) => rendezvous::run(args).await,
            Command::Put {
                control,
                key,
                value,
            } => ControlClient::new(&control)?.put(&key, &value).await,
            Command::Get { control, key } => match ControlClient::new(&control)?.get(&key).await? {
                Some(value) => {
                    let mut out = std::io::stdout().lock();
                    out.write_all(&value)
                        .and_then(|()| out.write_all(b"\n"))
                        .context("cannot write value to stdout")
                }
                None => anyhow::bail!("no value stored under `{key}`"),
            },
        }
    }
}
