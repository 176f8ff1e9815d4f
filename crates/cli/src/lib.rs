//! DHT node process.
//!
//! Provides commands for:
//! - Running a node (discovery, bootstrap, control plane)
//! - Running the rendezvous service
//! - Issuing put/get requests against a node's control plane

pub mod commands;
pub mod config;
pub mod logging;
pub mod runtime;

pub use commands::client::ControlClient;
pub use config::{CliConfig, Command, ConfigError, NodeConfig, RendezvousArgs};
pub use runtime::{NodeRuntime, RunningNode};
