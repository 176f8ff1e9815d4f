//! Command-line and environment configuration.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use bootstrap::PolicyKind;
use clap::{Args, Parser, Subcommand};
use discovery::Timeouts;
use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;

pub const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("control port would be {p2p_port} + 1, which exceeds 65535; set --control-port")]
    ControlPortOverflow { p2p_port: u16 },
}

#[derive(Parser, Debug)]
#[command(name = "kad-node")]
#[command(about = "DHT node with rendezvous bootstrap and a JSON control plane")]
pub struct CliConfig {
    #[command(subcommand)]
    pub command: Command,

    /// Maximum log level (overridden by RUST_LOG when set)
    #[arg(long, global = true, env = "KAD_LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    /// Turn logging off entirely
    #[arg(long, global = true)]
    pub disable_logging: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a DHT node
    Node(NodeConfig),
    /// Run the rendezvous service
    Rendezvous(RendezvousArgs),
    /// Store a value through a node's control plane
    Put {
        /// Control-plane address, host:port
        control: String,
        key: String,
        value: String,
    },
    /// Fetch a value through a node's control plane
    Get {
        /// Control-plane address, host:port
        control: String,
        key: String,
    },
}

/// Node settings.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// P2P listen port (0 picks a free port)
    pub p2p_port: u16,

    /// Rendezvous service address, host:port
    pub discovery: String,

    /// Control-plane port [default: P2P port + 1]
    #[arg(long, env = "KAD_CONTROL_PORT")]
    pub control_port: Option<u16>,

    /// IP advertised to peers [default: local IP of the rendezvous connection]
    #[arg(long)]
    pub listen_ip: Option<IpAddr>,

    /// Bind address for the control plane
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub control_host: IpAddr,

    #[arg(long, default_value_t = DEFAULT_DISCOVERY_TIMEOUT_MS)]
    pub discovery_timeout_ms: u64,

    #[arg(long, default_value_t = DEFAULT_PING_TIMEOUT_MS)]
    pub ping_timeout_ms: u64,

    /// Deadline for each store operation issued by the control plane
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    pub request_timeout_ms: u64,

    /// Which probed peers join the routing table: always-join or live-only
    #[arg(long, default_value = "always-join")]
    pub membership: PolicyKind,
}

impl NodeConfig {
    pub fn new(p2p_port: u16, discovery: impl Into<String>) -> Self {
        Self {
            p2p_port,
            discovery: discovery.into(),
            control_port: None,
            listen_ip: None,
            control_host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            discovery_timeout_ms: DEFAULT_DISCOVERY_TIMEOUT_MS,
            ping_timeout_ms: DEFAULT_PING_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            membership: PolicyKind::default(),
        }
    }

    /// Control-plane port for a node whose P2P listener is bound to `p2p_port`.
    pub fn control_port_for(&self, p2p_port: u16) -> Result<u16, ConfigError> {
        match self.control_port {
            Some(port) => Ok(port),
            None => p2p_port
                .checked_add(1)
                .ok_or(ConfigError::ControlPortOverflow { p2p_port }),
        }
    }

    pub fn discovery_timeouts(&self) -> Timeouts {
        let deadline = Duration::from_millis(self.discovery_timeout_ms);
        Timeouts {
            connect: deadline,
            exchange: deadline,
        }
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RendezvousArgs {
    /// Listen address, host:port
    pub listen: String,

    /// Maximum peers handed to each newcomer
    #[arg(long, default_value_t = 20)]
    pub max_peers: usize,

    #[arg(long, default_value_t = 5_000)]
    pub read_timeout_ms: u64,
}

impl RendezvousArgs {
    pub fn rendezvous_config(&self) -> discovery::RendezvousConfig {
        discovery::RendezvousConfig {
            max_peers: self.max_peers,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(args: &[&str]) -> NodeConfig {
        let argv = ["kad-node", "node"].iter().chain(args.iter());
        match CliConfig::try_parse_from(argv).unwrap().command {
            Command::Node(config) => config,
            other => panic!("expected node command, got {other:?}"),
        }
    }

    #[test]
    fn test_node_defaults() {
        let config = node(&["4001", "10.0.0.1:8000"]);
        assert_eq!(config, NodeConfig::new(4001, "10.0.0.1:8000"));
        assert_eq!(config.control_port_for(4001), Ok(4002));
        assert_eq!(config.discovery_timeouts().connect, Duration::from_secs(5));
        assert_eq!(config.ping_timeout(), Duration::from_secs(2));
        assert_eq!(config.membership, PolicyKind::AlwaysJoin);
    }

    #[test]
    fn test_explicit_control_port() {
        let config = node(&["4001", "rdv:8000", "--control-port", "9000"]);
        assert_eq!(config.control_port_for(4001), Ok(9000));
    }

    #[test]
    fn test_control_port_overflow() {
        let config = node(&["65535", "rdv:8000"]);
        assert_eq!(
            config.control_port_for(65535),
            Err(ConfigError::ControlPortOverflow { p2p_port: 65535 })
        );
    }

    #[test]
    fn test_membership_and_timeouts() {
        let config = node(&[
            "4001",
            "rdv:8000",
            "--membership",
            "live-only",
            "--ping-timeout-ms",
            "250",
            "--listen-ip",
            "192.168.1.5",
        ]);
        assert_eq!(config.membership, PolicyKind::LiveOnly);
        assert_eq!(config.ping_timeout(), Duration::from_millis(250));
        assert_eq!(config.listen_ip, Some("192.168.1.5".parse().unwrap()));
    }

    #[test]
    fn test_logging_flags() {
        let cli = CliConfig::try_parse_from([
            "kad-node",
            "--log-level",
            "debug",
            "--disable-logging",
            "rendezvous",
            "0.0.0.0:8000",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LevelFilter::DEBUG);
        assert!(cli.disable_logging);
        assert!(matches!(cli.command, Command::Rendezvous(ref args) if args.max_peers == 20));
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(CliConfig::try_parse_from(["kad-node", "node", "70000", "rdv:1"]).is_err());
        assert!(CliConfig::try_parse_from(["kad-node", "node", "4001"]).is_err());
        assert!(CliConfig::try_parse_from([
            "kad-node",
            "node",
            "4001",
            "rdv:1",
            "--membership",
            "sometimes"
        ])
        .is_err());
    }
}
