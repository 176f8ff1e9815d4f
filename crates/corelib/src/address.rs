//! Dialable peer locators.
//!
//! A `NodeAddress` pairs a transport address with a peer identity:
//!
//! ```text
//! /ip4/10.0.0.7/tcp/4001/p2p/QmPeer
//! /dns4/node-3.local/tcp/4001/p2p/QmPeer
//! ```
//!
//! The legacy `/ipfs/<id>` suffix is accepted on input and always rendered
//! back as `/p2p/<id>`.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::node::PeerId;

/// Network-layer part of a locator.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Host {
    Ip4(Ipv4Addr),
    Ip6(Ipv6Addr),
    Dns(String),
    Dns4(String),
    Dns6(String),
}

impl Host {
    fn protocol(&self) -> &'static str {
        match self {
            Host::Ip4(_) => "ip4",
            Host::Ip6(_) => "ip6",
            Host::Dns(_) => "dns",
            Host::Dns4(_) => "dns4",
            Host::Dns6(_) => "dns6",
        }
    }
}

impl From<IpAddr> for Host {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(v4) => Host::Ip4(v4),
            IpAddr::V6(v6) => Host::Ip6(v6),
        }
    }
}

impl From<Ipv4Addr> for Host {
    fn from(ip: Ipv4Addr) -> Self {
        Host::Ip4(ip)
    }
}

impl From<Ipv6Addr> for Host {
    fn from(ip: Ipv6Addr) -> Self {
        Host::Ip6(ip)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Ip4(ip) => write!(f, "{}", ip),
            Host::Ip6(ip) => write!(f, "{}", ip),
            Host::Dns(name) | Host::Dns4(name) | Host::Dns6(name) => f.write_str(name),
        }
    }
}

/// A dialable locator: transport address plus peer identity.
///
/// Immutable once built; the local node creates exactly one at startup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeAddress {
    host: Host,
    port: u16,
    peer_id: PeerId,
}

impl NodeAddress {
    pub fn new(host: impl Into<Host>, port: u16, peer_id: PeerId) -> Self {
        Self {
            host: host.into(),
            port,
            peer_id,
        }
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    /// `host:port` suitable for `TcpStream::connect`.
    pub fn dial_target(&self) -> String {
        match &self.host {
            Host::Ip6(ip) => format!("[{}]:{}", ip, self.port),
            host => format!("{}:{}", host, self.port),
        }
    }

    /// The locator without its `/p2p/<id>` suffix.
    pub fn transport_addr(&self) -> String {
        format!("/{}/{}/tcp/{}", self.host.protocol(), self.host, self.port)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/p2p/{}", self.transport_addr(), self.peer_id)
    }
}

impl FromStr for NodeAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix('/')
            .ok_or_else(|| Error::invalid_address(s, "locator must start with '/'"))?;

        let parts: Vec<&str> = rest.split('/').collect();
        let &[proto, host, transport, port, p2p, id] = parts.as_slice() else {
            return Err(Error::invalid_address(
                s,
                "expected /<proto>/<host>/tcp/<port>/p2p/<peer-id>",
            ));
        };

        let host = match proto {
            "ip4" => Host::Ip4(
                host.parse()
                    .map_err(|_| Error::invalid_address(s, format!("bad ip4 address {:?}", host)))?,
            ),
            "ip6" => Host::Ip6(
                host.parse()
                    .map_err(|_| Error::invalid_address(s, format!("bad ip6 address {:?}", host)))?,
            ),
            "dns" | "dns4" | "dns6" if host.is_empty() => {
                return Err(Error::invalid_address(s, "empty dns name"));
            }
            "dns" => Host::Dns(host.to_string()),
            "dns4" => Host::Dns4(host.to_string()),
            "dns6" => Host::Dns6(host.to_string()),
            other => {
                return Err(Error::invalid_address(
                    s,
                    format!("unsupported protocol {:?}", other),
                ));
            }
        };

        if transport != "tcp" {
            return Err(Error::invalid_address(
                s,
                format!("unsupported transport {:?}", transport),
            ));
        }

        let port: u16 = port
            .parse()
            .map_err(|_| Error::invalid_address(s, format!("bad port {:?}", port)))?;
        if port == 0 {
            return Err(Error::invalid_address(s, "port must be non-zero"));
        }

        if p2p != "p2p" && p2p != "ipfs" {
            return Err(Error::invalid_address(
                s,
                format!("expected /p2p/ segment, found {:?}", p2p),
            ));
        }

        let peer_id = PeerId::parse(id)
            .map_err(|_| Error::invalid_address(s, format!("bad peer id {:?}", id)))?;

        Ok(Self {
            host,
            port,
            peer_id,
        })
    }
}
