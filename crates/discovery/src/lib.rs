//! Discovery protocol for joining the overlay.
//!
//! This crate provides the wire protocol and both ends of it:
//! - Length-prefixed frame codec
//! - Announcement and peer-list messages
//! - One-shot handshake client used at node startup
//! - Rendezvous service that collects announcements
//! - TCP liveness probe and the responder that answers it

mod accept;
pub mod client;
pub mod codec;
pub mod error;
pub mod probe;
pub mod protocol;
pub mod rendezvous;

pub use client::{DiscoveryClient, DiscoverySession, Timeouts};
pub use error::{DiscoveryError, Result};
pub use probe::{ProbeResponder, TcpProbe};
pub use protocol::{Announcement, PeerList};
pub use rendezvous::{Registry, RendezvousConfig, RendezvousServer};
