//! Core library for the DHT node.
//!
//! This crate provides the fundamental abstractions shared by every layer:
//! - Peer identities and dialable locators
//! - Peer records, TTLs and liveness tags
//! - The store engine, address book and liveness probe contracts
//! - An in-memory address book and reference store engine

pub mod address;
pub mod error;
pub mod network;
pub mod node;
pub mod peer;
pub mod peerstore;
pub mod store;

pub use address::{Host, NodeAddress};
pub use error::{Error, Result};
pub use network::{AddressBook, DhtEngine, LivenessProbe};
pub use node::{Identity, PeerId};
pub use peer::{Liveness, PeerRecord, Ttl};
pub use peerstore::Peerstore;
pub use store::{MemoryDht, RoutingEntry};
