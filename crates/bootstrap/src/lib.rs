//! Joining the overlay from an initial peer list.
//!
//! This crate provides:
//! - Pluggable membership policies deciding which peers enter the routing table
//! - The bootstrap manager that registers, probes and joins each peer
//! - Per-peer outcome reporting

pub mod manager;
pub mod policy;
pub mod report;

pub use manager::BootstrapManager;
pub use policy::{
    AlwaysJoin, LiveOnly, MembershipDecision, MembershipPolicy, PolicyKind, UnknownPolicy,
};
pub use report::{BootstrapReport, PeerOutcome};
