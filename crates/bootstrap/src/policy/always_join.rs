//! Join every discovered peer.
//!
//! Unresponsive peers still enter the routing table, tagged as such, so a
//! node that started before its neighbours were reachable keeps them. This
//! is the default.

use corelib::{Liveness, PeerId};

use crate::policy::{MembershipDecision, MembershipPolicy};

/// Join every peer with its observed liveness.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysJoin;

impl MembershipPolicy for AlwaysJoin {
    fn decide(&self, _peer: &PeerId, liveness: Liveness) -> MembershipDecision {
        MembershipDecision::Join(liveness)
    }

    fn name(&self) -> &'static str {
        "AlwaysJoin"
    }
}
