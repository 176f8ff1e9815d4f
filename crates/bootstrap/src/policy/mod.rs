//! Membership policy abstractions.
//!
//! After a peer has been registered and probed, a membership policy decides
//! whether it enters the routing table and under which liveness tag.
//!
//! - **AlwaysJoin**: every peer joins, tagged with its probe outcome
//! - **LiveOnly**: only peers that answered the probe join

pub mod always_join;
pub mod live_only;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use corelib::{Liveness, PeerId};

pub use always_join::AlwaysJoin;
pub use live_only::LiveOnly;

/// What to do with a probed peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MembershipDecision {
    /// Call `DhtEngine::update` with this tag.
    Join(Liveness),
    /// Leave the peer out of the routing table. It stays in the address book.
    Reject,
}

/// Trait for membership policies.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync) as a single policy is
/// shared by the bootstrap manager across tasks.
pub trait MembershipPolicy: Send + Sync + 'static {
    /// Decide whether `peer` joins the routing table.
    ///
    /// # Arguments
    /// * `peer` - Identity of the probed peer
    /// * `liveness` - Outcome of the probe
    fn decide(&self, peer: &PeerId, liveness: Liveness) -> MembershipDecision;

    /// Get the policy name (for logging/debugging).
    fn name(&self) -> &'static str;
}

/// Selectable policies, as named on the command line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PolicyKind {
    #[default]
    AlwaysJoin,
    LiveOnly,
}

impl PolicyKind {
    pub fn build(self) -> Arc<dyn MembershipPolicy> {
        match self {
            PolicyKind::AlwaysJoin => Arc::new(AlwaysJoin),
            PolicyKind::LiveOnly => Arc::new(LiveOnly),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PolicyKind::AlwaysJoin => "always-join",
            PolicyKind::LiveOnly => "live-only",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown membership policy `{0}` (expected always-join or live-only)")]
pub struct UnknownPolicy(pub String);

impl FromStr for PolicyKind {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always-join" => Ok(PolicyKind::AlwaysJoin),
            "live-only" => Ok(PolicyKind::LiveOnly),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_kind_parse() {
        assert_eq!("always-join".parse(), Ok(PolicyKind::AlwaysJoin));
        assert_eq!("live-only".parse(), Ok(PolicyKind::LiveOnly));
        assert!("sometimes".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn test_policy_kind_builds_named_policy() {
        assert_eq!(PolicyKind::AlwaysJoin.build().name(), "AlwaysJoin");
        assert_eq!(PolicyKind::LiveOnly.build().name(), "LiveOnly");
        assert_eq!(PolicyKind::default(), PolicyKind::AlwaysJoin);
    }
}
