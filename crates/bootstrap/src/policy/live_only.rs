//! Join only peers that answered the probe.

use corelib::{Liveness, PeerId};

use crate::policy::{MembershipDecision, MembershipPolicy};

#[derive(Debug, Clone, Copy, Default)]
pub struct LiveOnly;

impl MembershipPolicy for LiveOnly {
    fn decide(&self, _peer: &PeerId, liveness: Liveness) -> MembershipDecision {
        match liveness {
            Liveness::Live => MembershipDecision::Join(Liveness::Live),
            Liveness::Unresponsive => MembershipDecision::Reject,
        }
    }

    fn name(&self) -> &'static str {
        "LiveOnly"
    }
}
