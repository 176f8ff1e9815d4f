//! Bootstrap outcomes.

use corelib::{Liveness, PeerId, PeerRecord};

/// What happened to one entry of the peer list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerOutcome {
    /// The locator did not parse; nothing was registered.
    Malformed { entry: String, error: corelib::Error },
    /// The locator named this node.
    Local { peer: PeerId },
    /// Registered and joined with `liveness`.
    Joined { record: PeerRecord, liveness: Liveness },
    /// Registered but kept out of the routing table by the policy.
    Rejected { record: PeerRecord, liveness: Liveness },
    /// Registered, but the engine refused the join.
    UpdateFailed {
        record: PeerRecord,
        liveness: Liveness,
        error: corelib::Error,
    },
}

impl PeerOutcome {
    pub fn peer(&self) -> Option<&PeerId> {
        match self {
            PeerOutcome::Malformed { .. } => None,
            PeerOutcome::Local { peer } => Some(peer),
            PeerOutcome::Joined { record, .. }
            | PeerOutcome::Rejected { record, .. }
            | PeerOutcome::UpdateFailed { record, .. } => Some(&record.identity),
        }
    }

    /// Probe result, for entries that were probed.
    pub fn liveness(&self) -> Option<Liveness> {
        match self {
            PeerOutcome::Joined { liveness, .. }
            | PeerOutcome::Rejected { liveness, .. }
            | PeerOutcome::UpdateFailed { liveness, .. } => Some(*liveness),
            _ => None,
        }
    }
}

/// Outcomes in peer-list order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    outcomes: Vec<PeerOutcome>,
}

impl BootstrapReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: PeerOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[PeerOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn joined(&self) -> usize {
        self.count(|o| matches!(o, PeerOutcome::Joined { .. }))
    }

    pub fn live(&self) -> usize {
        self.count(|o| o.liveness() == Some(Liveness::Live))
    }

    pub fn unresponsive(&self) -> usize {
        self.count(|o| o.liveness() == Some(Liveness::Unresponsive))
    }

    pub fn malformed(&self) -> usize {
        self.count(|o| matches!(o, PeerOutcome::Malformed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PeerOutcome::UpdateFailed { .. }))
    }

    fn count(&self, pred: impl Fn(&PeerOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{NodeAddress, Ttl};

    fn record(s: &str) -> PeerRecord {
        let address: NodeAddress = s.parse().unwrap();
        PeerRecord::new(address, Ttl::Permanent)
    }

    #[test]
    fn test_counters() {
        let mut report = BootstrapReport::new();
        report.push(PeerOutcome::Joined {
            record: record("/ip4/10.0.0.1/tcp/1/p2p/QmA"),
            liveness: Liveness::Live,
        });
        report.push(PeerOutcome::Joined {
            record: record("/ip4/10.0.0.2/tcp/1/p2p/QmB"),
            liveness: Liveness::Unresponsive,
        });
        report.push(PeerOutcome::Rejected {
            record: record("/ip4/10.0.0.3/tcp/1/p2p/QmC"),
            liveness: Liveness::Unresponsive,
        });
        report.push(PeerOutcome::Malformed {
            entry: "junk".into(),
            error: corelib::Error::InvalidPeerId("junk".into()),
        });

        assert_eq!(report.len(), 4);
        assert_eq!(report.joined(), 2);
        assert_eq!(report.live(), 1);
        assert_eq!(report.unresponsive(), 2);
        assert_eq!(report.malformed(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.outcomes()[3].peer(), None);
    }
}
