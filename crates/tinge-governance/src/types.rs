use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tinge_app_common::LifecycleState;
use tinge_economics::AccountAddress;
use tinge_reservoir::TapRate;

/// Governance phase machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernancePhase {
    /// Founders are funded and the token is bound.
    Genesis,
    /// Stakeholders govern among themselves.
    Private,
    /// Open membership (same action surface as Private).
    Public,
    /// Terminal: reads only, no further mutation.
    Locked,
}

impl LifecycleState for GovernancePhase {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Locked)
    }

    fn can_transition_to(&self, next: &Self) -> bool {
        use GovernancePhase::*;
        match (self, next) {
            (Genesis, Private) => true,
            (Private, Public) => true,
            (Private, Locked) | (Public, Locked) => true,
            _ => false,
        }
    }
}


/// What an accepted proposal does when executed. A closed set of typed
/// commands, dispatched by variant; nothing free-form ever runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernanceEffect {
    /// Take ownership of an existing bucket.
    AttachBucket { bucket: AccountAddress },
    /// Rewire a bucket's overflow edge.
    SetOverflow {
        bucket: AccountAddress,
        target: AccountAddress,
    },
    /// Change a tap's metering mode.
    SetTapRate { tap: AccountAddress, rate: TapRate },
    /// Move the governance from Private to Public.
    OpenToPublic,
    /// Lock the governance permanently.
    Lock,
}

/// Index of a proposal in the governance's append-only sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProposalId(pub u64);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Weighted yes/no tally. An account ends up in at most one of the two
/// sets, ever: no vote change, no double vote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Poll {
    pub votes_for: HashSet<AccountAddress>,
    pub votes_against: HashSet<AccountAddress>,
}

impl Poll {
    pub fn has_voted(&self, account: AccountAddress) -> bool {
        self.votes_for.contains(&account) || self.votes_against.contains(&account)
    }

    pub fn total_votes(&self) -> usize {
        self.votes_for.len() + self.votes_against.len()
    }

    /// All voters, either direction. The two sets are disjoint.
    pub fn voters(&self) -> impl Iterator<Item = &AccountAddress> {
        self.votes_for.iter().chain(self.votes_against.iter())
    }
}

/// A proposal and its poll. The three flags are set exactly once, in
/// order: finished (with accepted decided), then executed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub description: String,
    pub proposer: AccountAddress,
    pub effect: GovernanceEffect,
    pub poll: Poll,
    pub accepted: bool,
    pub finished: bool,
    pub executed: bool,
}

impl Proposal {
    pub fn new(
        id: ProposalId,
        description: impl Into<String>,
        proposer: AccountAddress,
        effect: GovernanceEffect,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            proposer,
            effect,
            poll: Poll::default(),
            accepted: false,
            finished: false,
            executed: false,
        }
    }
}

/// Consensus thresholds, both in whole percent (0–100).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Minimum weighted-voter participation before a poll may be
    /// finalized.
    pub min_involvement_pct: u8,
    /// Minimum weighted-majority fraction for a decided outcome.
    pub min_consensus_pct: u8,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            min_involvement_pct: 50,
            min_consensus_pct: 50,
        }
    }
}

impl GovernanceConfig {
    pub fn validate(&self) -> bool {
        self.min_involvement_pct <= 100 && self.min_consensus_pct <= 100
    }
}
