use crate::error::{GovernanceError, Result};
use crate::types::{
    GovernanceConfig, GovernanceEffect, GovernancePhase, Poll, Proposal, ProposalId,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tinge_app_common::LifecycleState;
use tinge_economics::{AccountAddress, Ledger, TingeAmount};
use tinge_reservoir::ReservoirNetwork;
use tokio::sync::RwLock;
use tracing::{debug, info};

struct GovernanceState {
    phase: GovernancePhase,
    staked: HashMap<AccountAddress, TingeAmount>,
    proposals: Vec<Proposal>,
    buckets: Vec<AccountAddress>,
}

/// The governance contract: sole mint authority of the bound token, owner
/// of buckets, and the arbiter of proposals.
///
/// Stake equals cumulative tokens minted to a founder during genesis and
/// doubles as voting weight; it is never decreased by later transfers.
/// Finalize and execute serialize on the state lock, so no two callers
/// can finish or execute the same proposal concurrently.
pub struct Governance {
    address: AccountAddress,
    organization: String,
    config: GovernanceConfig,
    founders: HashSet<AccountAddress>,
    reservoir: Arc<ReservoirNetwork>,
    ledger: RwLock<Option<Arc<Ledger>>>,
    state: RwLock<GovernanceState>,
}

impl Governance {
    pub fn new(
        address: AccountAddress,
        organization: impl Into<String>,
        founders: Vec<AccountAddress>,
        config: GovernanceConfig,
        reservoir: Arc<ReservoirNetwork>,
    ) -> Self {
        assert!(config.validate(), "thresholds must be within 0–100");

        let organization = organization.into();
        info!(
            governance = %address,
            organization = %organization,
            founders = founders.len(),
            involvement_pct = config.min_involvement_pct,
            consensus_pct = config.min_consensus_pct,
            "🏛️ Governance created"
        );

        Self {
            address,
            organization,
            config,
            founders: founders.into_iter().collect(),
            reservoir,
            ledger: RwLock::new(None),
            state: RwLock::new(GovernanceState {
                phase: GovernancePhase::Genesis,
                staked: HashMap::new(),
                proposals: Vec::new(),
                buckets: Vec::new(),
            }),
        }
    }

    pub fn address(&self) -> AccountAddress {
        self.address
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub async fn phase(&self) -> GovernancePhase {
        self.state.read().await.phase
    }

    fn require_phase(
        phase: GovernancePhase,
        allowed: &[GovernancePhase],
        action: &'static str,
    ) -> Result<()> {
        if !allowed.contains(&phase) {
            return Err(GovernanceError::InvalidState { phase, action });
        }
        Ok(())
    }

    fn transition(state: &mut GovernanceState, next: GovernancePhase, action: &'static str) -> Result<()> {
        if !state.phase.can_transition_to(&next) {
            return Err(GovernanceError::InvalidState {
                phase: state.phase,
                action,
            });
        }
        info!(from = ?state.phase, to = ?next, "🏛️ Governance phase changed");
        state.phase = next;
        Ok(())
    }

    /// Bind the token and take its mint authority. Genesis only, once.
    pub async fn set_token(&self, token: Arc<Ledger>) -> Result<()> {
        let state = self.state.read().await;
        Self::require_phase(state.phase, &[GovernancePhase::Genesis], "set_token")?;
        drop(state);

        let mut ledger = self.ledger.write().await;
        if ledger.is_some() {
            return Err(GovernanceError::TokenAlreadySet);
        }

        token.bind_authority(self.address).await?;
        info!(governance = %self.address, token = token.name(), "🔑 Token bound");
        *ledger = Some(token);
        Ok(())
    }

    /// Mint `amount` to a founder and grow their stake by the same
    /// amount. Stake is permanently tied to historical mint volume.
    pub async fn mint_to_founder(
        &self,
        founder: AccountAddress,
        amount: TingeAmount,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        Self::require_phase(state.phase, &[GovernancePhase::Genesis], "mint_to_founder")?;

        if !self.founders.contains(&founder) {
            return Err(GovernanceError::AccountNotFounder(founder));
        }

        let ledger = self.ledger.read().await;
        let token = ledger.as_ref().ok_or(GovernanceError::TokenNotSet)?;
        token.mint(self.address, founder, amount).await?;

        let stake = state.staked.entry(founder).or_insert(TingeAmount::ZERO);
        *stake = stake.saturating_add(amount);

        info!(founder = %founder, amount = %amount, stake = %*stake, "💰 Founder minted and staked");
        Ok(())
    }

    pub async fn finish_genesis(&self) -> Result<()> {
        let mut state = self.state.write().await;
        Self::require_phase(state.phase, &[GovernancePhase::Genesis], "finish_genesis")?;
        Self::transition(&mut state, GovernancePhase::Private, "finish_genesis")
    }

    pub async fn stake_of(&self, account: AccountAddress) -> TingeAmount {
        self.state
            .read()
            .await
            .staked
            .get(&account)
            .copied()
            .unwrap_or(TingeAmount::ZERO)
    }

    pub async fn total_staked(&self) -> TingeAmount {
        let state = self.state.read().await;
        state
            .staked
            .values()
            .fold(TingeAmount::ZERO, |acc, s| acc.saturating_add(*s))
    }

    pub async fn total_stakers(&self) -> usize {
        self.state.read().await.staked.len()
    }

    fn is_staker(state: &GovernanceState, account: AccountAddress) -> bool {
        state
            .staked
            .get(&account)
            .map(|s| !s.is_zero())
            .unwrap_or(false)
    }

    /// Raise a proposal. Stakers only.
    pub async fn create_proposal(
        &self,
        caller: AccountAddress,
        description: impl Into<String>,
        effect: GovernanceEffect,
    ) -> Result<ProposalId> {
        let mut state = self.state.write().await;
        Self::require_phase(
            state.phase,
            &[GovernancePhase::Private, GovernancePhase::Public],
            "create_proposal",
        )?;
        if !Self::is_staker(&state, caller) {
            return Err(GovernanceError::Unauthorized { caller });
        }

        let id = ProposalId(state.proposals.len() as u64);
        let proposal = Proposal::new(id, description, caller, effect);

        info!(
            proposal = %id,
            proposer = %caller,
            description = %proposal.description,
            "📜 Proposal created"
        );
        state.proposals.push(proposal);
        Ok(id)
    }

    pub async fn proposal(&self, id: ProposalId) -> Result<Proposal> {
        let state = self.state.read().await;
        state
            .proposals
            .get(id.0 as usize)
            .cloned()
            .ok_or(GovernanceError::UnknownProposal(id))
    }

    pub async fn proposal_count(&self) -> usize {
        self.state.read().await.proposals.len()
    }

    /// Whether `account` may still vote on this poll: nonzero stake and
    /// no prior vote in either direction.
    pub async fn can_vote(&self, id: ProposalId, account: AccountAddress) -> Result<bool> {
        let state = self.state.read().await;
        let proposal = state
            .proposals
            .get(id.0 as usize)
            .ok_or(GovernanceError::UnknownProposal(id))?;
        Ok(Self::is_staker(&state, account) && !proposal.poll.has_voted(account))
    }

    pub async fn vote_for(&self, id: ProposalId, account: AccountAddress) -> Result<()> {
        self.vote(id, account, true).await
    }

    pub async fn vote_against(&self, id: ProposalId, account: AccountAddress) -> Result<()> {
        self.vote(id, account, false).await
    }

    async fn vote(&self, id: ProposalId, account: AccountAddress, in_favor: bool) -> Result<()> {
        let mut state = self.state.write().await;
        Self::require_phase(
            state.phase,
            &[GovernancePhase::Private, GovernancePhase::Public],
            "vote",
        )?;

        let eligible = Self::is_staker(&state, account);
        let proposal = state
            .proposals
            .get_mut(id.0 as usize)
            .ok_or(GovernanceError::UnknownProposal(id))?;

        if !eligible || proposal.poll.has_voted(account) {
            return Err(GovernanceError::AccountCantVote(account));
        }

        if in_favor {
            proposal.poll.votes_for.insert(account);
        } else {
            proposal.poll.votes_against.insert(account);
        }

        debug!(proposal = %id, voter = %account, in_favor, "🗳️ Vote cast");
        Ok(())
    }

    /// Quorum: the stake-weighted participation sum divided by the
    /// *count* of distinct stakers must exceed the involvement threshold.
    /// The divisor is intentionally the staker count, not the total
    /// staked amount — confirmed source behavior, preserved as-is.
    fn can_finish_poll(&self, state: &GovernanceState, poll: &Poll) -> bool {
        if state.staked.is_empty() {
            return false;
        }

        let voted_weight: u64 = poll
            .voters()
            .map(|v| {
                state
                    .staked
                    .get(v)
                    .copied()
                    .unwrap_or(TingeAmount::ZERO)
                    .to_units()
            })
            .sum();

        let stakers = state.staked.len() as f64;
        voted_weight as f64 / stakers > self.config.min_involvement_pct as f64 / 100.0
    }

    /// Decide the poll: whichever side's staked weight exceeds the
    /// consensus fraction of total stake wins; otherwise the poll stays
    /// open.
    fn compute_poll_result(&self, state: &GovernanceState, poll: &Poll) -> Result<bool> {
        let weight_of = |accounts: &HashSet<AccountAddress>| -> u64 {
            accounts
                .iter()
                .map(|v| {
                    state
                        .staked
                        .get(v)
                        .copied()
                        .unwrap_or(TingeAmount::ZERO)
                        .to_units()
                })
                .sum()
        };

        let total_staked: u64 = state.staked.values().map(|s| s.to_units()).sum();
        if total_staked == 0 {
            return Err(GovernanceError::ConsensusNotReached);
        }

        let threshold = self.config.min_consensus_pct as f64 / 100.0;
        let for_ratio = weight_of(&poll.votes_for) as f64 / total_staked as f64;
        let against_ratio = weight_of(&poll.votes_against) as f64 / total_staked as f64;

        if for_ratio > threshold {
            return Ok(true);
        }
        if against_ratio > threshold {
            return Ok(false);
        }
        Err(GovernanceError::ConsensusNotReached)
    }

    /// Finalize a poll. Fails `PollCantBeFinished` on an already-finished
    /// proposal or below quorum; propagates `ConsensusNotReached` with no
    /// mutation when neither side crosses the threshold.
    pub async fn finish_proposal_poll(
        &self,
        caller: AccountAddress,
        id: ProposalId,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        Self::require_phase(
            state.phase,
            &[GovernancePhase::Private, GovernancePhase::Public],
            "finish_proposal_poll",
        )?;
        if !Self::is_staker(&state, caller) {
            return Err(GovernanceError::Unauthorized { caller });
        }

        let proposal = state
            .proposals
            .get(id.0 as usize)
            .ok_or(GovernanceError::UnknownProposal(id))?;

        if proposal.finished || !self.can_finish_poll(&state, &proposal.poll) {
            return Err(GovernanceError::PollCantBeFinished);
        }

        let accepted = self.compute_poll_result(&state, &proposal.poll)?;

        let proposal = state
            .proposals
            .get_mut(id.0 as usize)
            .expect("looked up above");
        proposal.accepted = accepted;
        proposal.finished = true;

        info!(
            proposal = %id,
            accepted,
            votes_for = proposal.poll.votes_for.len(),
            votes_against = proposal.poll.votes_against.len(),
            "⚖️ Poll finished"
        );
        Ok(())
    }

    /// Apply an accepted proposal's effect, exactly once.
    pub async fn execute_proposal(&self, caller: AccountAddress, id: ProposalId) -> Result<()> {
        let mut state = self.state.write().await;
        Self::require_phase(
            state.phase,
            &[GovernancePhase::Private, GovernancePhase::Public],
            "execute_proposal",
        )?;
        if !Self::is_staker(&state, caller) {
            return Err(GovernanceError::Unauthorized { caller });
        }

        let proposal = state
            .proposals
            .get(id.0 as usize)
            .ok_or(GovernanceError::UnknownProposal(id))?;

        if !proposal.finished || !proposal.accepted || proposal.executed {
            return Err(GovernanceError::CantExecuteProposal);
        }

        let effect = proposal.effect.clone();
        self.apply_effect(&mut state, &effect).await?;

        let proposal = state
            .proposals
            .get_mut(id.0 as usize)
            .expect("looked up above");
        proposal.executed = true;

        info!(proposal = %id, ?effect, "✅ Proposal executed");
        Ok(())
    }

    async fn apply_effect(
        &self,
        state: &mut GovernanceState,
        effect: &GovernanceEffect,
    ) -> Result<()> {
        match effect {
            GovernanceEffect::AttachBucket { bucket } => {
                // Only buckets the reservoir knows can be owned
                self.reservoir.bucket(*bucket).await?;
                state.buckets.push(*bucket);
                info!(bucket = %bucket, "🪣 Bucket attached to governance");
                Ok(())
            }
            GovernanceEffect::SetOverflow { bucket, target } => {
                self.reservoir
                    .set_overflow(self.address, *bucket, *target)
                    .await?;
                Ok(())
            }
            GovernanceEffect::SetTapRate { tap, rate } => {
                self.reservoir.set_tap_rate(self.address, *tap, *rate).await?;
                Ok(())
            }
            GovernanceEffect::OpenToPublic => {
                Self::transition(state, GovernancePhase::Public, "open_to_public")
            }
            GovernanceEffect::Lock => Self::transition(state, GovernancePhase::Locked, "lock"),
        }
    }

    /// Take ownership of a bucket directly. Reserved to the governance
    /// capability itself; external change of ownership goes through an
    /// `AttachBucket` proposal.
    pub async fn add_bucket(&self, caller: AccountAddress, bucket: AccountAddress) -> Result<()> {
        let mut state = self.state.write().await;
        Self::require_phase(
            state.phase,
            &[GovernancePhase::Private, GovernancePhase::Public],
            "add_bucket",
        )?;
        if caller != self.address {
            return Err(GovernanceError::Unauthorized { caller });
        }

        self.apply_effect(&mut state, &GovernanceEffect::AttachBucket { bucket })
            .await
    }

    /// Addresses of buckets this governance owns, in attachment order.
    pub async fn buckets(&self) -> Vec<AccountAddress> {
        self.state.read().await.buckets.clone()
    }
}
