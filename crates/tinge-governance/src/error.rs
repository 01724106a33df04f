use crate::types::{GovernancePhase, ProposalId};
use thiserror::Error;
use tinge_economics::{AccountAddress, EconomicsError};
use tinge_reservoir::ReservoirError;

/// Governance operation result type
pub type Result<T> = std::result::Result<T, GovernanceError>;

/// Governance errors. Each signals a precondition violation evaluated
/// before any mutation; none is retryable except `ConsensusNotReached`,
/// which leaves the poll open for further votes.
#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("Action {action} is not permitted in phase {phase:?}")]
    InvalidState {
        phase: GovernancePhase,
        action: &'static str,
    },

    #[error("Account {0} is not a founder")]
    AccountNotFounder(AccountAddress),

    #[error("No token is bound to this governance")]
    TokenNotSet,

    #[error("A token is already bound to this governance")]
    TokenAlreadySet,

    #[error("Poll cannot be finished")]
    PollCantBeFinished,

    #[error("Neither side crossed the consensus threshold")]
    ConsensusNotReached,

    #[error("Proposal cannot be executed")]
    CantExecuteProposal,

    #[error("Account {0} cannot vote on this poll")]
    AccountCantVote(AccountAddress),

    #[error("Unknown proposal: {0}")]
    UnknownProposal(ProposalId),

    #[error("Caller {caller} is not authorized for this operation")]
    Unauthorized { caller: AccountAddress },

    #[error("Economics error: {0}")]
    Economics(#[from] EconomicsError),

    #[error("Reservoir error: {0}")]
    Reservoir(#[from] ReservoirError),
}
