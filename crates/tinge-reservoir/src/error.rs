use chrono::{DateTime, Utc};
use thiserror::Error;
use tinge_economics::{AccountAddress, EconomicsError, TingeAmount};

/// Reservoir operation result type
pub type Result<T> = std::result::Result<T, ReservoirError>;

#[derive(Debug, Error)]
pub enum ReservoirError {
    #[error("Unknown bucket: {0}")]
    UnknownBucket(AccountAddress),

    #[error("Unknown tap: {0}")]
    UnknownTap(AccountAddress),

    #[error("Caller {caller} is not authorized for this operation")]
    Unauthorized { caller: AccountAddress },

    #[error("Overflow edge from {bucket} would close a cycle")]
    CycleDetected { bucket: AccountAddress },

    #[error("Withdrawals from this bucket open at {opens_at}")]
    WithdrawNotOpen { opens_at: DateTime<Utc> },

    #[error("Tap is closed")]
    TapClosed,

    #[error("Rate limit: {available} available, {requested} requested")]
    RateLimited {
        available: TingeAmount,
        requested: TingeAmount,
    },

    #[error("Nothing to withdraw")]
    NothingToWithdraw,

    #[error("Economics error: {0}")]
    Economics(#[from] EconomicsError),
}
