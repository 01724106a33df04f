use crate::types::{AccountAddress, TingeAmount};
use thiserror::Error;

/// Economics operation result type
pub type Result<T> = std::result::Result<T, EconomicsError>;

#[derive(Debug, Error)]
pub enum EconomicsError {
    #[error("Insufficient balance for {address}: has {balance}, needs {requested}")]
    InsufficientBalance {
        address: AccountAddress,
        balance: TingeAmount,
        requested: TingeAmount,
    },

    #[error("Caller {caller} is not authorized to mint")]
    Unauthorized { caller: AccountAddress },

    #[error("Mint authority is already bound")]
    AuthorityAlreadyBound,

    #[error("Mint authority is not bound")]
    AuthorityNotBound,

    #[error("Total supply would overflow")]
    SupplyOverflow,

    #[error("Balance would overflow for {address}")]
    BalanceOverflow { address: AccountAddress },
}
