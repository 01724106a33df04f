use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tinge_economics::{AccountAddress, TingeAmount};

/// A capacity-bounded fund reservoir with at most one downstream overflow
/// target. Buckets are accounts: their funds live in the ledger under
/// `address`, and `max_volume` is advisory for a bucket with no overflow
/// edge (excess is retained, not rejected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub address: AccountAddress,
    pub name: String,
    /// Withdrawals are disallowed before this instant.
    pub withdraw_begin: DateTime<Utc>,
    pub max_volume: TingeAmount,
    /// Single outgoing overflow edge; the network keeps the edge set
    /// acyclic.
    pub overflow: Option<AccountAddress>,
}

impl Bucket {
    pub fn new(
        address: AccountAddress,
        name: impl Into<String>,
        withdraw_begin: DateTime<Utc>,
        max_volume: TingeAmount,
    ) -> Self {
        Self {
            address,
            name: name.into(),
            withdraw_begin,
            max_volume,
            overflow: None,
        }
    }

    /// The amount above capacity for a given live balance.
    pub fn excess_over(&self, balance: TingeAmount) -> TingeAmount {
        balance.saturating_sub(self.max_volume)
    }
}
