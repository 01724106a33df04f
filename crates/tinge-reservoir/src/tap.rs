use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tinge_economics::{AccountAddress, TingeAmount};

/// Withdrawal metering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TapRate {
    /// No withdrawals permitted; accrued credit pinned at zero.
    Closed,
    /// Credit accrues at this amount per second of elapsed time.
    Metered(TingeAmount),
    /// Unbounded; limited only by the bucket's live balance.
    Open,
}

impl TapRate {
    pub fn is_closed(&self) -> bool {
        matches!(self, TapRate::Closed)
    }
}

/// A rate-limited withdrawal channel attached to a bucket.
///
/// Accrual is lazy: `accrued` is only meaningful after folding in the time
/// elapsed since `last_update`, which the network does before every read
/// or mutation. `accrued` never goes negative; it grows via elapsed-time
/// accrual or carried remainder and shrinks only on successful withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tap {
    pub address: AccountAddress,
    pub withdrawer: AccountAddress,
    pub bucket: AccountAddress,
    pub rate: TapRate,
    pub last_update: DateTime<Utc>,
    pub accrued: TingeAmount,
}

impl Tap {
    pub fn new(
        address: AccountAddress,
        withdrawer: AccountAddress,
        bucket: AccountAddress,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            address,
            withdrawer,
            bucket,
            rate: TapRate::Closed,
            last_update: created_at,
            accrued: TingeAmount::ZERO,
        }
    }

    /// Fold elapsed time into the accrued credit. Only Metered taps
    /// accrue; the update always advances `last_update` so a later rate
    /// change cannot retroactively meter idle time.
    pub fn update(&mut self, now: DateTime<Utc>) {
        if let TapRate::Metered(per_second) = self.rate {
            let elapsed = (now - self.last_update).num_seconds().max(0) as u64;
            self.accrued = self
                .accrued
                .saturating_add(per_second.saturating_mul(elapsed));
        }
        if now > self.last_update {
            self.last_update = now;
        }
    }

    pub fn is_active(&self) -> bool {
        !self.rate.is_closed()
    }
}
