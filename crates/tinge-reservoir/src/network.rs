use crate::bucket::Bucket;
use crate::error::{ReservoirError, Result};
use crate::tap::{Tap, TapRate};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tinge_app_common::Clock;
use tinge_economics::{AccountAddress, AccountRegistry, EconomicsError, Ledger, TingeAmount};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// The hierarchical network of buckets and their taps.
///
/// All administrative operations (creating buckets and taps, rewiring
/// overflow edges, flushing, rate changes) require the configured
/// authority as caller; withdrawals require the tap's withdrawer. These
/// checks are evaluated against the passed-in caller identity on every
/// call.
pub struct ReservoirNetwork {
    ledger: Arc<Ledger>,
    registry: Arc<AccountRegistry>,
    clock: Arc<dyn Clock>,
    authority: AccountAddress,
    buckets: RwLock<HashMap<AccountAddress, Bucket>>,
    taps: RwLock<HashMap<AccountAddress, Tap>>,
}

impl ReservoirNetwork {
    pub fn new(
        ledger: Arc<Ledger>,
        registry: Arc<AccountRegistry>,
        clock: Arc<dyn Clock>,
        authority: AccountAddress,
    ) -> Self {
        Self {
            ledger,
            registry,
            clock,
            authority,
            buckets: RwLock::new(HashMap::new()),
            taps: RwLock::new(HashMap::new()),
        }
    }

    fn ensure_authority(&self, caller: AccountAddress) -> Result<()> {
        if caller != self.authority {
            return Err(ReservoirError::Unauthorized { caller });
        }
        Ok(())
    }

    pub async fn create_bucket(
        &self,
        caller: AccountAddress,
        name: impl Into<String>,
        withdraw_begin: DateTime<Utc>,
        max_volume: TingeAmount,
    ) -> Result<AccountAddress> {
        self.ensure_authority(caller)?;

        let address = self.registry.new_account().await;
        let bucket = Bucket::new(address, name, withdraw_begin, max_volume);

        info!(
            bucket = %address,
            name = %bucket.name,
            max_volume = %max_volume,
            "🪣 Bucket created"
        );
        self.buckets.write().await.insert(address, bucket);
        Ok(address)
    }

    pub async fn bucket(&self, address: AccountAddress) -> Result<Bucket> {
        self.buckets
            .read()
            .await
            .get(&address)
            .cloned()
            .ok_or(ReservoirError::UnknownBucket(address))
    }

    pub async fn bucket_balance(&self, address: AccountAddress) -> Result<TingeAmount> {
        // Existence check keeps the error typed as UnknownBucket rather
        // than silently reporting a zero ledger balance.
        let _ = self.bucket(address).await?;
        Ok(self.ledger.balance_of(address).await?)
    }

    /// Rewire the single outgoing overflow edge of `bucket` to `target`.
    /// Rejects any edge that would close a cycle.
    pub async fn set_overflow(
        &self,
        caller: AccountAddress,
        bucket: AccountAddress,
        target: AccountAddress,
    ) -> Result<()> {
        self.ensure_authority(caller)?;

        let mut buckets = self.buckets.write().await;
        if !buckets.contains_key(&bucket) {
            return Err(ReservoirError::UnknownBucket(bucket));
        }
        if !buckets.contains_key(&target) {
            return Err(ReservoirError::UnknownBucket(target));
        }

        // Walk downstream from the proposed target; reaching `bucket`
        // (including target == bucket) would close a cycle.
        let mut cursor = Some(target);
        while let Some(current) = cursor {
            if current == bucket {
                return Err(ReservoirError::CycleDetected { bucket });
            }
            cursor = buckets.get(&current).and_then(|b| b.overflow);
        }

        let entry = buckets.get_mut(&bucket).expect("checked above");
        entry.overflow = Some(target);

        info!(bucket = %bucket, target = %target, "🔗 Overflow edge set");
        Ok(())
    }

    /// Push excess over capacity downstream along the overflow chain. A
    /// bucket with no overflow target retains its excess. Idempotent:
    /// with no intervening mint, a second flush moves nothing.
    pub async fn flush(&self, caller: AccountAddress, bucket: AccountAddress) -> Result<()> {
        self.ensure_authority(caller)?;

        let buckets = self.buckets.read().await;
        let mut current = buckets
            .get(&bucket)
            .ok_or(ReservoirError::UnknownBucket(bucket))?;

        loop {
            let balance = self.ledger.balance_of(current.address).await?;
            let excess = current.excess_over(balance);

            let Some(target) = current.overflow else {
                break;
            };

            if !excess.is_zero() {
                self.ledger.transfer(current.address, target, excess).await?;
                debug!(
                    from = %current.address,
                    to = %target,
                    amount = %excess,
                    "🌊 Excess flushed downstream"
                );
            }

            // Overflow edges only ever point at registered buckets.
            current = buckets.get(&target).ok_or(ReservoirError::UnknownBucket(target))?;
        }

        Ok(())
    }

    /// Withdraw from a bucket. Only a tap bound to this bucket may call;
    /// fails before `withdraw_begin` and on insufficient bucket balance,
    /// with no state change either way.
    pub async fn withdraw(
        &self,
        caller: AccountAddress,
        bucket: AccountAddress,
        to: AccountAddress,
        amount: TingeAmount,
    ) -> Result<()> {
        {
            let taps = self.taps.read().await;
            let authorized = taps
                .get(&caller)
                .map(|tap| tap.bucket == bucket)
                .unwrap_or(false);
            if !authorized {
                return Err(ReservoirError::Unauthorized { caller });
            }
        }
        self.withdraw_inner(bucket, to, amount).await
    }

    async fn withdraw_inner(
        &self,
        bucket: AccountAddress,
        to: AccountAddress,
        amount: TingeAmount,
    ) -> Result<()> {
        let entry = self.bucket(bucket).await?;

        let now = self.clock.now();
        if now < entry.withdraw_begin {
            return Err(ReservoirError::WithdrawNotOpen {
                opens_at: entry.withdraw_begin,
            });
        }

        let balance = self.ledger.balance_of(bucket).await?;
        if balance < amount {
            return Err(ReservoirError::Economics(
                EconomicsError::InsufficientBalance {
                    address: bucket,
                    balance,
                    requested: amount,
                },
            ));
        }

        self.ledger.transfer(bucket, to, amount).await?;
        info!(bucket = %bucket, to = %to, amount = %amount, "💸 Bucket withdrawal");
        Ok(())
    }

    pub async fn create_tap(
        &self,
        caller: AccountAddress,
        withdrawer: AccountAddress,
        bucket: AccountAddress,
    ) -> Result<AccountAddress> {
        self.ensure_authority(caller)?;

        if !self.buckets.read().await.contains_key(&bucket) {
            return Err(ReservoirError::UnknownBucket(bucket));
        }

        let address = self.registry.new_account().await;
        let tap = Tap::new(address, withdrawer, bucket, self.clock.now());

        info!(tap = %address, withdrawer = %withdrawer, bucket = %bucket, "🚰 Tap created");
        self.taps.write().await.insert(address, tap);
        Ok(address)
    }

    pub async fn tap(&self, address: AccountAddress) -> Result<Tap> {
        self.taps
            .read()
            .await
            .get(&address)
            .cloned()
            .ok_or(ReservoirError::UnknownTap(address))
    }

    /// Install a new rate. Accrual at the old rate is folded in first, so
    /// a rate change never meters past time at the new rate. Closing
    /// forfeits unclaimed credit.
    pub async fn set_tap_rate(
        &self,
        caller: AccountAddress,
        tap: AccountAddress,
        rate: TapRate,
    ) -> Result<()> {
        self.ensure_authority(caller)?;

        let mut taps = self.taps.write().await;
        let entry = taps.get_mut(&tap).ok_or(ReservoirError::UnknownTap(tap))?;

        entry.update(self.clock.now());
        if rate.is_closed() {
            entry.accrued = TingeAmount::ZERO;
        }
        let previous = entry.rate;
        entry.rate = rate;

        info!(tap = %tap, ?previous, new = ?rate, "🚰 Tap rate changed");
        Ok(())
    }

    pub async fn close_tap(&self, caller: AccountAddress, tap: AccountAddress) -> Result<()> {
        self.set_tap_rate(caller, tap, TapRate::Closed).await
    }

    pub async fn open_tap(&self, caller: AccountAddress, tap: AccountAddress) -> Result<()> {
        self.set_tap_rate(caller, tap, TapRate::Open).await
    }

    /// Amount currently withdrawable through the tap: accrued credit for
    /// Metered, the bucket's live balance for Open, zero for Closed.
    pub async fn available(&self, tap: AccountAddress) -> Result<TingeAmount> {
        let mut taps = self.taps.write().await;
        let entry = taps.get_mut(&tap).ok_or(ReservoirError::UnknownTap(tap))?;
        entry.update(self.clock.now());

        match entry.rate {
            TapRate::Closed => Ok(TingeAmount::ZERO),
            TapRate::Metered(_) => Ok(entry.accrued),
            TapRate::Open => {
                let bucket = entry.bucket;
                drop(taps);
                self.bucket_balance(bucket).await
            }
        }
    }

    /// Withdraw `amount` through the tap to its withdrawer. The bucket
    /// transfer happens first and the accrued credit is debited only on
    /// success, so a failed withdrawal changes nothing.
    pub async fn tap_withdraw(
        &self,
        caller: AccountAddress,
        tap: AccountAddress,
        amount: TingeAmount,
    ) -> Result<()> {
        let mut taps = self.taps.write().await;
        let entry = taps.get_mut(&tap).ok_or(ReservoirError::UnknownTap(tap))?;

        if caller != entry.withdrawer {
            return Err(ReservoirError::Unauthorized { caller });
        }

        match entry.rate {
            TapRate::Closed => Err(ReservoirError::TapClosed),
            TapRate::Open => {
                let (bucket, withdrawer) = (entry.bucket, entry.withdrawer);
                drop(taps);
                self.withdraw_inner(bucket, withdrawer, amount).await
            }
            TapRate::Metered(_) => {
                entry.update(self.clock.now());
                if amount > entry.accrued {
                    return Err(ReservoirError::RateLimited {
                        available: entry.accrued,
                        requested: amount,
                    });
                }

                self.withdraw_inner(entry.bucket, entry.withdrawer, amount)
                    .await?;
                entry.accrued = entry.accrued.saturating_sub(amount);

                debug!(
                    tap = %tap,
                    amount = %amount,
                    remaining_credit = %entry.accrued,
                    "🚰 Metered withdrawal"
                );
                Ok(())
            }
        }
    }

    /// Withdraw everything currently available. Zero available reports
    /// `NothingToWithdraw` rather than silently succeeding.
    pub async fn tap_withdraw_all(
        &self,
        caller: AccountAddress,
        tap: AccountAddress,
    ) -> Result<TingeAmount> {
        let amount = self.available(tap).await?;
        if amount.is_zero() {
            return Err(ReservoirError::NothingToWithdraw);
        }
        self.tap_withdraw(caller, tap, amount).await?;
        Ok(amount)
    }
}
