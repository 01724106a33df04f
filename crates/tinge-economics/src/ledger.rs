use crate::error::{EconomicsError, Result};
use crate::storage::{LedgerStorage, TransferRecord};
use crate::types::{AccountAddress, TingeAmount};
use std::sync::Arc;
use tinge_app_common::Clock;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Fungible-token ledger: per-address balances plus a total-supply scalar.
///
/// Invariant: `total_supply == Σ balances` after every operation. Minting
/// is gated on a once-bound authority address; transfers are open but
/// conserving.
pub struct Ledger {
    name: String,
    storage: Arc<dyn LedgerStorage>,
    clock: Arc<dyn Clock>,
    supply: RwLock<TingeAmount>,
    authority: RwLock<Option<AccountAddress>>,
}

impl Ledger {
    pub fn new(name: impl Into<String>, storage: Arc<dyn LedgerStorage>, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            storage,
            clock,
            supply: RwLock::new(TingeAmount::ZERO),
            authority: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bind the minting authority. One-shot: rebinding fails.
    pub async fn bind_authority(&self, authority: AccountAddress) -> Result<()> {
        let mut slot = self.authority.write().await;
        if slot.is_some() {
            return Err(EconomicsError::AuthorityAlreadyBound);
        }
        *slot = Some(authority);
        info!(token = %self.name, authority = %authority, "🔑 Mint authority bound");
        Ok(())
    }

    /// Create `amount` new tokens for `to`. Only the bound authority may
    /// mint; a zero amount is a legal no-op.
    pub async fn mint(
        &self,
        caller: AccountAddress,
        to: AccountAddress,
        amount: TingeAmount,
    ) -> Result<()> {
        {
            let authority = self.authority.read().await;
            match *authority {
                Some(bound) if bound == caller => {}
                Some(_) => return Err(EconomicsError::Unauthorized { caller }),
                None => return Err(EconomicsError::AuthorityNotBound),
            }
        }

        if amount.is_zero() {
            return Ok(());
        }

        let mut supply = self.supply.write().await;
        let new_supply = supply
            .checked_add(amount)
            .ok_or(EconomicsError::SupplyOverflow)?;

        let balance = self.storage.get_balance(to).await?;
        let new_balance = balance
            .checked_add(amount)
            .ok_or(EconomicsError::BalanceOverflow { address: to })?;

        self.storage.set_balance(to, new_balance).await?;
        *supply = new_supply;

        info!(
            token = %self.name,
            to = %to,
            amount = %amount,
            total_supply = %new_supply,
            "💰 Tokens minted"
        );
        Ok(())
    }

    /// Move `amount` from `from` to `to`. Fails with `InsufficientBalance`
    /// and no state change when the sender holds less than `amount`; zero
    /// amounts and self-transfers are legal no-ops.
    pub async fn transfer(
        &self,
        from: AccountAddress,
        to: AccountAddress,
        amount: TingeAmount,
    ) -> Result<()> {
        // Serialize transfers on the supply lock so concurrent callers
        // cannot interleave between the sufficiency check and the writes.
        let _supply = self.supply.write().await;

        let from_balance = self.storage.get_balance(from).await?;
        if from_balance < amount {
            return Err(EconomicsError::InsufficientBalance {
                address: from,
                balance: from_balance,
                requested: amount,
            });
        }

        if amount.is_zero() || from == to {
            return Ok(());
        }

        self.storage.begin_transaction().await?;
        match self.transfer_inner(from, to, amount, from_balance).await {
            Ok(tx_hash) => {
                self.storage.commit_transaction().await?;
                debug!(
                    token = %self.name,
                    from = %from,
                    to = %to,
                    amount = %amount,
                    tx_hash = %tx_hash,
                    "💸 Transfer committed"
                );
                Ok(())
            }
            Err(e) => {
                self.storage.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    async fn transfer_inner(
        &self,
        from: AccountAddress,
        to: AccountAddress,
        amount: TingeAmount,
        from_balance: TingeAmount,
    ) -> Result<String> {
        let to_balance = self.storage.get_balance(to).await?;
        let new_to_balance = to_balance
            .checked_add(amount)
            .ok_or(EconomicsError::BalanceOverflow { address: to })?;

        self.storage
            .set_balance(from, from_balance.saturating_sub(amount))
            .await?;
        self.storage.set_balance(to, new_to_balance).await?;

        let timestamp = self.clock.now();
        let mut hasher = blake3::Hasher::new();
        hasher.update(from.as_bytes());
        hasher.update(to.as_bytes());
        hasher.update(&amount.to_units().to_le_bytes());
        hasher.update(&timestamp.timestamp().to_le_bytes());
        let tx_hash = hex::encode(hasher.finalize().as_bytes());

        self.storage
            .record_transfer(TransferRecord {
                from,
                to,
                amount,
                timestamp,
                tx_hash: tx_hash.clone(),
            })
            .await?;

        Ok(tx_hash)
    }

    /// Balance of `address`; zero for accounts never credited.
    pub async fn balance_of(&self, address: AccountAddress) -> Result<TingeAmount> {
        self.storage.get_balance(address).await
    }

    pub async fn total_supply(&self) -> TingeAmount {
        *self.supply.read().await
    }

    pub async fn transfer_history(&self, address: AccountAddress) -> Result<Vec<TransferRecord>> {
        self.storage.transfer_history(address).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use chrono::TimeZone;
    use tinge_app_common::SimClock;

    fn test_ledger() -> Ledger {
        let start = chrono::Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap();
        Ledger::new(
            "TNG",
            Arc::new(MemoryStorage::new()),
            Arc::new(SimClock::new(start)),
        )
    }

    fn addr(byte: u8) -> AccountAddress {
        AccountAddress::from_bytes([byte; 32])
    }

    #[tokio::test]
    async fn test_mint_requires_authority() {
        let ledger = test_ledger();
        let gov = addr(1);
        let user = addr(2);

        // Unbound authority rejects everything
        assert!(matches!(
            ledger.mint(gov, user, TingeAmount::from_units(10)).await,
            Err(EconomicsError::AuthorityNotBound)
        ));

        ledger.bind_authority(gov).await.unwrap();
        ledger
            .mint(gov, user, TingeAmount::from_units(1000))
            .await
            .unwrap();
        assert_eq!(
            ledger.balance_of(user).await.unwrap(),
            TingeAmount::from_units(1000)
        );
        assert_eq!(ledger.total_supply().await, TingeAmount::from_units(1000));

        // Non-authority caller is rejected, supply untouched
        assert!(matches!(
            ledger.mint(user, user, TingeAmount::from_units(1)).await,
            Err(EconomicsError::Unauthorized { .. })
        ));
        assert_eq!(ledger.total_supply().await, TingeAmount::from_units(1000));

        // Rebinding fails
        assert!(matches!(
            ledger.bind_authority(user).await,
            Err(EconomicsError::AuthorityAlreadyBound)
        ));
    }

    #[tokio::test]
    async fn test_transfer_conserves_supply() {
        let ledger = test_ledger();
        let gov = addr(1);
        let (a, b) = (addr(2), addr(3));

        ledger.bind_authority(gov).await.unwrap();
        ledger.mint(gov, a, TingeAmount::from_units(500)).await.unwrap();

        ledger
            .transfer(a, b, TingeAmount::from_units(120))
            .await
            .unwrap();
        assert_eq!(
            ledger.balance_of(a).await.unwrap(),
            TingeAmount::from_units(380)
        );
        assert_eq!(
            ledger.balance_of(b).await.unwrap(),
            TingeAmount::from_units(120)
        );
        assert_eq!(ledger.total_supply().await, TingeAmount::from_units(500));
    }

    #[tokio::test]
    async fn test_insufficient_balance_leaves_state_unchanged() {
        let ledger = test_ledger();
        let gov = addr(1);
        let (a, b) = (addr(2), addr(3));

        ledger.bind_authority(gov).await.unwrap();
        ledger.mint(gov, a, TingeAmount::from_units(50)).await.unwrap();

        let err = ledger
            .transfer(a, b, TingeAmount::from_units(100))
            .await
            .unwrap_err();
        assert!(matches!(err, EconomicsError::InsufficientBalance { .. }));

        assert_eq!(
            ledger.balance_of(a).await.unwrap(),
            TingeAmount::from_units(50)
        );
        assert_eq!(ledger.balance_of(b).await.unwrap(), TingeAmount::ZERO);
    }

    #[tokio::test]
    async fn test_zero_and_self_transfers_are_noops() {
        let ledger = test_ledger();
        let gov = addr(1);
        let a = addr(2);

        ledger.bind_authority(gov).await.unwrap();
        ledger.mint(gov, a, TingeAmount::from_units(10)).await.unwrap();

        ledger.transfer(a, addr(3), TingeAmount::ZERO).await.unwrap();
        ledger.transfer(a, a, TingeAmount::from_units(5)).await.unwrap();
        assert_eq!(
            ledger.balance_of(a).await.unwrap(),
            TingeAmount::from_units(10)
        );

        // Self-transfer still requires a sufficient balance
        assert!(ledger.transfer(a, a, TingeAmount::from_units(11)).await.is_err());
    }

    #[tokio::test]
    async fn test_transfer_history_recorded() {
        let ledger = test_ledger();
        let gov = addr(1);
        let (a, b) = (addr(2), addr(3));

        ledger.bind_authority(gov).await.unwrap();
        ledger.mint(gov, a, TingeAmount::from_units(100)).await.unwrap();
        ledger.transfer(a, b, TingeAmount::from_units(40)).await.unwrap();

        let history = ledger.transfer_history(b).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, TingeAmount::from_units(40));
        assert_eq!(history[0].from, a);
    }
}
