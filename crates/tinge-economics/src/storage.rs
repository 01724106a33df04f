use crate::error::Result;
use crate::types::{AccountAddress, TingeAmount};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

/// Completed transfer, kept for inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: AccountAddress,
    pub to: AccountAddress,
    pub amount: TingeAmount,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
}

type BalanceMap = HashMap<AccountAddress, TingeAmount>;

/// Balance store behind the ledger. The in-memory backend is the only one
/// the model needs; the trait keeps the ledger testable against other
/// backends.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    async fn get_balance(&self, address: AccountAddress) -> Result<TingeAmount>;
    async fn set_balance(&self, address: AccountAddress, balance: TingeAmount) -> Result<()>;
    async fn all_accounts(&self) -> Result<Vec<AccountAddress>>;

    async fn begin_transaction(&self) -> Result<()>;
    async fn commit_transaction(&self) -> Result<()>;
    async fn rollback_transaction(&self) -> Result<()>;

    async fn record_transfer(&self, record: TransferRecord) -> Result<()>;
    async fn transfer_history(&self, address: AccountAddress) -> Result<Vec<TransferRecord>>;
}

pub struct MemoryStorage {
    balances: RwLock<BalanceMap>,
    transaction_backup: RwLock<Option<BalanceMap>>,
    history: RwLock<Vec<TransferRecord>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
            transaction_backup: RwLock::new(None),
            history: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn get_balance(&self, address: AccountAddress) -> Result<TingeAmount> {
        let balances = self.balances.read().await;
        Ok(balances.get(&address).copied().unwrap_or(TingeAmount::ZERO))
    }

    async fn set_balance(&self, address: AccountAddress, balance: TingeAmount) -> Result<()> {
        let mut balances = self.balances.write().await;
        if balance == TingeAmount::ZERO {
            balances.remove(&address);
        } else {
            balances.insert(address, balance);
        }
        Ok(())
    }

    async fn all_accounts(&self) -> Result<Vec<AccountAddress>> {
        let balances = self.balances.read().await;
        Ok(balances.keys().copied().collect())
    }

    async fn begin_transaction(&self) -> Result<()> {
        let balances = self.balances.read().await;
        let mut backup = self.transaction_backup.write().await;
        *backup = Some(balances.clone());
        Ok(())
    }

    async fn commit_transaction(&self) -> Result<()> {
        let mut backup = self.transaction_backup.write().await;
        *backup = None;
        Ok(())
    }

    async fn rollback_transaction(&self) -> Result<()> {
        let mut backup = self.transaction_backup.write().await;
        if let Some(snapshot) = backup.take() {
            let mut balances = self.balances.write().await;
            *balances = snapshot;
            info!(storage_type = "memory", "❌ Transaction rolled back (snapshot restored)");
        }
        Ok(())
    }

    async fn record_transfer(&self, record: TransferRecord) -> Result<()> {
        let mut history = self.history.write().await;
        history.push(record);
        Ok(())
    }

    async fn transfer_history(&self, address: AccountAddress) -> Result<Vec<TransferRecord>> {
        let history = self.history.read().await;
        Ok(history
            .iter()
            .filter(|tx| tx.from == address || tx.to == address)
            .cloned()
            .collect())
    }
}
