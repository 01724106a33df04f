use crate::types::AccountAddress;
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::debug;

/// Issues unique addresses and indexes live accounts.
///
/// A registry is an explicit object owned by the simulation context, not
/// process-global state. Addresses are derived as blake3(seed ‖ counter),
/// so a given seed reproduces the same address sequence run after run.
pub struct AccountRegistry {
    seed: [u8; 32],
    issued: RwLock<IssuedAccounts>,
}

#[derive(Default)]
struct IssuedAccounts {
    ordered: Vec<AccountAddress>,
    index: HashSet<AccountAddress>,
}

impl AccountRegistry {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            seed,
            issued: RwLock::new(IssuedAccounts::default()),
        }
    }

    /// Issue a fresh address and register it.
    pub async fn new_account(&self) -> AccountAddress {
        let mut issued = self.issued.write().await;
        let counter = issued.ordered.len() as u64;

        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed);
        hasher.update(&counter.to_le_bytes());
        let address = AccountAddress::from_bytes(*hasher.finalize().as_bytes());

        issued.ordered.push(address);
        issued.index.insert(address);

        debug!(address = %address, account_number = counter, "🆕 Account issued");
        address
    }

    pub async fn is_registered(&self, address: AccountAddress) -> bool {
        self.issued.read().await.index.contains(&address)
    }

    /// All issued addresses, in issue order.
    pub async fn accounts(&self) -> Vec<AccountAddress> {
        self.issued.read().await.ordered.clone()
    }

    pub async fn len(&self) -> usize {
        self.issued.read().await.ordered.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.issued.read().await.ordered.is_empty()
    }
}
