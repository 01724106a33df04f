pub mod error;
pub mod ledger;
pub mod payments;
pub mod registry;
pub mod storage;
pub mod types;

pub use error::{EconomicsError, Result};
pub use ledger::Ledger;
pub use payments::{PaymentRecord, PaymentSource, SeededPaymentStream};
pub use registry::AccountRegistry;
pub use storage::{LedgerStorage, MemoryStorage, TransferRecord};
pub use types::{AccountAddress, TingeAmount};
