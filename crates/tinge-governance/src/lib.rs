/*!
# Tinge Governance

Phase-gated governance for the tinge token-economy model:

- Genesis funding of founders, with stake tied to minted volume
- Stake-weighted polls with involvement (quorum) and consensus thresholds
- A closed, typed set of governance effects executed on acceptance
- Ownership of reservoir buckets and authority over their taps

## Phases

`Genesis → Private → Public`, with `Locked` terminal from either governing
phase. Genesis binds the token and funds founders; Private/Public carry
the proposal surface; Locked permits reads only.

## Consensus arithmetic

Quorum divides the stake-weighted participation sum by the *count* of
distinct stakers (not by total staked amount); the decision step compares
each side's staked weight against the consensus fraction of total stake.
Both are preserved exactly from the reference model.

## Example

```no_run
use std::sync::Arc;
use tinge_app_common::{Clock, SimClock};
use tinge_economics::{AccountRegistry, Ledger, MemoryStorage, TingeAmount};
use tinge_governance::{Governance, GovernanceConfig};
use tinge_reservoir::ReservoirNetwork;

# async fn demo() -> tinge_governance::Result<()> {
let clock = Arc::new(SimClock::new(chrono::Utc::now()));
let registry = Arc::new(AccountRegistry::new([0; 32]));
let ledger = Arc::new(Ledger::new(
    "TNG",
    Arc::new(MemoryStorage::new()),
    clock.clone() as Arc<dyn Clock>,
));

let founder = registry.new_account().await;
let gov_address = registry.new_account().await;
let reservoir = Arc::new(ReservoirNetwork::new(
    ledger.clone(),
    registry.clone(),
    clock.clone() as Arc<dyn Clock>,
    gov_address,
));

let governance = Governance::new(
    gov_address,
    "tinges.org",
    vec![founder],
    GovernanceConfig::default(),
    reservoir,
);

governance.set_token(ledger).await?;
governance.mint_to_founder(founder, TingeAmount::from_units(1000)).await?;
governance.finish_genesis().await?;
# Ok(())
# }
```
*/

pub mod error;
pub mod governance;
pub mod types;

pub use error::{GovernanceError, Result};
pub use governance::Governance;
pub use types::{
    GovernanceConfig, GovernanceEffect, GovernancePhase, Poll, Proposal, ProposalId,
};
