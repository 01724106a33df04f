use crate::types::TingeAmount;
use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One incoming payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub at: DateTime<Utc>,
    pub amount: TingeAmount,
}

/// Source of a synthetic payment stream: an ordered-by-time sequence of
/// positive amounts summing exactly to a requested target. Consumers feed
/// each record to `Ledger::mint`, typically flushing the receiving bucket
/// after each one.
pub trait PaymentSource: Send + Sync {
    fn payments(&self, target: TingeAmount) -> Vec<PaymentRecord>;
}

/// Seeded reference generator: random instants inside a window, random
/// amounts inside a range, the final payment clipped so the sum lands
/// exactly on target. A fixed seed reproduces the same stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeededPaymentStream {
    pub window: (DateTime<Utc>, DateTime<Utc>),
    pub amount_range: (u64, u64),
    pub seed: u64,
}

impl Default for SeededPaymentStream {
    fn default() -> Self {
        Self {
            window: (
                Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            ),
            amount_range: (100, 10_000),
            seed: 0,
        }
    }
}

impl PaymentSource for SeededPaymentStream {
    fn payments(&self, target: TingeAmount) -> Vec<PaymentRecord> {
        let (begin, end) = self.window;
        let (lo, hi) = self.amount_range;
        assert!(begin < end, "payment window must be non-empty");
        assert!(lo > 0 && lo <= hi, "amount range must be positive");

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut payments = Vec::new();
        let mut collected = TingeAmount::ZERO;

        while collected < target {
            let at = Utc
                .timestamp_opt(rng.gen_range(begin.timestamp()..=end.timestamp()), 0)
                .single()
                .expect("in-window timestamp");
            let mut amount = TingeAmount::from_units(rng.gen_range(lo..=hi));

            let remaining = target.saturating_sub(collected);
            if amount > remaining {
                amount = remaining;
            }

            payments.push(PaymentRecord { at, amount });
            collected = collected.saturating_add(amount);
        }

        payments.sort_by_key(|p| p.at);

        debug!(
            count = payments.len(),
            target = %target,
            seed = self.seed,
            "🌊 Payment stream generated"
        );
        payments
    }
}
