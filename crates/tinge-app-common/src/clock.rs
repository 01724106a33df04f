use chrono::{DateTime, Duration, Utc};
use std::sync::RwLock;
use tracing::warn;

/// Source of the current instant.
///
/// Every time read in the model goes through a `Clock` so that simulation
/// runs are deterministic and repeatable. Production wiring injects
/// [`SystemClock`]; tests and simulations inject [`SimClock`] and drive it
/// explicitly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Settable logical clock. Monotonic: attempts to move time backwards are
/// clamped to the current instant.
pub struct SimClock {
    now: RwLock<DateTime<Utc>>,
}

impl SimClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        let mut now = self.now.write().expect("clock lock poisoned");
        if instant < *now {
            warn!(
                requested = %instant,
                current = %*now,
                "⏰ Refusing to move simulated time backwards"
            );
            return;
        }
        *now = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().expect("clock lock poisoned");
        *now += by;
    }
}

impl Clock for SimClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().expect("clock lock poisoned")
    }
}
