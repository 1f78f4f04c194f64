//! Server time source.
//!
//! Hubs read time through `Clock` so drift compensation can be exercised
//! without sleeping.

use std::sync::atomic::{AtomicI64, Ordering};

use watchparty_shared::time::now_unix_millis;

use crate::domain::Timestamp;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock (Unix epoch milliseconds, UTC).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(now_unix_millis())
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: AtomicI64::new(start.value()),
        }
    }

    pub fn advance_millis(&self, millis: i64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }

    pub fn set(&self, at: Timestamp) {
        self.millis.store(at.value(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(self.millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances() {
        // テスト項目: ManualClock は指定した分だけ進む
        let clock = ManualClock::new(Timestamp::new(1_000));
        clock.advance_millis(250);
        assert_eq!(clock.now(), Timestamp::new(1_250));

        clock.set(Timestamp::new(10));
        assert_eq!(clock.now(), Timestamp::new(10));
    }
}
