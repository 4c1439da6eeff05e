//! Wall-clock abstraction so time-dependent rules can be driven in tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate};

pub trait Clock: Send + Sync {
    /// Current time as Unix milliseconds.
    fn now_millis(&self) -> i64;

    /// Current calendar date in UTC.
    fn today(&self) -> NaiveDate {
        DateTime::from_timestamp_millis(self.now_millis())
            .unwrap_or_default()
            .date_naive()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.millis.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(0);
        clock.advance_secs(90);
        assert_eq!(clock.now_millis(), 90_000);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        clock.advance_secs(86_400);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(1970, 1, 2).unwrap());
    }

    #[test]
    fn system_clock_is_after_epoch() {
        assert!(SystemClock.now_millis() > 0);
    }
}
