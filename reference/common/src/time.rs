//! Time utilities and clocks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Seconds since the Unix epoch.
pub type Timestamp = u64;

/// Calendar constants.
pub mod constants {
    /// Seconds in a minute.
    pub const SECONDS_PER_MINUTE: u64 = 60;

    /// Seconds in an hour.
    pub const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;

    /// Seconds in a day.
    pub const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

    /// Seconds in a 365-day year.
    pub const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;
}

/// Source of the current time for the ledger.
///
/// Implementations must be monotonically non-decreasing.
pub trait Clock {
    /// Current timestamp.
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        u64::try_from(Utc::now().timestamp()).unwrap_or(0)
    }
}

/// Manually driven clock shared between handles.
///
/// Clones observe the same time. Time never moves backwards.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock starting at `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Create a clock starting at the current wall time.
    pub fn starting_now() -> Self {
        Self::new(SystemClock.now())
    }

    /// Move time forward and return the new timestamp.
    pub fn advance(&self, seconds: u64) -> Timestamp {
        let previous = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_add(seconds))
            })
            .unwrap_or_else(|t| t);
        previous.saturating_add(seconds)
    }

    /// Jump to `timestamp`; ignored if it lies in the past.
    pub fn set(&self, timestamp: Timestamp) -> Timestamp {
        self.now.fetch_max(timestamp, Ordering::SeqCst).max(timestamp)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Convert to a UTC datetime for display.
pub fn to_datetime(timestamp: Timestamp) -> Option<DateTime<Utc>> {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

#[cfg(test)]
mod tests {
    use super::constants::*;
    use super::*;

    #[test]
    fn test_year_length() {
        assert_eq!(SECONDS_PER_YEAR, 31_536_000);
    }

    #[test]
    fn test_manual_clock_shared_and_monotonic() {
        let clock = ManualClock::new(1_000);
        let handle = clock.clone();

        assert_eq!(clock.advance(500), 1_500);
        assert_eq!(handle.now(), 1_500);

        assert_eq!(handle.set(1_200), 1_500);
        assert_eq!(clock.now(), 1_500);

        assert_eq!(handle.set(2_000), 2_000);
        assert_eq!(clock.now(), 2_000);
    }

    #[test]
    fn test_system_clock_is_recent() {
        // 2020-01-01
        assert!(SystemClock.now() > 1_577_836_800);
    }

    #[test]
    fn test_to_datetime() {
        let dt = to_datetime(0).unwrap();
        assert_eq!(dt.timestamp(), 0);
        assert!(to_datetime(u64::MAX).is_none());
    }
}
