//! Protocol week math.
//!
//! A protocol week is a fixed 604 800 second interval counted from
//! [`GENESIS_TIMESTAMP`]. Week `w` covers `[start(w), end(w))`.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Protocol week number.
pub type Week = u32;

/// Unix timestamp of protocol week 0.
pub const GENESIS_TIMESTAMP: u64 = 1_700_352_000;

/// Length of a protocol week in seconds.
pub const SECONDS_PER_WEEK: u64 = 604_800;

/// First week of the v2 rewards contracts. Claim nonce 0 maps to this week.
pub const FIRST_V2_WEEK: Week = 97;

/// Week range errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    /// Start week after end week.
    #[error("start week {start} is after end week {end}")]
    Inverted {
        /// Requested start.
        start: Week,
        /// Requested end.
        end: Week,
    },
}

/// Week containing `timestamp`. Timestamps before genesis map to week 0.
pub fn week_of_timestamp(timestamp: u64) -> Week {
    let elapsed = timestamp.saturating_sub(GENESIS_TIMESTAMP);
    (elapsed / SECONDS_PER_WEEK) as Week
}

/// First second of `week`.
pub fn week_start_timestamp(week: Week) -> u64 {
    GENESIS_TIMESTAMP + u64::from(week) * SECONDS_PER_WEEK
}

/// First second after `week` (exclusive end).
pub fn week_end_timestamp(week: Week) -> u64 {
    GENESIS_TIMESTAMP + (u64::from(week) + 1) * SECONDS_PER_WEEK
}

/// Week in progress at `now`.
pub fn current_week(now: u64) -> Week {
    week_of_timestamp(now)
}

/// Most recent fully elapsed week at `now`.
pub fn last_completed_week(now: u64) -> Week {
    current_week(now).saturating_sub(1)
}

/// Week a protocol-deposit claim pays out, decoded from its nonce.
pub fn week_from_claim_nonce(nonce: u64) -> Week {
    FIRST_V2_WEEK.saturating_add(nonce.min(u64::from(Week::MAX)) as Week)
}

/// Source of "now" in unix seconds. Injected wherever results depend on the
/// current week so tests can pin time.
pub trait Clock: Send + Sync {
    /// Current unix time in seconds.
    fn now_unix(&self) -> u64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Settable clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Clock frozen at `now`.
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Moves the clock forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Inclusive range of protocol weeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekRange {
    /// First week (inclusive).
    pub start_week: Week,
    /// Last week (inclusive).
    pub end_week: Week,
}

impl WeekRange {
    /// Builds a validated range.
    pub fn new(start_week: Week, end_week: Week) -> Result<Self, RangeError> {
        if start_week > end_week {
            return Err(RangeError::Inverted {
                start: start_week,
                end: end_week,
            });
        }
        Ok(Self {
            start_week,
            end_week,
        })
    }

    /// Default impact range: `start_week` through the last completed week.
    ///
    /// Collapses to a single week while the protocol has not yet completed
    /// `start_week`.
    pub fn through_last_completed(start_week: Week, now: u64) -> Self {
        let last = last_completed_week(now);
        Self {
            start_week,
            end_week: last.max(start_week),
        }
    }

    /// Whether `week` is inside the range.
    pub fn contains(&self, week: Week) -> bool {
        week >= self.start_week && week <= self.end_week
    }

    /// Number of weeks in the range.
    pub fn len(&self) -> u32 {
        self.end_week - self.start_week + 1
    }

    /// Always false; a valid range holds at least one week.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Weeks in ascending order.
    pub fn weeks(&self) -> impl Iterator<Item = Week> {
        self.start_week..=self.end_week
    }

    /// Range widened backwards by `lookback` weeks, floored at week 0.
    pub fn with_lookback(&self, lookback: Week) -> Self {
        Self {
            start_week: self.start_week.saturating_sub(lookback),
            end_week: self.end_week,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_boundaries() {
        assert_eq!(week_of_timestamp(GENESIS_TIMESTAMP), 0);
        assert_eq!(week_of_timestamp(GENESIS_TIMESTAMP + SECONDS_PER_WEEK - 1), 0);
        assert_eq!(week_of_timestamp(GENESIS_TIMESTAMP + SECONDS_PER_WEEK), 1);
        assert_eq!(week_of_timestamp(0), 0);
        assert_eq!(week_end_timestamp(0), week_start_timestamp(1));
    }

    #[test]
    fn test_claim_nonce_maps_from_v2_week() {
        assert_eq!(week_from_claim_nonce(0), 97);
        assert_eq!(week_from_claim_nonce(5), 102);
    }

    #[test]
    fn test_range_validation() {
        assert!(WeekRange::new(10, 9).is_err());
        let range = WeekRange::new(10, 12).expect("valid range");
        assert_eq!(range.len(), 3);
        assert_eq!(range.weeks().collect::<Vec<_>>(), vec![10, 11, 12]);
        assert!(range.contains(11));
        assert!(!range.contains(13));
    }

    #[test]
    fn test_lookback_floors_at_zero() {
        let range = WeekRange::new(2, 5).expect("valid range");
        assert_eq!(range.with_lookback(4).start_week, 0);
        let later = WeekRange::new(100, 105).expect("valid range");
        assert_eq!(later.with_lookback(4).start_week, 96);
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(GENESIS_TIMESTAMP);
        assert_eq!(current_week(clock.now_unix()), 0);
        clock.advance(SECONDS_PER_WEEK * 3);
        assert_eq!(current_week(clock.now_unix()), 3);
        clock.set(week_start_timestamp(100));
        assert_eq!(last_completed_week(clock.now_unix()), 99);
    }

    #[test]
    fn test_default_range_through_last_completed() {
        let now = week_start_timestamp(110) + 10;
        let range = WeekRange::through_last_completed(97, now);
        assert_eq!(range, WeekRange { start_week: 97, end_week: 109 });

        let early = week_start_timestamp(50);
        let range = WeekRange::through_last_completed(97, early);
        assert_eq!(range.end_week, 97);
    }
}
