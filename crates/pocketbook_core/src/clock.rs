//! Wall-clock abstraction for time-dependent entity helpers.
//!
//! # Responsibility
//! - Provide "now" in epoch milliseconds plus the local UTC offset.
//! - Let tests pin time so overdue/today/active checks are deterministic.
//!
//! # Invariants
//! - Entity helpers never read system time directly; they take `&dyn Clock`.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current time as Unix epoch milliseconds.
    fn now_millis(&self) -> i64;

    /// Offset used to resolve calendar days ("today").
    fn utc_offset(&self) -> FixedOffset;

    /// Calendar date of `epoch_ms` in this clock's offset.
    fn local_date(&self, epoch_ms: i64) -> Option<NaiveDate> {
        let utc: DateTime<Utc> = DateTime::from_timestamp_millis(epoch_ms)?;
        Some(utc.with_timezone(&self.utc_offset()).date_naive())
    }

    /// Calendar date of "now" in this clock's offset.
    fn today(&self) -> Option<NaiveDate> {
        self.local_date(self.now_millis())
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn utc_offset(&self) -> FixedOffset {
        Local::now().offset().fix()
    }
}

/// Clock pinned to one instant. Used by tests and replay tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now_ms: i64,
    offset: FixedOffset,
}

impl FixedClock {
    /// Pins the clock at `now_ms` in UTC.
    pub fn at(now_ms: i64) -> Self {
        Self {
            now_ms,
            offset: Utc.fix(),
        }
    }

    /// Pins the clock at `now_ms` with an explicit offset.
    pub fn with_offset(now_ms: i64, offset: FixedOffset) -> Self {
        Self { now_ms, offset }
    }

    /// Returns a copy moved by `delta_ms`.
    pub fn advanced(&self, delta_ms: i64) -> Self {
        Self {
            now_ms: self.now_ms + delta_ms,
            offset: self.offset,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now_ms
    }

    fn utc_offset(&self) -> FixedOffset {
        self.offset
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, FixedClock};
    use chrono::{FixedOffset, NaiveDate};

    // 2026-03-01T23:30:00Z
    const LATE_EVENING_UTC: i64 = 1_772_407_800_000;

    #[test]
    fn fixed_clock_resolves_date_in_its_offset() {
        let utc = FixedClock::at(LATE_EVENING_UTC);
        assert_eq!(utc.today(), NaiveDate::from_ymd_opt(2026, 3, 1));

        let shanghai = FixedOffset::east_opt(8 * 3600).unwrap();
        let local = FixedClock::with_offset(LATE_EVENING_UTC, shanghai);
        assert_eq!(local.today(), NaiveDate::from_ymd_opt(2026, 3, 2));
    }

    #[test]
    fn advanced_moves_now_only() {
        let clock = FixedClock::at(1_000).advanced(500);
        assert_eq!(clock.now_millis(), 1_500);
    }
}
