//! Campus-local time source.
//!
//! Every attendance window decision is made against the wall clock of the
//! institution, not the server's. The clock is an explicit dependency carried
//! in [`crate::state::AppState`] and threaded into the policy functions as
//! plain `NaiveDateTime` values, so tests can pin time without touching
//! globals.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// Source of the current campus-local date and time.
pub trait Clock: Send + Sync {
    /// Current wall-clock date/time in the configured campus zone.
    fn now(&self) -> NaiveDateTime;

    /// Today's date in the configured campus zone.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Production clock: UTC shifted by the configured fixed offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Builds a clock with an offset of `offset_minutes` east of UTC.
    ///
    /// # Panics
    /// Panics if the offset is out of range (|offset| >= 24h).
    pub fn new(offset_minutes: i32) -> Self {
        Self {
            offset: FixedOffset::east_opt(offset_minutes * 60)
                .expect("TZ_OFFSET_MINUTES out of range"),
        }
    }

    /// Builds a clock from `TZ_OFFSET_MINUTES` in the global config.
    pub fn from_config() -> Self {
        Self::new(crate::config::tz_offset_minutes())
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }
}

/// Test clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
