//! Scheduling clock.
//!
//! Every engine operation normalizes "today" exactly once at entry and
//! threads that date through planning, so a single request never
//! straddles a midnight boundary. Dates are day-precision; the reference
//! timezone is a fixed UTC offset from configuration.

use chrono::{FixedOffset, NaiveDate, Utc};

/// Source of the scheduler's notion of "today".
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Wall clock observed in a fixed reference offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Build a clock for a whole-hour UTC offset. Returns `None` when
    /// the offset falls outside chrono's representable range.
    pub fn from_offset_hours(hours: i32) -> Option<Self> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }
}

/// Clock pinned to one date, for tests and dry runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
