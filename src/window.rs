//! Schedule windowing.
//!
//! The frontend shows a fixed 14-day slice of the calendar: the
//! "upcoming matches" view and the per-date schedule both derive from
//! the same inclusive date window. The sync engine fetches fixtures one
//! window at a time using the same arithmetic, so the two can never
//! disagree about which dates are in view.

use chrono::{Duration, NaiveDate, Utc};

/// Default window length in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 14;

/// An inclusive span of consecutive calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// The window of `days` consecutive dates starting at `start`.
    /// A window always contains at least its start date.
    pub fn starting_at(start: NaiveDate, days: u32) -> Self {
        let days = days.max(1);
        Self {
            start,
            end: start + Duration::days(i64::from(days) - 1),
        }
    }

    /// The standard schedule window beginning today (UTC).
    pub fn upcoming(days: u32) -> Self {
        Self::starting_at(Utc::now().date_naive(), days)
    }

    /// Number of dates in the window.
    pub fn len(&self) -> u32 {
        ((self.end - self.start).num_days() + 1) as u32
    }

    pub fn is_empty(&self) -> bool {
        false // inclusive bounds; a window always holds >= 1 date
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Every date in the window, in order.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut out = Vec::with_capacity(self.len() as usize);
        let mut d = self.start;
        while d <= self.end {
            out.push(d);
            d = d + Duration::days(1);
        }
        out
    }
}

/// Format a date the way the upstream API and the frontend expect it.
pub fn fmt_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` query parameter.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
