//! Retention buckets and calendar keys

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fmt;

/// One of the five retention periods.
///
/// Variants are declared in execution priority order, so the derived `Ord`
/// sorts yearly first and hourly last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bucket {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
}

/// Coarsened timestamp used to decide whether a bucket needs a new snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarKey {
    Year(i32),
    Month(i32, u32),
    /// ISO year and ISO week number
    Week(i32, u32),
    Day(i32, u32, u32),
    Hour(i32, u32, u32, u32),
}

impl Bucket {
    /// All buckets in priority order
    pub const ALL: [Bucket; 5] = [
        Bucket::Yearly,
        Bucket::Monthly,
        Bucket::Weekly,
        Bucket::Daily,
        Bucket::Hourly,
    ];

    /// Suffix used in snapshot names and config keys
    pub fn as_str(self) -> &'static str {
        match self {
            Bucket::Yearly => "yearly",
            Bucket::Monthly => "monthly",
            Bucket::Weekly => "weekly",
            Bucket::Daily => "daily",
            Bucket::Hourly => "hourly",
        }
    }

    /// Parse a bucket suffix. Returns `None` for anything unrecognized.
    pub fn parse(suffix: &str) -> Option<Bucket> {
        Bucket::ALL.into_iter().find(|b| b.as_str() == suffix)
    }

    /// Calendar key of `at` for this bucket
    pub fn calendar_key(self, at: NaiveDateTime) -> CalendarKey {
        match self {
            Bucket::Yearly => CalendarKey::Year(at.year()),
            Bucket::Monthly => CalendarKey::Month(at.year(), at.month()),
            Bucket::Weekly => {
                let week = at.iso_week();
                CalendarKey::Week(week.year(), week.week())
            }
            Bucket::Daily => CalendarKey::Day(at.year(), at.month(), at.day()),
            Bucket::Hourly => CalendarKey::Hour(at.year(), at.month(), at.day(), at.hour()),
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
