//! Minute-of-day arithmetic and the time filter used by traffic queries.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use std::fmt;

use crate::error::{Result, TrafficError};

pub const MINUTES_PER_DAY: u16 = 1440;

/// Sentinel accepted by [`TimeFilter::try_from`] meaning "no filter".
pub const ANY_TIME: i64 = -1;

/// A validated minute of the day, `0..=1439`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Minute(u16);

impl Minute {
    pub fn new(value: i64) -> Result<Self> {
        if (0..i64::from(MINUTES_PER_DAY)).contains(&value) {
            Ok(Self(value as u16))
        } else {
            Err(TrafficError::MinuteOutOfRange(value))
        }
    }

    /// Wall-clock hour×60+minute of a timestamp. The date is ignored.
    pub fn of(timestamp: &NaiveDateTime) -> Self {
        // hour() < 24 and minute() < 60, so this is always < 1440
        Self((timestamp.hour() * 60 + timestamp.minute()) as u16)
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for Minute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_time(*self))
    }
}

/// Which part of the day a traffic query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    #[default]
    AnyTime,
    At(Minute),
}

impl TimeFilter {
    /// Human-readable label, as shown next to the time slider.
    pub fn label(self) -> String {
        match self {
            TimeFilter::AnyTime => "any time".to_string(),
            TimeFilter::At(minute) => format_time(minute),
        }
    }

    /// The `-1`-or-minute integer form of this filter.
    pub fn as_i64(self) -> i64 {
        match self {
            TimeFilter::AnyTime => ANY_TIME,
            TimeFilter::At(minute) => i64::from(minute.get()),
        }
    }
}

impl TryFrom<i64> for TimeFilter {
    type Error = TrafficError;

    fn try_from(value: i64) -> Result<Self> {
        if value == ANY_TIME {
            Ok(TimeFilter::AnyTime)
        } else {
            Minute::new(value).map(TimeFilter::At)
        }
    }
}

impl From<Minute> for TimeFilter {
    fn from(minute: Minute) -> Self {
        TimeFilter::At(minute)
    }
}

/// Minutes elapsed since midnight on the timestamp's own date.
pub fn minutes_since_midnight(timestamp: &NaiveDateTime) -> Minute {
    Minute::of(timestamp)
}

/// Formats a minute of the day as a short 12-hour clock time, e.g. `1:05 PM`.
pub fn format_time(minute: Minute) -> String {
    let m = u32::from(minute.get());
    match NaiveTime::from_hms_opt(m / 60, m % 60, 0) {
        Some(time) => time.format("%-I:%M %p").to_string(),
        None => String::new(),
    }
}
