//! Quiet-hours gate

use chrono::{Local, NaiveTime, Timelike};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::config::Settings;

const MINUTES_PER_DAY: u16 = 24 * 60;

/// Window of suppressed output in minutes since midnight.
/// `end < start` wraps past midnight; `start == end` is always quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietWindow {
    pub start: u16,
    pub end: u16,
}

impl QuietWindow {
    pub const fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Build from `HH:MM` strings. A missing or unparsable side keeps its
    /// default; the other side is unaffected.
    pub fn from_strings(start: Option<&str>, end: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            start: side_or_default("QUIET_START", start, defaults.start),
            end: side_or_default("QUIET_END", end, defaults.end),
        }
    }

    pub fn contains(&self, minute: u16) -> bool {
        if self.start == self.end {
            return true;
        }
        if self.start < self.end {
            self.start <= minute && minute < self.end
        } else {
            minute >= self.start || minute < self.end
        }
    }
}

impl Default for QuietWindow {
    fn default() -> Self {
        Self::new(22 * 60, 7 * 60)
    }
}

impl Serialize for QuietWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("QuietWindow", 2)?;
        state.serialize_field("start", &format_hhmm(self.start))?;
        state.serialize_field("end", &format_hhmm(self.end))?;
        state.end()
    }
}

fn side_or_default(key: &str, value: Option<&str>, default: u16) -> u16 {
    let Some(value) = value else {
        return default;
    };
    parse_hhmm(value).unwrap_or_else(|| {
        debug!(key, value, "Invalid quiet time, using default");
        default
    })
}

/// Parse a 24-hour `HH:MM` time into minutes since midnight
pub fn parse_hhmm(value: &str) -> Option<u16> {
    let time = NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()?;
    Some(minute_of_day(time))
}

pub fn format_hhmm(minute: u16) -> String {
    let minute = minute % MINUTES_PER_DAY;
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

fn minute_of_day(time: NaiveTime) -> u16 {
    (time.hour() * 60 + time.minute()) as u16
}

/// True when output must be suppressed at `now`
pub fn is_quiet(settings: &Settings, now: NaiveTime) -> bool {
    settings.quiet.enabled && settings.quiet.window.contains(minute_of_day(now))
}

/// Source of the current wall-clock time
pub trait Clock {
    fn now(&self) -> NaiveTime;
}

/// Local time of the host
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}
