//! Time Engine - zone-local wall clock sampling
//!
//! Decomposes the current instant into the hour, minute, second and day-of-month of a
//! timezone. Offsets are never computed by hand: the instant is projected through the
//! tz database so DST and historical offset changes come from chrono-tz.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

use crate::timezone::ZoneId;

/// Zone-local reading of the wall clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSample {
    /// Hour in 24-hour format (0-23)
    pub hours: u32,
    /// Minute (0-59)
    pub minutes: u32,
    /// Second (0-59)
    pub seconds: u32,
    /// Day of month (1-31)
    pub day_of_month: u32,
}

impl TimeSample {
    /// Build a sample, rejecting out-of-range fields
    pub fn new(hours: u32, minutes: u32, seconds: u32, day_of_month: u32) -> Option<Self> {
        let valid = hours < 24 && minutes < 60 && seconds < 60 && (1..=31).contains(&day_of_month);
        valid.then_some(Self {
            hours,
            minutes,
            seconds,
            day_of_month,
        })
    }

    /// Hour on a 12-hour face (0-11, noon and midnight are 0)
    pub fn hours12(&self) -> u32 {
        self.hours % 12
    }

    /// Format the time as "hh:mm:ss"
    pub fn format_time(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Source of the current instant
pub trait TimeSource {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl TimeSource for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Sample the current wall clock in a zone
pub fn sample(zone: &ZoneId) -> TimeSample {
    sample_at(zone, Utc::now())
}

/// Sample the wall clock of a zone at a specific instant
pub fn sample_at(zone: &ZoneId, instant: DateTime<Utc>) -> TimeSample {
    sample_tz(zone.tz(), instant)
}

/// Sample a parsed tz database zone at a specific instant
pub fn sample_tz(tz: Tz, instant: DateTime<Utc>) -> TimeSample {
    let local = instant.with_timezone(&tz);

    TimeSample {
        hours: local.hour(),
        minutes: local.minute(),
        // Leap seconds surface as nanoseconds past 1e9, so second() stays within 0-59
        seconds: local.second(),
        day_of_month: local.day(),
    }
}
