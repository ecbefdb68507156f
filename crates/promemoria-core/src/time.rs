//! Time handling for appointment discovery.
//!
//! This module provides [`TomorrowWindow`] (the query bounds for "tomorrow"
//! in the business timezone), [`EventStart`] (an event start as the calendar
//! reports it) and [`local_clock_time`] for the `HH:MM` shown in reminders.

use chrono::{
    DateTime, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Utc,
};
use chrono_tz::Tz;
use thiserror::Error;

/// Timezone used when the deployment does not configure one.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Rome;

/// Format used for window bounds sent to the calendar API.
const OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Errors raised while computing or parsing times.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The timezone identifier is not in the IANA database.
    #[error("unknown timezone: {0}")]
    UnknownTimezone(String),

    /// The timestamp could not be parsed.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// The start is an all-day date and carries no clock time.
    #[error("all-day start {0} has no clock time")]
    NoClockTime(String),

    /// Date arithmetic overflowed.
    #[error("date out of range")]
    OutOfRange,
}

/// Parses an IANA timezone identifier such as `Europe/Rome`.
pub fn parse_timezone(name: &str) -> Result<Tz, TimeError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| TimeError::UnknownTimezone(name.to_string()))
}

/// The 00:00:00 to 23:59:59 bounds of tomorrow in a civil timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TomorrowWindow {
    /// Start of tomorrow (inclusive).
    pub start: DateTime<Tz>,
    /// Last second of tomorrow (inclusive).
    pub end: DateTime<Tz>,
}

impl TomorrowWindow {
    /// Computes tomorrow relative to `now`, as seen from `tz`.
    ///
    /// "Today" is taken from `now` converted into `tz`, never from the
    /// host's local time.
    pub fn compute(now: DateTime<Utc>, tz: Tz) -> Result<Self, TimeError> {
        let today = now.with_timezone(&tz).date_naive();
        let tomorrow = today.succ_opt().ok_or(TimeError::OutOfRange)?;
        Self::for_date(tomorrow, tz)
    }

    /// Builds the window for a specific civil date.
    pub fn for_date(date: NaiveDate, tz: Tz) -> Result<Self, TimeError> {
        let first = date.and_time(NaiveTime::MIN);
        let last = date
            .and_hms_opt(23, 59, 59)
            .ok_or(TimeError::OutOfRange)?;

        Ok(Self {
            start: resolve_local(&tz, first, false)?,
            end: resolve_local(&tz, last, true)?,
        })
    }

    /// The civil date this window covers.
    pub fn date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Lower bound formatted with an explicit offset, e.g. `2025-10-12T00:00:00+02:00`.
    pub fn time_min(&self) -> String {
        self.start.format(OFFSET_FORMAT).to_string()
    }

    /// Upper bound formatted with an explicit offset.
    pub fn time_max(&self) -> String {
        self.end.format(OFFSET_FORMAT).to_string()
    }

    /// Returns true if `start` falls inside the window.
    ///
    /// Timed starts are compared as instants; all-day starts match on the date.
    pub fn contains(&self, start: &EventStart) -> bool {
        match start {
            EventStart::DateTime(dt) => {
                let instant = dt.with_timezone(&Utc);
                instant >= self.start.with_timezone(&Utc) && instant <= self.end.with_timezone(&Utc)
            }
            EventStart::AllDay(date) => *date == self.date(),
        }
    }
}

/// Maps a civil time to an instant, stepping over DST gaps.
fn resolve_local(tz: &Tz, naive: NaiveDateTime, prefer_latest: bool) -> Result<DateTime<Tz>, TimeError> {
    let mut candidate = naive;
    // DST gaps never exceed a few hours; bound the walk instead of looping forever.
    for _ in 0..24 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return Ok(dt),
            LocalResult::Ambiguous(earliest, latest) => {
                return Ok(if prefer_latest { latest } else { earliest });
            }
            LocalResult::None => {
                candidate = candidate
                    .checked_add_signed(Duration::minutes(30))
                    .ok_or(TimeError::OutOfRange)?;
            }
        }
    }
    Err(TimeError::OutOfRange)
}

/// The start of a calendar event, as reported by the calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStart {
    /// A timestamp with its original UTC offset.
    DateTime(DateTime<FixedOffset>),
    /// An all-day event date.
    AllDay(NaiveDate),
}

impl EventStart {
    /// Parses an RFC 3339 timestamp (`Z` or numeric offset) or a `YYYY-MM-DD` date.
    pub fn parse(value: &str) -> Result<Self, TimeError> {
        let value = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Ok(Self::DateTime(dt));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Self::AllDay)
            .map_err(|e| TimeError::InvalidTimestamp {
                value: value.to_string(),
                reason: e.to_string(),
            })
    }

    /// Returns true for all-day starts.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// The civil date of this start in `tz`.
    pub fn local_date(&self, tz: &Tz) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.with_timezone(tz).date_naive(),
            Self::AllDay(date) => *date,
        }
    }
}

/// Derives the `HH:MM` civil time of an event start in `tz`.
///
/// The original offset of `start` is irrelevant; only the instant matters.
pub fn local_clock_time(start: &str, tz: &Tz) -> Result<String, TimeError> {
    match EventStart::parse(start)? {
        EventStart::DateTime(dt) => Ok(dt.with_timezone(tz).format("%H:%M").to_string()),
        EventStart::AllDay(date) => Err(TimeError::NoClockTime(date.to_string())),
    }
}
