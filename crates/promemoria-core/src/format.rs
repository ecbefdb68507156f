//! Italian date formatting for operator-facing output.

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;

use crate::time::{EventStart, TimeError};

const ITALIAN_MONTHS: [&str; 12] = [
    "Gennaio",
    "Febbraio",
    "Marzo",
    "Aprile",
    "Maggio",
    "Giugno",
    "Luglio",
    "Agosto",
    "Settembre",
    "Ottobre",
    "Novembre",
    "Dicembre",
];

/// Returns the Italian name of a month (1-based).
pub fn italian_month(month: u32) -> &'static str {
    ITALIAN_MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("")
}

/// Formats an event start for the operator.
///
/// Produces `Domani 12 Ottobre alle 15:00` when the start falls on the day
/// after `today` in `tz`, and `12 Ottobre alle 15:00` otherwise. All-day
/// starts drop the `alle HH:MM` part.
pub fn format_italian_start(start: &str, tz: &Tz, today: NaiveDate) -> Result<String, TimeError> {
    let parsed = EventStart::parse(start)?;
    let date = parsed.local_date(tz);
    let is_tomorrow = today.succ_opt() == Some(date);

    let mut out = String::new();
    if is_tomorrow {
        out.push_str("Domani ");
    }
    out.push_str(&format!("{} {}", date.day(), italian_month(date.month())));

    if let EventStart::DateTime(dt) = parsed {
        out.push_str(&format!(" alle {}", dt.with_timezone(tz).format("%H:%M")));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::DEFAULT_TIMEZONE;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn tomorrow_gets_prefix() {
        let text =
            format_italian_start("2025-10-12T15:00:00+02:00", &DEFAULT_TIMEZONE, day(2025, 10, 11))
                .unwrap();
        assert_eq!(text, "Domani 12 Ottobre alle 15:00");
    }

    #[test]
    fn other_days_have_no_prefix() {
        let text =
            format_italian_start("2025-10-14T08:05:00Z", &DEFAULT_TIMEZONE, day(2025, 10, 11)).unwrap();
        assert_eq!(text, "14 Ottobre alle 10:05");
    }

    #[test]
    fn all_day_omits_time() {
        let text = format_italian_start("2025-01-01", &DEFAULT_TIMEZONE, day(2024, 12, 31)).unwrap();
        assert_eq!(text, "Domani 1 Gennaio");
    }

    #[test]
    fn month_names() {
        assert_eq!(italian_month(1), "Gennaio");
        assert_eq!(italian_month(12), "Dicembre");
        assert_eq!(italian_month(13), "");
    }
}
