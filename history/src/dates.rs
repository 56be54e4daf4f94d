//! Timestamp helpers. Entries carry microseconds since the Unix epoch; all
//! rendering is UTC.

use chrono::DateTime;
use chrono::NaiveDateTime;
use chrono::Utc;

use crate::error::HistoryError;
use crate::error::Result;
use crate::types::Micros;

const MICROS_PER_SEC: i64 = 1_000_000;

pub fn now_micros() -> Micros {
    Utc::now().timestamp_micros()
}

fn to_datetime(micros: Micros) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}

/// `2009-07-15 12:01:59`, or an empty string for a zero timestamp.
pub fn to_date_string(micros: Micros) -> String {
    if micros == 0 {
        return String::new();
    }
    to_datetime(micros)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Compact form used in menu titles: `09-07-15 12:01`.
pub fn to_short_date_string(micros: Micros) -> String {
    if micros == 0 {
        return String::new();
    }
    to_datetime(micros)
        .map(|d| d.format("%y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// `2009-10-19T13:08:34.000`
pub fn to_iso_string(micros: Micros) -> String {
    if micros == 0 {
        return String::new();
    }
    to_datetime(micros)
        .map(|d| d.format("%Y-%m-%dT%H:%M:%S%.3f").to_string())
        .unwrap_or_default()
}

/// Inverse of [`to_iso_string`]. Millisecond precision; a missing fraction
/// is accepted.
pub fn from_iso_string(s: &str) -> Result<Micros> {
    let parsed = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| HistoryError::InvalidInput(format!("bad ISO date '{s}': {e}")))?;
    let millis = parsed.and_utc().timestamp_millis();
    Ok(millis * 1000)
}

/// Age of `then` relative to `now`, expressed in a single unit. A `then`
/// in the future reads as no time at all.
pub fn fuzzy_age(then: Micros, now: Micros) -> String {
    let elapsed = now.saturating_sub(then).max(0);
    let seconds = (elapsed as f64 / MICROS_PER_SEC as f64).round() as i64;
    let days = (seconds as f64 / 86_400.0).round() as i64;

    if days > 0 {
        let weeks = days / 7;
        let months = days / 30;
        if months > 24 {
            let years = (months as f64 / 12.0).round() as i64;
            return format!("{years} years");
        }
        if months > 1 {
            return format!("{months} months");
        }
        if weeks > 2 {
            return format!("{weeks} weeks");
        }
        return plural(days, "day");
    }

    let hours = (seconds as f64 / 3600.0).round() as i64;
    if hours > 0 {
        return plural(hours, "hour");
    }
    if seconds < 60 {
        return plural(seconds, "second");
    }
    let minutes = (seconds as f64 / 60.0).round() as i64;
    plural(minutes, "minute")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2009-10-19T13:08:34.250Z
    const SAMPLE: Micros = 1_255_957_714_250_000;

    #[test]
    fn iso_round_trip_keeps_millis() {
        let iso = to_iso_string(SAMPLE);
        assert_eq!(iso, "2009-10-19T13:08:34.250");
        assert_eq!(from_iso_string(&iso).unwrap(), SAMPLE);
        assert_eq!(
            from_iso_string("2009-10-19T13:08:34").unwrap(),
            SAMPLE - 250_000
        );
    }

    #[test]
    fn zero_renders_empty() {
        assert_eq!(to_date_string(0), "");
        assert_eq!(to_short_date_string(0), "");
        assert_eq!(to_iso_string(0), "");
    }

    #[test]
    fn display_formats() {
        assert_eq!(to_date_string(SAMPLE), "2009-10-19 13:08:34");
        assert_eq!(to_short_date_string(SAMPLE), "09-10-19 13:08");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            from_iso_string("yesterday"),
            Err(HistoryError::InvalidInput(_))
        ));
    }

    #[test]
    fn fuzzy_age_units() {
        let sec = MICROS_PER_SEC;
        let day = 86_400 * sec;
        assert_eq!(fuzzy_age(0, 1 * sec), "1 second");
        assert_eq!(fuzzy_age(0, 45 * sec), "45 seconds");
        assert_eq!(fuzzy_age(0, 5 * 60 * sec), "5 minutes");
        assert_eq!(fuzzy_age(0, 3600 * sec), "1 hour");
        assert_eq!(fuzzy_age(0, 3 * day), "3 days");
        assert_eq!(fuzzy_age(0, 21 * day), "3 weeks");
        assert_eq!(fuzzy_age(0, 90 * day), "3 months");
        assert_eq!(fuzzy_age(0, 1000 * day), "3 years");
    }

    #[test]
    fn fuzzy_age_survives_extreme_and_future_timestamps() {
        let now = SAMPLE;
        assert!(fuzzy_age(i64::MIN, now).ends_with(" years"));
        assert_eq!(fuzzy_age(now + 3600 * MICROS_PER_SEC, now), "0 seconds");
        assert_eq!(fuzzy_age(i64::MAX, i64::MIN), "0 seconds");
    }
}
