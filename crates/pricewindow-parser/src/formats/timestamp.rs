use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::model::sentinel_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clock {
    None,
    /// Any width chrono accepts, so `0:30` as well as `00:30`.
    Loose,
    /// Exactly `HH:MM`. chrono's `%H` alone also takes a single digit.
    TwoDigit,
}

#[derive(Debug, Clone, Copy)]
struct DatePattern {
    format: &'static str,
    clock: Clock,
}

impl DatePattern {
    const fn date_time(format: &'static str) -> Self {
        Self {
            format,
            clock: Clock::Loose,
        }
    }

    const fn fixed_clock(format: &'static str) -> Self {
        Self {
            format,
            clock: Clock::TwoDigit,
        }
    }

    const fn date(format: &'static str) -> Self {
        Self {
            format,
            clock: Clock::None,
        }
    }

    fn apply(&self, value: &str) -> Option<NaiveDateTime> {
        match self.clock {
            Clock::None => NaiveDate::parse_from_str(value, self.format)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN)),
            Clock::TwoDigit if !has_two_digit_clock(value) => None,
            Clock::Loose | Clock::TwoDigit => NaiveDateTime::parse_from_str(value, self.format).ok(),
        }
    }
}

fn has_two_digit_clock(value: &str) -> bool {
    let Some((_, clock)) = value.rsplit_once(' ') else {
        return false;
    };
    match clock.as_bytes() {
        [h1, h2, b':', m1, m2] => [h1, h2, m1, m2].iter().all(|b| b.is_ascii_digit()),
        _ => false,
    }
}

// Order is significant: day-first readings must be tried before month-first
// so that "01/02/2017" is always the 1st of February. Times here need a
// two-digit hour; "10/1/2017 0:30" misses all of them and is read month-first
// by the fallback list.
const EXPLICIT_PATTERNS: &[DatePattern] = &[
    DatePattern::fixed_clock("%d/%m/%Y %H:%M"),
    DatePattern::date("%d/%m/%Y"),
    DatePattern::fixed_clock("%-d/%-m/%Y %H:%M"),
    DatePattern::date("%-d/%-m/%Y"),
    DatePattern::fixed_clock("%m/%d/%Y %H:%M"),
    DatePattern::date("%m/%d/%Y"),
    DatePattern::fixed_clock("%Y-%m-%d %H:%M"),
    DatePattern::date("%Y-%m-%d"),
];

// Slash forms are month-first before day-first here.
const FALLBACK_PATTERNS: &[DatePattern] = &[
    DatePattern::date_time("%Y-%m-%dT%H:%M:%S%.f"),
    DatePattern::date_time("%Y-%m-%dT%H:%M"),
    DatePattern::date_time("%Y-%m-%d %H:%M:%S%.f"),
    DatePattern::date_time("%Y-%m-%d %H:%M:%S"),
    DatePattern::date_time("%Y-%m-%d %H:%M"),
    DatePattern::date_time("%Y/%m/%d %H:%M:%S"),
    DatePattern::date_time("%Y/%m/%d %H:%M"),
    DatePattern::date("%Y/%m/%d"),
    DatePattern::date_time("%m/%d/%Y %H:%M:%S"),
    DatePattern::date_time("%m/%d/%Y %H:%M"),
    DatePattern::date_time("%d/%m/%Y %H:%M:%S"),
    DatePattern::date_time("%d/%m/%Y %H:%M"),
    DatePattern::date_time("%m/%d/%Y %I:%M:%S %p"),
    DatePattern::date_time("%m/%d/%Y %I:%M %p"),
    DatePattern::date_time("%d.%m.%Y %H:%M:%S"),
    DatePattern::date_time("%d.%m.%Y %H:%M"),
    DatePattern::date("%d.%m.%Y"),
    DatePattern::date_time("%d %b %Y %H:%M:%S"),
    DatePattern::date_time("%d %b %Y %H:%M"),
    DatePattern::date("%d %b %Y"),
    DatePattern::date("%d-%b-%Y"),
    DatePattern::date("%b %d, %Y"),
    DatePattern::date("%b %d %Y"),
];

/// Parses a raw date/time token, returning `None` when no known layout fits.
///
/// Explicit day-first, then month-first, then ISO patterns are tried in a fixed
/// order and the first match wins. Only if none of those match is the broader
/// fallback set consulted.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    EXPLICIT_PATTERNS
        .iter()
        .find_map(|pattern| pattern.apply(trimmed))
        .or_else(|| parse_flexible(trimmed))
}

/// Same as [`parse_timestamp`] but substitutes the sentinel timestamp on failure.
pub fn normalize_timestamp(value: &str) -> NaiveDateTime {
    parse_timestamp(value).unwrap_or_else(sentinel_timestamp)
}

fn parse_flexible(trimmed: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    FALLBACK_PATTERNS
        .iter()
        .find_map(|pattern| pattern.apply(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hm(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn day_first_wins_for_ambiguous_dates() {
        assert_eq!(parse_timestamp("01/02/2017"), Some(ymd_hm(2017, 2, 1, 0, 0)));
        assert_eq!(parse_timestamp("10/1/2017"), Some(ymd_hm(2017, 1, 10, 0, 0)));
        assert_eq!(
            parse_timestamp("10/1/2017 00:30"),
            Some(ymd_hm(2017, 1, 10, 0, 30))
        );
        assert_eq!(
            parse_timestamp("13/01/2017 00:30"),
            Some(ymd_hm(2017, 1, 13, 0, 30))
        );
    }

    #[test]
    fn single_digit_hour_falls_back_to_month_first() {
        assert_eq!(
            parse_timestamp("10/1/2017 0:30"),
            Some(ymd_hm(2017, 10, 1, 0, 30))
        );
        assert_eq!(
            parse_timestamp("10/1/2017 1:30"),
            Some(ymd_hm(2017, 10, 1, 1, 30))
        );
        assert_eq!(
            parse_timestamp("13/1/2017 0:30"),
            Some(ymd_hm(2017, 1, 13, 0, 30))
        );
        assert_eq!(
            parse_timestamp("2017-10-01 1:00"),
            Some(ymd_hm(2017, 10, 1, 1, 0))
        );
    }

    #[test]
    fn two_digit_clock_check() {
        assert!(has_two_digit_clock("10/1/2017 00:30"));
        assert!(!has_two_digit_clock("10/1/2017 0:30"));
        assert!(!has_two_digit_clock("10/1/2017 00:3"));
        assert!(!has_two_digit_clock("10/1/2017"));
    }

    #[test]
    fn month_first_used_when_day_first_impossible() {
        assert_eq!(parse_timestamp("12/25/2017"), Some(ymd_hm(2017, 12, 25, 0, 0)));
        assert_eq!(
            parse_timestamp("12/25/2017 18:45"),
            Some(ymd_hm(2017, 12, 25, 18, 45))
        );
    }

    #[test]
    fn iso_dates_parse() {
        assert_eq!(parse_timestamp("2017-01-10"), Some(ymd_hm(2017, 1, 10, 0, 0)));
        assert_eq!(
            parse_timestamp(" 2017-01-10 00:30 "),
            Some(ymd_hm(2017, 1, 10, 0, 30))
        );
    }

    #[test]
    fn fallback_handles_seconds_and_text_months() {
        assert_eq!(
            parse_timestamp("2023-01-01T00:30:00"),
            Some(ymd_hm(2023, 1, 1, 0, 30))
        );
        assert_eq!(
            parse_timestamp("2017-10-01 01:30:00"),
            Some(ymd_hm(2017, 10, 1, 1, 30))
        );
        assert_eq!(
            parse_timestamp("2017-10-01T02:30:00+02:00"),
            Some(ymd_hm(2017, 10, 1, 0, 30))
        );
        assert_eq!(parse_timestamp("10 Jan 2017"), Some(ymd_hm(2017, 1, 10, 0, 0)));
        assert_eq!(parse_timestamp("Jan 10, 2017"), Some(ymd_hm(2017, 1, 10, 0, 0)));
    }

    #[test]
    fn garbage_becomes_sentinel() {
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("32/13/2017"), None);
        assert_eq!(normalize_timestamp("yesterday"), sentinel_timestamp());
    }
}
