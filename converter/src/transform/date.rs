//! Date normalization to `YYYY-MM-DD`.
//!
//! Patterns use the familiar `yyyy`/`MM`/`dd` notation shown to users
//! (see [`DateFormat::CHOICES`]) and are translated to chrono format strings.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::DateFormat;
use crate::error::{DateError, DateResult};

/// Patterns tried, in order, by auto-detection.
pub const AUTO_PATTERNS: [&str; 5] = [
    "yyyy-MM-dd",
    "dd/MM/yyyy",
    "MM/dd/yyyy",
    "dd.MM.yyyy",
    "yyyy/MM/dd",
];

/// Auto-detected years must fall strictly between these bounds.
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid ISO date regex"));

/// Normalize a raw date cell to `YYYY-MM-DD`.
///
/// With an explicit pattern the value must parse to a real calendar date.
/// With [`DateFormat::Auto`] a value already shaped like `dddd-dd-dd` is
/// returned as-is (no calendar check); otherwise each of
/// [`AUTO_PATTERNS`] is tried and the first valid date with a plausible
/// year wins.
pub fn normalize_date(raw: &str, format: &DateFormat) -> DateResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DateError::Empty);
    }

    match format {
        DateFormat::Pattern(pattern) => {
            parse_with_pattern(value, pattern).map(|date| date.format("%Y-%m-%d").to_string())
        }
        DateFormat::Auto => {
            if ISO_DATE.is_match(value) {
                return Ok(value.to_string());
            }

            AUTO_PATTERNS
                .iter()
                .filter_map(|pattern| parse_with_pattern(value, pattern).ok())
                .find(|date| date.year() > MIN_YEAR && date.year() < MAX_YEAR)
                .map(|date| date.format("%Y-%m-%d").to_string())
                .ok_or_else(|| DateError::Undetected(value.to_string()))
        }
    }
}

/// Parse `value` strictly against one `yyyy`/`MM`/`dd` style pattern.
pub fn parse_with_pattern(value: &str, pattern: &str) -> DateResult<NaiveDate> {
    NaiveDate::parse_from_str(value, &to_chrono_format(pattern)).map_err(|_| DateError::NoMatch {
        value: value.to_string(),
        pattern: pattern.to_string(),
    })
}

/// Translate `dd.MM.yyyy` style tokens into a chrono format string.
///
/// Supported tokens: `yyyy`/`y` (full year), `yy` (two-digit year),
/// `M`/`MM` (month number), `MMM` (short month name), `MMMM` (full month
/// name), `d`/`dd` (day). Everything else is literal.
pub fn to_chrono_format(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        match (c, run) {
            ('y', 2) => out.push_str("%y"),
            ('y', _) => out.push_str("%Y"),
            ('M', 1) | ('M', 2) => out.push_str("%m"),
            ('M', 3) => out.push_str("%b"),
            ('M', _) => out.push_str("%B"),
            ('d', _) => out.push_str("%d"),
            ('%', _) => {
                for _ in 0..run {
                    out.push_str("%%");
                }
            }
            _ => {
                for _ in 0..run {
                    out.push(c);
                }
            }
        }
        i += run;
    }

    out
}
