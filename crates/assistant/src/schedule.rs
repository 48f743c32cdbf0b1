//! Due-date parsing and relative-day hints.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static NEXT_WEEK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bnext week\b|اگلے ہفتے").expect("valid next week regex"));
static TOMORROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\btomorrow\b").expect("valid tomorrow regex"));
static TODAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(today|tonight)\b").expect("valid today regex"));

/// Whole-word match for Urdu hints, so "کل" does not fire inside "کلاس".
pub(crate) fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation() || c == '۔' || c == '،')
        .any(|w| w == word)
}

/// Relative day offset mentioned in free text, if any.
pub fn day_offset(text: &str) -> Option<i64> {
    if NEXT_WEEK.is_match(text) {
        Some(7)
    } else if TOMORROW.is_match(text) || contains_word(text, "کل") {
        Some(1)
    } else if TODAY.is_match(text) || contains_word(text, "آج") {
        Some(0)
    } else {
        None
    }
}

pub fn infer_due_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    day_offset(text).map(|days| now + Duration::days(days))
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_due_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}
