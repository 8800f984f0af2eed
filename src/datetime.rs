//! Datetime extraction from free-form reminder text.
//!
//! A ranked cascade of pattern strategies turns a normalized utterance plus a
//! reference instant into at most one [`TimeCandidate`]. The first strategy
//! that matches wins; weaker strategies only run when every stronger one
//! declined. Extraction is pure: identical `(text, reference)` inputs always
//! produce identical results, and malformed fragments (hour 13, day 32) are
//! "no match", never an error.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Utc, Weekday};
use regex::Regex;

use crate::types::TimeCandidate;

/// Fixed per-strategy confidence policy. Product constants, not derived
/// from anything; tests assert them verbatim.
pub const CONFIDENCE_DATE_WITH_TIME: f64 = 0.95;
pub const CONFIDENCE_RELATIVE_OFFSET: f64 = 0.90;
pub const CONFIDENCE_TIME_OF_DAY: f64 = 0.85;
/// "today" / "tomorrow" / "day after tomorrow"
pub const CONFIDENCE_NAMED_DAY: f64 = 0.90;
/// Month + day of month ("june 5")
pub const CONFIDENCE_MONTH_DAY: f64 = 0.85;
/// Named weekday, with or without "next"
pub const CONFIDENCE_WEEKDAY: f64 = 0.80;
pub const CONFIDENCE_NEXT_WEEK: f64 = 0.75;

/// Hour of day assumed when a phrase carries a date but no clock time.
const DEFAULT_HOUR: u32 = 9;

type Strategy = fn(&str, DateTime<Utc>) -> Option<TimeCandidate>;

/// Ranked strategy table. Order is part of the contract: a time-only phrase
/// must never shadow a combined date+time phrase, and a bare date is the
/// weakest interpretation.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("date-with-time", extract_date_with_time),
    ("relative-offset", extract_relative_offset),
    ("time-of-day", extract_time_of_day),
    ("date-only", extract_date_only),
];

/// Extract a single datetime interpretation from `text`.
///
/// `reference` is the instant relative to which phrases like "tomorrow" or
/// "in 2 hours" are resolved. Returns `None` when no strategy matches.
pub fn parse_date_time(text: &str, reference: DateTime<Utc>) -> Option<TimeCandidate> {
    let text = text.to_lowercase();
    for (name, strategy) in STRATEGIES {
        if let Some(candidate) = strategy(&text, reference) {
            log::debug!(
                "datetime strategy {} matched \"{}\"",
                name,
                candidate.matched_span
            );
            return Some(candidate);
        }
    }
    None
}

// ============================================================================
// Strategies
// ============================================================================

/// Explicit date phrase and explicit clock time together ("tomorrow at 9 am").
///
/// The date part resolves through the same lookup the date-only strategy
/// uses; the clock time then replaces the default hour. The matched span
/// covers both components.
fn extract_date_with_time(text: &str, reference: DateTime<Utc>) -> Option<TimeCandidate> {
    let date = find_date_phrase(text, reference)?;
    let clock = find_clock_time(text)?;

    let naive = date.date.and_hms_opt(clock.hour, clock.minute, 0)?;
    let start = date.start.min(clock.start);
    let end = date.end.max(clock.end);

    Some(TimeCandidate {
        point_in_time: Utc.from_utc_datetime(&naive),
        confidence: CONFIDENCE_DATE_WITH_TIME,
        matched_span: text[start..end].to_string(),
    })
}

/// Relative offset from the reference instant ("in 2 hours").
fn extract_relative_offset(text: &str, reference: DateTime<Utc>) -> Option<TimeCandidate> {
    let caps = relative_offset_regex().captures(text)?;
    let whole = caps.get(0)?;
    let amount: i64 = caps.get(1)?.as_str().parse().ok()?;

    let offset = match caps.get(2)?.as_str() {
        "minute" | "minutes" | "min" | "mins" => Duration::try_minutes(amount),
        "hour" | "hours" | "hr" | "hrs" => Duration::try_hours(amount),
        "day" | "days" => Duration::try_days(amount),
        _ => None,
    }?;

    Some(TimeCandidate {
        point_in_time: reference.checked_add_signed(offset)?,
        confidence: CONFIDENCE_RELATIVE_OFFSET,
        matched_span: whole.as_str().to_string(),
    })
}

/// Clock time with no date ("at 5 pm"). Assumes today; a time at or before
/// the reference instant rolls forward one day.
fn extract_time_of_day(text: &str, reference: DateTime<Utc>) -> Option<TimeCandidate> {
    let clock = find_clock_time(text)?;

    let naive = reference
        .date_naive()
        .and_hms_opt(clock.hour, clock.minute, 0)?;
    let mut point = Utc.from_utc_datetime(&naive);
    if point <= reference {
        point = point.checked_add_signed(Duration::days(1))?;
    }

    Some(TimeCandidate {
        point_in_time: point,
        confidence: CONFIDENCE_TIME_OF_DAY,
        matched_span: text[clock.start..clock.end].to_string(),
    })
}

/// Date phrase with no clock time; time of day defaults to 09:00.
fn extract_date_only(text: &str, reference: DateTime<Utc>) -> Option<TimeCandidate> {
    let date = find_date_phrase(text, reference)?;
    let naive = date.date.and_hms_opt(DEFAULT_HOUR, 0, 0)?;

    Some(TimeCandidate {
        point_in_time: Utc.from_utc_datetime(&naive),
        confidence: date.confidence,
        matched_span: text[date.start..date.end].to_string(),
    })
}

// ============================================================================
// Component matchers
// ============================================================================

/// A clock time located in the text, already converted to 24-hour form.
struct ClockMatch {
    hour: u32,
    minute: u32,
    start: usize,
    end: usize,
}

/// A date phrase located in the text.
struct DateMatch {
    date: NaiveDate,
    confidence: f64,
    start: usize,
    end: usize,
}

fn clock_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\bat\s+)?\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)\b")
            .expect("clock time regex should compile")
    })
}

fn relative_offset_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bin\s+(\d+)\s+(minutes?|mins?|hours?|hrs?|days?)\b")
            .expect("relative offset regex should compile")
    })
}

fn weekday_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:(next)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
            .expect("weekday regex should compile")
    })
}

fn month_day_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2})(?:st|nd|rd|th)?\b",
        )
        .expect("month-day regex should compile")
    })
}

/// Find a strict 12-hour clock time. Requires an am/pm marker; omitted
/// minutes default to 0. Hour outside 1..=12 or minute above 59 is treated
/// as no match so the cascade can fall through.
fn find_clock_time(text: &str) -> Option<ClockMatch> {
    let caps = clock_time_regex().captures(text)?;
    let whole = caps.get(0)?;

    let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if hour == 0 || hour > 12 || minute > 59 {
        return None;
    }

    let hour = match (caps.get(3)?.as_str(), hour) {
        ("am", 12) => 0,
        ("am", h) => h,
        ("pm", 12) => 12,
        ("pm", h) => h + 12,
        _ => return None,
    };

    Some(ClockMatch {
        hour,
        minute,
        start: whole.start(),
        end: whole.end(),
    })
}

/// Find a date phrase. Probe order is fixed: named relative days, "next
/// week", named weekdays, then month + day. "day after tomorrow" is probed
/// before the bare "tomorrow" it contains.
fn find_date_phrase(text: &str, reference: DateTime<Utc>) -> Option<DateMatch> {
    let today = reference.date_naive();

    for (phrase, days_ahead) in [("day after tomorrow", 2u64), ("tomorrow", 1), ("today", 0)] {
        if let Some(start) = text.find(phrase) {
            return Some(DateMatch {
                date: today.checked_add_days(Days::new(days_ahead))?,
                confidence: CONFIDENCE_NAMED_DAY,
                start,
                end: start + phrase.len(),
            });
        }
    }

    if let Some(start) = text.find("next week") {
        return Some(DateMatch {
            date: today.checked_add_days(Days::new(7))?,
            confidence: CONFIDENCE_NEXT_WEEK,
            start,
            end: start + "next week".len(),
        });
    }

    if let Some(caps) = weekday_regex().captures(text) {
        let whole = caps.get(0)?;
        let has_next = caps.get(1).is_some();
        let target = weekday_from_name(caps.get(2)?.as_str())?;

        // Forward offset in days. A raw offset of zero or less means the
        // weekday already passed this week; "next <day>" always skips ahead.
        let raw = target.num_days_from_monday() as i64
            - reference.weekday().num_days_from_monday() as i64;
        let offset = if has_next || raw <= 0 { raw + 7 } else { raw };

        return Some(DateMatch {
            date: today.checked_add_days(Days::new(offset as u64))?,
            confidence: CONFIDENCE_WEEKDAY,
            start: whole.start(),
            end: whole.end(),
        });
    }

    if let Some(caps) = month_day_regex().captures(text) {
        let whole = caps.get(0)?;
        let month = month_from_name(caps.get(1)?.as_str())?;
        let day: u32 = caps.get(2)?.as_str().parse().ok()?;

        // Day 32 etc. fails here and the whole phrase is a non-match.
        let mut date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
        if date < today {
            date = NaiveDate::from_ymd_opt(today.year() + 1, month, day)?;
        }

        return Some(DateMatch {
            date,
            confidence: CONFIDENCE_MONTH_DAY,
            start: whole.start(),
            end: whole.end(),
        });
    }

    None
}

fn weekday_from_name(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: &[&str] = &[
        "january",
        "february",
        "march",
        "april",
        "may",
        "june",
        "july",
        "august",
        "september",
        "october",
        "november",
        "december",
    ];
    MONTHS.iter().position(|m| *m == name).map(|i| i as u32 + 1)
}
