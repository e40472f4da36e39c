//! Natural-language date resolution.
//!
//! A fixed, ordered table of patterns is tried against the lower-cased input.
//! The first pattern that matches *and* whose interpreter yields a date wins;
//! later patterns are never consulted once one succeeds. When nothing in the
//! table applies, a lenient fuzzy parser looks for month names and ISO dates,
//! filling missing fields from the reference instant.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use regex::{Captures, Regex};
use tracing::debug;

use crate::models::{Precision, StructuredDate};

/// Confidence reported for a match from the pattern table.
pub const TABLE_CONFIDENCE: f64 = 0.8;
/// Confidence reported for a match from the fuzzy fallback.
pub const FALLBACK_CONFIDENCE: f64 = 0.6;

const WEEKDAYS: [&str; 7] = ["monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday"];
const MONTHS: [&str; 12] = ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];

type Interpreter = fn(&Captures, NaiveDateTime) -> Option<(NaiveDateTime, Precision)>;

fn pattern(src: &str) -> Regex {
    match Regex::new(src) {
        Ok(regex) => regex,
        Err(err) => panic!("date pattern '{src}' is invalid: {err}"),
    }
}

/// Ordered (pattern, interpreter) table. Order is priority.
static TABLE: LazyLock<Vec<(Regex, Interpreter)>> = LazyLock::new(|| {
    vec![
        (
            pattern(r"\b(?P<modifier>next|this)\s+(?P<day>monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b"),
            weekday as Interpreter,
        ),
        (pattern(r"\b(?P<day>monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b"), weekday as Interpreter),
        (pattern(r"\b(?P<word>today|tomorrow|tonight)\b"), relative_day as Interpreter),
        (
            pattern(r"\bin\s+(?P<amount>\d+)\s+(?P<unit>days?|weeks?|months?|hours?|minutes?)\b"),
            relative_offset as Interpreter,
        ),
        (
            pattern(r"\b(?P<amount>\d+)\s+(?P<unit>days?|weeks?|months?)\s+(?:from\s+now|later)\b"),
            relative_offset as Interpreter,
        ),
        (pattern(r"\b(?P<first>\d{1,2})[/\-](?P<second>\d{1,2})[/\-](?P<year>\d{2,4})\b"), numeric_date as Interpreter),
        (
            pattern(r"\b(?P<day>\d{1,2})\s+(?P<month>jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\b"),
            month_day as Interpreter,
        ),
        (pattern(r"\bat\s+(?P<hour>\d{1,2}):?(?P<minute>\d{2})?\s*(?P<meridiem>am|pm)?\b"), clock_time as Interpreter),
        (pattern(r"\b(?P<hour>\d{1,2})\s*(?P<meridiem>am|pm)\b"), clock_time as Interpreter),
    ]
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\b(?P<year>\d{4})[-/](?P<month>\d{1,2})[-/](?P<day>\d{1,2})\b"));

const MONTH_NAME: &str =
    r"(?P<month>jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

static MONTH_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"\b{MONTH_NAME}\b(?:\s+(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\b)?(?:,?\s+(?P<year>\d{{4}})\b)?"
    ))
});

static DAY_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    pattern(&format!(
        r"\b(?P<day>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTH_NAME}\b(?:,?\s+(?P<year>\d{{4}})\b)?"
    ))
});

static ORDINAL_DAY: LazyLock<Regex> = LazyLock::new(|| pattern(r"\b(?:the\s+)?(?P<day>\d{1,2})(?:st|nd|rd|th)\b"));

/// Resolves date fragments against a fixed reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateResolver {
    reference: NaiveDateTime,
}

impl DateResolver {
    pub fn new(reference: NaiveDateTime) -> Self {
        Self { reference }
    }

    /// Anchored at the current local time.
    pub fn now() -> Self {
        Self::new(Local::now().naive_local())
    }

    pub fn reference(&self) -> NaiveDateTime {
        self.reference
    }

    /// Resolves `text` into a [`StructuredDate`].
    ///
    /// Table matches report confidence 0.8, fuzzy fallback matches 0.6, and
    /// an uninterpretable fragment yields an unresolved date with 0.0.
    pub fn resolve(&self, text: &str) -> StructuredDate {
        let lower = text.trim().to_lowercase();
        if lower.is_empty() {
            return StructuredDate::unresolved(text);
        }

        for (regex, interpret) in TABLE.iter() {
            let Some(caps) = regex.captures(&lower) else { continue };
            match interpret(&caps, self.reference) {
                Some((value, precision)) => {
                    return StructuredDate::resolved(text, value, precision, TABLE_CONFIDENCE);
                }
                None => debug!(text, pattern = regex.as_str(), "date pattern matched but did not interpret"),
            }
        }

        match fuzzy_date(&lower, self.reference) {
            Some(date) => StructuredDate::resolved(text, midnight(date), Precision::Day, FALLBACK_CONFIDENCE),
            None => {
                debug!(text, "could not parse date");
                StructuredDate::unresolved(text)
            }
        }
    }
}

/// Resolves `text` against `reference`, or against the current local time
/// when no reference is given.
pub fn resolve(text: &str, reference: Option<NaiveDateTime>) -> StructuredDate {
    reference.map(DateResolver::new).unwrap_or_else(DateResolver::now).resolve(text)
}

/// Every substring of `text` matched by any table pattern, in table order.
pub fn table_matches(text: &str) -> Vec<&str> {
    TABLE
        .iter()
        .flat_map(|(regex, _)| regex.find_iter(text).map(|m| m.as_str()))
        .collect()
}

/// The table patterns themselves, for callers that strip date expressions.
pub fn table_patterns() -> impl Iterator<Item = &'static Regex> {
    TABLE.iter().map(|(regex, _)| regex)
}

/// Parses an ISO 8601 timestamp.
///
/// Offsets (`Z`, `+02:00`) are accepted and the wall-clock time in that
/// offset is kept. A bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(midnight)
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn number<T: std::str::FromStr>(caps: &Captures, name: &str) -> Option<T> {
    caps.name(name)?.as_str().parse().ok()
}

fn weekday(caps: &Captures, reference: NaiveDateTime) -> Option<(NaiveDateTime, Precision)> {
    let modifier = caps.name("modifier").map(|m| m.as_str());
    let day = caps.name("day")?.as_str();
    let target = WEEKDAYS.iter().position(|d| *d == day)? as i64;
    let current = reference.weekday().num_days_from_monday() as i64;

    let mut days_ahead = target - current;
    if modifier == Some("next") || (modifier.is_none() && target <= current) {
        if days_ahead <= 0 {
            days_ahead += 7;
        }
    } else if days_ahead < 0 {
        days_ahead += 7;
    }

    let date = reference.date().checked_add_signed(Duration::days(days_ahead))?;
    Some((midnight(date), Precision::Day))
}

fn relative_day(caps: &Captures, reference: NaiveDateTime) -> Option<(NaiveDateTime, Precision)> {
    match caps.name("word")?.as_str() {
        "today" => Some((midnight(reference.date()), Precision::Day)),
        "tomorrow" => Some((midnight(reference.date().succ_opt()?), Precision::Day)),
        "tonight" => Some((reference.with_hour(20)?.with_minute(0)?, Precision::Exact)),
        _ => None,
    }
}

fn relative_offset(caps: &Captures, reference: NaiveDateTime) -> Option<(NaiveDateTime, Precision)> {
    let amount: i64 = number(caps, "amount")?;
    let unit = caps.name("unit")?.as_str().trim_end_matches('s');

    match unit {
        "day" => {
            let target = reference.checked_add_signed(Duration::try_days(amount)?)?;
            Some((midnight(target.date()), Precision::Day))
        }
        "week" => {
            let target = reference.checked_add_signed(Duration::try_weeks(amount)?)?;
            Some((midnight(target.date()), Precision::Week))
        }
        "month" => {
            // 30-day months, not calendar months
            let target = reference.checked_add_signed(Duration::try_days(amount.checked_mul(30)?)?)?;
            Some((midnight(target.date()), Precision::Month))
        }
        "hour" => Some((reference.checked_add_signed(Duration::try_hours(amount)?)?, Precision::Exact)),
        "minute" => Some((reference.checked_add_signed(Duration::try_minutes(amount)?)?, Precision::Exact)),
        _ => None,
    }
}

fn numeric_date(caps: &Captures, _reference: NaiveDateTime) -> Option<(NaiveDateTime, Precision)> {
    let first: u32 = number(caps, "first")?;
    let second: u32 = number(caps, "second")?;
    let mut year: i32 = number(caps, "year")?;
    if year < 100 {
        year += if year < 50 { 2000 } else { 1900 };
    }

    // US month/day first, day/month when that is not a real date
    let date = NaiveDate::from_ymd_opt(year, first, second).or_else(|| NaiveDate::from_ymd_opt(year, second, first))?;
    Some((midnight(date), Precision::Day))
}

fn month_day(caps: &Captures, reference: NaiveDateTime) -> Option<(NaiveDateTime, Precision)> {
    let day: u32 = number(caps, "day")?;
    let name = caps.name("month")?.as_str();
    let month = MONTHS.iter().position(|m| *m == name)? as u32 + 1;

    let year = reference.year();
    let mut target = midnight(NaiveDate::from_ymd_opt(year, month, day)?);
    if target < reference {
        target = midnight(NaiveDate::from_ymd_opt(year + 1, month, day)?);
    }
    Some((target, Precision::Day))
}

fn clock_time(caps: &Captures, reference: NaiveDateTime) -> Option<(NaiveDateTime, Precision)> {
    let mut hour: u32 = number(caps, "hour")?;
    let minute: u32 = match caps.name("minute") {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    match caps.name("meridiem").map(|m| m.as_str()) {
        Some("pm") if hour != 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some((reference.date().and_time(time), Precision::Exact))
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?;
    MONTHS.iter().position(|m| *m == prefix).map(|i| i as u32 + 1)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

/// Builds a date from optional parts, defaulting missing ones from
/// `reference`. A defaulted day is clamped to the month's length.
fn assemble(year: Option<i32>, month: Option<u32>, day: Option<u32>, reference: NaiveDateTime) -> Option<NaiveDate> {
    let year = year.unwrap_or(reference.year());
    let month = month.unwrap_or(reference.month());
    let day = match day {
        Some(day) => day,
        None => reference.day().min(days_in_month(year, month)),
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Lenient fallback for fragments the table does not cover, such as
/// "march 5th", "5 september 2025" or "2025-03-05".
fn fuzzy_date(text: &str, reference: NaiveDateTime) -> Option<NaiveDate> {
    if let Some(caps) = ISO_DATE.captures(text) {
        if let Some(date) = assemble(number(&caps, "year"), number(&caps, "month"), number(&caps, "day"), reference) {
            return Some(date);
        }
    }

    for regex in [&*DAY_FIRST, &*MONTH_FIRST] {
        for caps in regex.captures_iter(text) {
            let Some(name) = caps.name("month") else { continue };
            let day: Option<u32> = number(&caps, "day");
            let year: Option<i32> = number(&caps, "year");
            // a lone "may" is far more often the verb
            if name.as_str() == "may" && day.is_none() && year.is_none() {
                continue;
            }
            if let Some(date) = assemble(year, month_number(name.as_str()), day, reference) {
                return Some(date);
            }
        }
    }

    let caps = ORDINAL_DAY.captures(text)?;
    assemble(None, None, number(&caps, "day"), reference)
}
