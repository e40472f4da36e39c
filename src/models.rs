use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// Free-form metadata attached to a suggestion.
pub type Metadata = Map<String, Value>;

/// Priority level of a task.
#[derive(Serialize, Deserialize, clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(Error::UnknownVariant { kind: "priority", value: other.to_string() }),
        }
    }
}

/// Category a task belongs to.
///
/// The declaration order is significant: [`Category::ALL`] follows it and
/// category ties are broken in favour of the earlier entry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Work,
    Personal,
    Shopping,
    Finance,
    Learning,
    Social,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Personal,
        Category::Shopping,
        Category::Finance,
        Category::Learning,
        Category::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Shopping => "shopping",
            Category::Finance => "finance",
            Category::Learning => "learning",
            Category::Social => "social",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or(Error::UnknownVariant { kind: "category", value: wanted })
    }
}

/// How precisely a resolved date pins down a point in time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// Date and time of day.
    Exact,
    /// Calendar day, normalized to midnight.
    Day,
    /// Week-scale relative offset.
    Week,
    /// Month-scale relative offset (30 days per month).
    Month,
    /// Sub-day relative offset that is not otherwise exact.
    Relative,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Exact => "exact",
            Precision::Day => "day",
            Precision::Week => "week",
            Precision::Month => "month",
            Precision::Relative => "relative",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A natural-language date fragment and its resolution.
///
/// `parsed` and `precision` are either both present or both absent; the
/// constructors are the only way to build one.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StructuredDate {
    raw: String,
    parsed: Option<String>,
    precision: Option<Precision>,
    confidence: f64,
    #[serde(skip)]
    value: Option<NaiveDateTime>,
}

impl StructuredDate {
    /// A successfully resolved date. Day precision serializes as a bare
    /// `YYYY-MM-DD`, everything else as an ISO date-time.
    pub fn resolved(raw: impl Into<String>, value: NaiveDateTime, precision: Precision, confidence: f64) -> Self {
        let parsed = match precision {
            Precision::Day => value.format("%Y-%m-%d").to_string(),
            _ => value.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        };
        Self {
            raw: raw.into(),
            parsed: Some(parsed),
            precision: Some(precision),
            confidence,
            value: Some(value),
        }
    }

    /// No interpretable expression was found.
    pub fn unresolved(raw: impl Into<String>) -> Self {
        Self { raw: raw.into(), parsed: None, precision: None, confidence: 0.0, value: None }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn parsed(&self) -> Option<&str> {
        self.parsed.as_deref()
    }

    pub fn precision(&self) -> Option<Precision> {
        self.precision
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn value(&self) -> Option<NaiveDateTime> {
        self.value
    }

    pub fn is_resolved(&self) -> bool {
        self.parsed.is_some()
    }
}

/// Structured attributes extracted from one free-text task description.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ParsedTask {
    /// Cleaned task title, at most 100 characters.
    pub title: String,
    /// The full input, only when it is longer than 100 characters.
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<StructuredDate>,
    pub category: Option<Category>,
    /// Estimated completion time in minutes, at least 30.
    pub estimated_duration_minutes: Option<u32>,
    /// Heuristic score in `[0, 1]`.
    pub confidence: f64,
    /// The input, trimmed.
    pub raw_input: String,
}

impl ParsedTask {
    /// Result for empty or whitespace-only input.
    pub fn empty(raw_input: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            description: None,
            priority: Priority::Medium,
            due_date: None,
            category: None,
            estimated_duration_minutes: None,
            confidence: 0.0,
            raw_input: raw_input.into(),
        }
    }

    pub fn has_due_date(&self) -> bool {
        self.due_date.as_ref().is_some_and(StructuredDate::is_resolved)
    }
}

/// Kind of improvement a [`Suggestion`] proposes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    PriorityClarification,
    DueDateAdd,
    DescriptionImprove,
    Breakdown,
    Reminder,
    Delegation,
}

impl SuggestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionKind::PriorityClarification => "priority_clarification",
            SuggestionKind::DueDateAdd => "due_date_add",
            SuggestionKind::DescriptionImprove => "description_improve",
            SuggestionKind::Breakdown => "breakdown",
            SuggestionKind::Reminder => "reminder",
            SuggestionKind::Delegation => "delegation",
        }
    }
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed recommendation for improving a task.
///
/// `metadata` is always a mapping; a `null` in serialized input is read back
/// as an empty mapping.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub suggestion_type: SuggestionKind,
    pub suggestion: String,
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default, deserialize_with = "metadata_or_empty")]
    pub metadata: Metadata,
}

impl Suggestion {
    pub fn new(
        suggestion_type: SuggestionKind,
        suggestion: impl Into<String>,
        confidence: f64,
        reasoning: impl Into<String>,
        metadata: Metadata,
    ) -> Self {
        Self {
            suggestion_type,
            suggestion: suggestion.into(),
            confidence,
            reasoning: reasoning.into(),
            metadata,
        }
    }
}

fn metadata_or_empty<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}

/// A task supplied by an external store, reviewed without re-parsing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskRecord {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDateTime>,
}

/// Optional per-call context for [`crate::parser::TaskParser::parse`].
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ParseContext {
    /// ISO 8601 instant used as the reference for relative dates.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ParseContext {
    pub fn at(timestamp: impl Into<String>) -> Self {
        Self { timestamp: Some(timestamp.into()) }
    }

    /// The reference instant carried by this context, if it parses.
    ///
    /// A malformed timestamp is logged and ignored.
    pub fn reference_time(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.as_deref()?;
        let parsed = crate::dates::parse_timestamp(raw);
        if parsed.is_none() {
            tracing::warn!(timestamp = raw, "ignoring malformed context timestamp");
        }
        parsed
    }
}
