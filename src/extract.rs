//! Keyword-table extractors for title, description, priority and category.
//!
//! Every function here is pure: it looks only at its input and the static
//! tables below.

use std::sync::LazyLock;

use regex::Regex;

use crate::dates;
use crate::models::{Category, Priority};

/// Longest title kept, in characters.
pub const TITLE_MAX_CHARS: usize = 100;
/// Inputs longer than this (in characters) keep the full text as description.
pub const DESCRIPTION_THRESHOLD: usize = 100;

/// Priority tiers, checked in this order.
pub const PRIORITY_KEYWORDS: [(Priority, &[&str]); 3] = [
    (
        Priority::High,
        &["urgent", "asap", "immediately", "critical", "emergency", "high priority", "important"],
    ),
    (Priority::Medium, &["soon", "medium priority", "moderate", "normal"]),
    (
        Priority::Low,
        &["someday", "eventually", "low priority", "when possible", "nice to have"],
    ),
];

/// Checked only when no tier keyword matched; any hit means high priority.
pub const URGENCY_INDICATORS: [&str; 5] = ["!", "urgent", "asap", "now", "immediately"];

/// Category tables in declaration order. Ties go to the earlier table.
pub const CATEGORY_KEYWORDS: [(Category, &[&str]); 6] = [
    (
        Category::Work,
        &["work", "office", "meeting", "project", "client", "business", "professional"],
    ),
    (Category::Personal, &["personal", "home", "family", "self", "health", "exercise"]),
    (Category::Shopping, &["buy", "purchase", "shop", "get", "pick up", "order"]),
    (
        Category::Finance,
        &["pay", "bill", "invoice", "money", "bank", "budget", "expense"],
    ),
    (
        Category::Learning,
        &["learn", "study", "course", "tutorial", "practice", "research"],
    ),
    (
        Category::Social,
        &["call", "email", "text", "message", "contact", "friend", "social"],
    ),
];

fn compile(src: &str) -> Regex {
    match Regex::new(src) {
        Ok(regex) => regex,
        Err(err) => panic!("extractor pattern '{src}' is invalid: {err}"),
    }
}

static FILLER_PREFIXES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        compile(r"(?i)^(?:task|todo|need to|have to|must|should|remember to):?\s+"),
        compile(r"(?i)^(?:i need to|i have to|i must|i should)\s+"),
    ]
});

static PRIORITY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    PRIORITY_KEYWORDS
        .iter()
        .flat_map(|(_, keywords)| keywords.iter())
        .map(|keyword| compile(&format!(r"(?i)\b{}\b", regex::escape(keyword))))
        .collect()
});

/// Deadline phrasing removed from titles on top of the resolver's own table.
static TITLE_DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\b(?:by|due|before|until)\s+(?:\w+day|\d{1,2}[/-]\d{1,2}(?:[/-]\d{2,4})?)\b",
        r"(?i)\bin\s+\d+\s+(?:days?|weeks?|months?)\b",
        r"(?i)\bnext\s+(?:week|month|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
        r"(?i)\b(?:tomorrow|today|tonight)\b",
        r"\b\d{1,2}[/-]\d{1,2}(?:[/-]\d{2,4})?\b",
        r"(?i)\b(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\w*\s+\d{1,2}\b",
    ]
    .into_iter()
    .map(compile)
    .collect()
});

/// The resolver's table, matched without regard to case.
static RESOLVER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    dates::table_patterns()
        .map(|date| compile(&format!("(?i){}", date.as_str())))
        .collect()
});

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Cleans the input down to an actionable title.
///
/// Leading filler ("need to", "todo", ...), priority keywords and date
/// expressions are removed. When nothing is left the first 100 characters of
/// the input are used instead.
pub fn extract_title(text: &str) -> String {
    let text = text.trim();
    let mut clean = text.to_string();

    for prefix in FILLER_PREFIXES.iter() {
        clean = prefix.replace(&clean, "").into_owned();
    }
    for keyword in PRIORITY_PATTERNS.iter() {
        clean = keyword.replace_all(&clean, "").into_owned();
    }
    for date in TITLE_DATE_PATTERNS.iter() {
        clean = date.replace_all(&clean, "").into_owned();
    }
    for date in RESOLVER_PATTERNS.iter() {
        clean = date.replace_all(&clean, "").into_owned();
    }

    let collapsed = clean.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches(|c: char| matches!(c, ':' | ';' | ',' | '-') || c.is_whitespace());

    if trimmed.is_empty() {
        truncate_chars(text, TITLE_MAX_CHARS)
    } else {
        truncate_chars(trimmed, TITLE_MAX_CHARS)
    }
}

/// The full input when it is longer than 100 characters.
pub fn extract_description(text: &str) -> Option<String> {
    let text = text.trim();
    (text.chars().count() > DESCRIPTION_THRESHOLD).then(|| text.to_string())
}

/// First tier whose keyword occurs in the text; then urgency markers; else medium.
pub fn extract_priority(text: &str) -> Priority {
    let lower = text.to_lowercase();

    for (priority, keywords) in PRIORITY_KEYWORDS {
        if keywords.iter().any(|keyword| lower.contains(keyword)) {
            return priority;
        }
    }

    if URGENCY_INDICATORS.iter().any(|indicator| lower.contains(indicator)) {
        return Priority::High;
    }

    Priority::Medium
}

/// Category with the most distinct keyword hits, or `None` when nothing hits.
pub fn extract_category(text: &str) -> Option<Category> {
    let lower = text.to_lowercase();
    let mut best = None;
    let mut best_score = 0;

    for (category, keywords) in CATEGORY_KEYWORDS {
        let score = keywords.iter().filter(|keyword| lower.contains(*keyword)).count();
        if score > best_score {
            best = Some(category);
            best_score = score;
        }
    }

    best
}

/// Number of priority keywords (all tiers) occurring in the text.
pub fn matched_priority_keywords(text: &str) -> usize {
    let lower = text.to_lowercase();
    PRIORITY_KEYWORDS
        .iter()
        .flat_map(|(_, keywords)| keywords.iter())
        .filter(|keyword| lower.contains(*keyword))
        .count()
}

pub fn total_priority_keywords() -> usize {
    PRIORITY_KEYWORDS.iter().map(|(_, keywords)| keywords.len()).sum()
}
