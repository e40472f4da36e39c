//! Rule-based suggestion engine.
//!
//! Each rule looks at a [`TaskView`] and may emit one suggestion. Rules run in
//! a fixed order and the output keeps that order.

use serde_json::{json, Value};
use tracing::debug;

use crate::models::{Metadata, ParsedTask, Priority, Suggestion, SuggestionKind, TaskRecord};

const HIGH_URGENCY_KEYWORDS: &[&str] = &["urgent", "asap", "immediately", "critical", "emergency", "deadline"];
const LOW_URGENCY_KEYWORDS: &[&str] = &["someday", "eventually", "whenever", "low priority", "no rush"];
/// Phrasing that already signals intent; suppresses the mild priority hint.
const INTENT_PHRASES: &[&str] = &["should", "need to", "have to", "must", "important"];
const TIME_KEYWORDS: &[&str] = &[
    "deadline", "due", "by", "before", "until", "soon", "today", "tomorrow", "tonight", "this week",
    "next week", "end of", "urgent", "asap",
];
const VAGUE_VERBS: &[&str] = &["do", "handle", "deal with", "work on", "check", "look at"];
const COMPLEXITY_KEYWORDS: &[&str] = &["project", "plan", "organize", "setup", "implement", "research", "analyze"];
const CONJUNCTIONS: &[&str] = &["and", "&", "then", "also", "plus"];
const DELEGATION_KEYWORDS: &[&str] = &["team", "meeting", "discuss", "collaborate", "share", "delegate", "assign"];

const MIN_TITLE_CHARS: usize = 15;
const VAGUE_TITLE_CHARS: usize = 25;

/// The task fields the rules look at, borrowed from either a freshly parsed
/// task or a stored one.
#[derive(Debug, Clone, Copy)]
pub struct TaskView<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub priority: Priority,
    pub has_due_date: bool,
}

impl<'a> From<&'a ParsedTask> for TaskView<'a> {
    fn from(task: &'a ParsedTask) -> Self {
        Self {
            title: &task.title,
            description: task.description.as_deref(),
            priority: task.priority,
            has_due_date: task.has_due_date(),
        }
    }
}

impl<'a> From<&'a TaskRecord> for TaskView<'a> {
    fn from(record: &'a TaskRecord) -> Self {
        Self {
            title: &record.title,
            description: record.description.as_deref(),
            priority: record.priority,
            has_due_date: record.due_date.is_some(),
        }
    }
}

/// Suggestions for a parsed task, in rule order.
pub fn suggest(task: &ParsedTask) -> Vec<Suggestion> {
    suggest_for(TaskView::from(task))
}

/// Runs every rule over `task`.
///
/// # Returns
/// At most one suggestion per rule, in the order priority, due date,
/// description, breakdown, reminder, delegation.
pub fn suggest_for(task: TaskView<'_>) -> Vec<Suggestion> {
    let text = combined_text(&task);
    let word_count = text.split_whitespace().count();

    let mut out = Suggestions::default();
    priority_clarification(&task, &text, word_count, &mut out);
    due_date_add(&task, &text, &mut out);
    description_improve(&task, &mut out);
    breakdown(&text, word_count, &mut out);
    reminder(&task, &mut out);
    delegation(&text, &mut out);

    debug!(title = task.title, count = out.items.len(), "generated suggestions");
    out.items
}

/// Collects suggestions, dropping any whose kind and reasoning repeat an
/// earlier one.
#[derive(Default)]
struct Suggestions {
    items: Vec<Suggestion>,
}

impl Suggestions {
    fn push(&mut self, kind: SuggestionKind, text: &str, confidence: f64, reasoning: &str, metadata: Metadata) {
        let duplicate = self
            .items
            .iter()
            .any(|s| s.suggestion_type == kind && s.reasoning == reasoning);
        if duplicate {
            return;
        }
        self.items.push(Suggestion::new(kind, text, confidence, reasoning, metadata));
    }
}

fn metadata<const N: usize>(entries: [(&str, Value); N]) -> Metadata {
    entries.into_iter().map(|(key, value)| (key.to_string(), value)).collect()
}

fn combined_text(task: &TaskView<'_>) -> String {
    match task.description {
        Some(description) => format!("{} {}", task.title, description).to_lowercase(),
        None => task.title.to_lowercase(),
    }
}

/// Whether `term` occurs in `text` with no letter or digit on either side.
pub fn contains_term(text: &str, term: &str) -> bool {
    text.match_indices(term).any(|(start, matched)| {
        let before = text[..start].chars().next_back();
        let after = text[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn found<'k>(text: &str, terms: &[&'k str]) -> Vec<&'k str> {
    terms.iter().copied().filter(|term| contains_term(text, term)).collect()
}

fn conjunction_count(text: &str) -> usize {
    text.split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric() && c != '&'))
        .filter(|token| CONJUNCTIONS.contains(token))
        .count()
}

fn priority_clarification(task: &TaskView<'_>, text: &str, word_count: usize, out: &mut Suggestions) {
    let urgent = found(text, HIGH_URGENCY_KEYWORDS);
    if !urgent.is_empty() && task.priority == Priority::Medium {
        out.push(
            SuggestionKind::PriorityClarification,
            "Consider raising the priority to high",
            0.8,
            "Urgency keywords were found but the priority is medium",
            metadata([
                ("urgency_keywords_found", json!(urgent)),
                ("current_priority", json!(task.priority.as_str())),
                ("suggested_priority", json!("high")),
            ]),
        );
        return;
    }

    let has_cues = !urgent.is_empty() || !found(text, LOW_URGENCY_KEYWORDS).is_empty();
    if !has_cues && found(text, INTENT_PHRASES).is_empty() && word_count < 5 {
        out.push(
            SuggestionKind::PriorityClarification,
            "Consider specifying the priority level more clearly",
            0.5,
            "Brief task with no priority cues",
            metadata([("word_count", json!(word_count))]),
        );
    }
}

fn due_date_add(task: &TaskView<'_>, text: &str, out: &mut Suggestions) {
    if task.has_due_date {
        return;
    }
    let time_keywords = found(text, TIME_KEYWORDS);
    if !time_keywords.is_empty() {
        out.push(
            SuggestionKind::DueDateAdd,
            "Consider adding a due date for better planning",
            0.8,
            "The task sounds time-sensitive but has no due date",
            metadata([("time_keywords_found", json!(time_keywords))]),
        );
    } else if task.priority == Priority::High {
        out.push(
            SuggestionKind::DueDateAdd,
            "High-priority tasks are easier to plan with a due date",
            0.7,
            "High priority without a due date",
            metadata([("current_priority", json!(task.priority.as_str()))]),
        );
    }
}

fn description_improve(task: &TaskView<'_>, out: &mut Suggestions) {
    let title_length = task.title.chars().count();
    if title_length < MIN_TITLE_CHARS {
        out.push(
            SuggestionKind::DescriptionImprove,
            "Add more detail so the task is clear at a glance",
            0.7,
            "The title is very short",
            metadata([
                ("title_length", json!(title_length)),
                ("improvement_type", json!("length")),
                ("suggested_min_length", json!(20)),
            ]),
        );
        return;
    }

    if task.description.is_none() && title_length < VAGUE_TITLE_CHARS {
        let vague = found(&task.title.to_lowercase(), VAGUE_VERBS);
        if !vague.is_empty() {
            out.push(
                SuggestionKind::DescriptionImprove,
                "Say exactly what needs to happen instead of a generic verb",
                0.8,
                "The title relies on vague verbs",
                metadata([
                    ("title_length", json!(title_length)),
                    ("improvement_type", json!("specificity")),
                    ("vague_verbs_found", json!(vague)),
                    (
                        "suggestion_examples",
                        json!(["What is the concrete outcome?", "What is the first step?"]),
                    ),
                ]),
            );
        }
    }
}

fn breakdown(text: &str, word_count: usize, out: &mut Suggestions) {
    let complexity = found(text, COMPLEXITY_KEYWORDS);
    let conjunctions = conjunction_count(text);
    if (!complexity.is_empty() || conjunctions >= 2) && word_count > 8 {
        out.push(
            SuggestionKind::Breakdown,
            "Consider breaking this into smaller subtasks",
            0.7,
            "The task looks like it has several parts",
            metadata([
                ("complexity_indicators", json!(complexity)),
                ("conjunction_count", json!(conjunctions)),
                ("word_count", json!(word_count)),
            ]),
        );
    }
}

fn reminder(task: &TaskView<'_>, out: &mut Suggestions) {
    if task.has_due_date {
        out.push(
            SuggestionKind::Reminder,
            "Set a reminder one day before the due date",
            0.6,
            "The task has a due date",
            metadata([
                ("suggested_reminder_days_before", json!(1)),
                ("reminder_type", json!("due_date_based")),
            ]),
        );
    } else if task.priority == Priority::High {
        out.push(
            SuggestionKind::Reminder,
            "Set a daily reminder until this is done",
            0.5,
            "High priority without a due date",
            metadata([
                ("suggested_reminder_frequency", json!("daily")),
                ("reminder_type", json!("priority_based")),
            ]),
        );
    }
}

fn delegation(text: &str, out: &mut Suggestions) {
    let matched = found(text, DELEGATION_KEYWORDS);
    if matched.is_empty() {
        return;
    }
    let delegation_type = if matched.contains(&"collaborate") { "collaborative" } else { "assignable" };
    let complexity = if matched.len() > 2 { "high" } else { "medium" };
    out.push(
        SuggestionKind::Delegation,
        "This task might be shared or delegated",
        0.5,
        "The task mentions other people or teamwork",
        metadata([
            ("delegation_indicators", json!(matched)),
            ("suggested_delegation_type", json!(delegation_type)),
            ("teamwork_complexity", json!(complexity)),
        ]),
    );
}
