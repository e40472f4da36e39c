//! The extraction pipeline: raw text in, [`ParsedTask`] out.

use std::sync::LazyLock;

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use tracing::{debug, warn};

use crate::annotate::{Annotation, Annotator, LexiconAnnotator};
use crate::confidence::compute_confidence;
use crate::dates::{self, DateResolver};
use crate::duration::estimate_minutes;
use crate::extract::{extract_category, extract_description, extract_priority, extract_title};
use crate::models::{ParseContext, ParsedTask, StructuredDate};

static DATE_WORDS: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r"\b(?:today|tomorrow|tonight|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b") {
        Ok(regex) => regex,
        Err(err) => panic!("date word pattern is invalid: {err}"),
    }
});

/// Turns free-text task descriptions into structured tasks.
///
/// Holds the annotation provider; everything else is stateless, so one parser
/// can serve any number of concurrent callers.
pub struct TaskParser {
    annotator: Box<dyn Annotator>,
}

impl Default for TaskParser {
    fn default() -> Self {
        Self::new(LexiconAnnotator)
    }
}

impl TaskParser {
    pub fn new(annotator: impl Annotator + 'static) -> Self {
        Self { annotator: Box::new(annotator) }
    }

    /// Parses `input`, anchoring relative dates at the context timestamp when
    /// it is valid and at the current local time otherwise.
    pub fn parse(&self, input: &str, context: Option<&ParseContext>) -> ParsedTask {
        let reference = context
            .and_then(ParseContext::reference_time)
            .unwrap_or_else(|| Local::now().naive_local());
        self.parse_at(input, reference)
    }

    /// Parses `input` with a fixed reference instant. Same input and instant
    /// always give the same result.
    pub fn parse_at(&self, input: &str, reference: NaiveDateTime) -> ParsedTask {
        let text = input.trim();
        if text.is_empty() {
            return ParsedTask::empty(text);
        }

        let annotation = match self.annotator.annotate(text) {
            Ok(annotation) => Some(annotation),
            Err(err) => {
                warn!(error = %err, "annotation unavailable, using pattern-only extraction");
                None
            }
        };

        let title = extract_title(text);
        let description = extract_description(text);
        let priority = extract_priority(text);
        let category = extract_category(text);
        let due_date = best_due_date(text, annotation.as_ref(), &DateResolver::new(reference));
        let confidence = compute_confidence(text, annotation.as_ref());
        let estimated_duration_minutes = Some(estimate_minutes(&title, description.as_deref(), priority));

        debug!(
            %title,
            %priority,
            category = category.map(|c| c.as_str()),
            due = due_date.as_ref().and_then(|d| d.parsed()),
            confidence,
            "parsed task"
        );

        ParsedTask {
            title,
            description,
            priority,
            due_date,
            category,
            estimated_duration_minutes,
            confidence,
            raw_input: text.to_string(),
        }
    }
}

/// Date-like fragments of `text`: annotated DATE/TIME spans, then every table
/// pattern match, then literal date words. Duplicates are dropped.
pub fn date_candidates(text: &str, annotation: Option<&Annotation>) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut candidates: Vec<String> = Vec::new();

    let entities = annotation.into_iter().flat_map(|a| a.temporal_entities().map(|e| e.text.clone()));
    let matches = dates::table_matches(&lower).into_iter().map(str::to_string);
    let words = DATE_WORDS.find_iter(&lower).map(|m| m.as_str().to_string());

    for candidate in entities.chain(matches).chain(words) {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    }
    candidates
}

/// Resolves every candidate and keeps the most confident one. Ties keep the
/// earliest candidate.
fn best_due_date(text: &str, annotation: Option<&Annotation>, resolver: &DateResolver) -> Option<StructuredDate> {
    let mut best: Option<StructuredDate> = None;
    for candidate in date_candidates(text, annotation) {
        let resolved = resolver.resolve(&candidate);
        if !resolved.is_resolved() {
            continue;
        }
        if best.as_ref().map_or(true, |b| resolved.confidence() > b.confidence()) {
            debug!(candidate = %candidate, parsed = resolved.parsed(), "due date candidate");
            best = Some(resolved);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{Entity, EntityLabel, NoAnnotator};
    use crate::error::AnnotateError;
    use crate::models::{Category, Precision, Priority};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn test_empty_input_short_circuits() {
        let task = TaskParser::default().parse_at("   ", reference());
        assert_eq!(task.title, "");
        assert_eq!(task.confidence, 0.0);
        assert_eq!(task.estimated_duration_minutes, None);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn test_scenario_urgent_call() {
        let task = TaskParser::default().parse_at("urgent: call client tomorrow", reference());
        assert_eq!(task.title, "call client");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.category, Some(Category::Work));
        let due = task.due_date.expect("due date");
        assert_eq!(due.parsed(), Some("2024-01-11"));
        assert_eq!(due.precision(), Some(Precision::Day));
        assert_eq!(task.raw_input, "urgent: call client tomorrow");
        assert_eq!(task.description, None);
    }

    #[test]
    fn test_annotation_failure_degrades_to_patterns() {
        let task = TaskParser::new(NoAnnotator).parse_at("urgent: call client tomorrow", reference());
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date.and_then(|d| d.parsed().map(str::to_string)), Some("2024-01-11".to_string()));
        // length and keyword terms only
        assert!((task.confidence - (28.0 / 50.0 * 0.2 + 0.3 / 16.0)).abs() < 1e-9);
    }

    #[test]
    fn test_failing_annotator_matches_disabled_one() {
        let crashing = |_: &str| -> Result<Annotation, AnnotateError> { Err(AnnotateError::Failed("model crashed".into())) };
        let input = "pay the electricity bill next monday";
        let task = TaskParser::new(crashing).parse_at(input, reference());
        assert_eq!(task, TaskParser::new(NoAnnotator).parse_at(input, reference()));
        assert_eq!(task.category, Some(Category::Finance));
    }

    #[test]
    fn test_entity_spans_are_tried_first() {
        let annotator = |_: &str| -> Result<Annotation, AnnotateError> {
            Ok(Annotation {
                entities: vec![Entity { text: "march 5th".into(), label: EntityLabel::Date }],
                tokens: vec![],
            })
        };
        // the entity only resolves through the fallback (0.6); "friday" from
        // the table beats it at 0.8
        let task = TaskParser::new(annotator).parse_at("dentist march 5th or friday", reference());
        assert_eq!(task.due_date.unwrap().parsed(), Some("2024-01-12"));
    }

    #[test]
    fn test_equal_confidence_keeps_first_candidate() {
        let task = TaskParser::new(NoAnnotator).parse_at("move desk friday or next monday", reference());
        // "next monday" comes first in table order
        assert_eq!(task.due_date.unwrap().parsed(), Some("2024-01-15"));
    }

    #[test]
    fn test_no_date_means_no_due_date() {
        let task = TaskParser::default().parse_at("water the plants", reference());
        assert_eq!(task.due_date, None);
        assert_eq!(task.estimated_duration_minutes, Some(72));
    }

    #[test]
    fn test_context_timestamp_anchors_dates() {
        let parser = TaskParser::default();
        let context = ParseContext::at("2024-01-10T09:00:00Z");
        let task = parser.parse("pay rent tomorrow", Some(&context));
        assert_eq!(task.due_date.unwrap().parsed(), Some("2024-01-11"));
    }

    #[test]
    fn test_candidates_order_and_dedup() {
        let annotation = LexiconAnnotator.annotate("call mom tomorrow at 5pm").unwrap();
        let candidates = date_candidates("call mom tomorrow at 5pm", Some(&annotation));
        assert_eq!(candidates, vec!["tomorrow", "5pm", "at 5pm"]);
    }
}
