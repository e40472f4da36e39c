//! Linguistic annotation: entity spans and part-of-speech tags.
//!
//! The pipeline only consumes an [`Annotation`]; where it comes from is up to
//! the [`Annotator`] plugged into the parser. [`LexiconAnnotator`] is a small
//! deterministic tagger good enough for short task descriptions.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AnnotateError;

/// Entity type tag.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityLabel {
    Date,
    Time,
    Person,
    Org,
    Other,
}

/// Coarse part-of-speech tag.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosTag {
    Verb,
    Noun,
    Num,
    Punct,
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: EntityLabel,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub pos: PosTag,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub entities: Vec<Entity>,
    pub tokens: Vec<Token>,
}

impl Annotation {
    /// Entities carrying date or time information.
    pub fn temporal_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .filter(|e| matches!(e.label, EntityLabel::Date | EntityLabel::Time))
    }

    pub fn verb_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.pos == PosTag::Verb).count()
    }
}

/// Tokenizer and entity tagger consumed by the parser.
pub trait Annotator: Send + Sync {
    fn annotate(&self, text: &str) -> Result<Annotation, AnnotateError>;
}

impl<F> Annotator for F
where
    F: Fn(&str) -> Result<Annotation, AnnotateError> + Send + Sync,
{
    fn annotate(&self, text: &str) -> Result<Annotation, AnnotateError> {
        self(text)
    }
}

/// Always unavailable; forces pattern-only extraction.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAnnotator;

impl Annotator for NoAnnotator {
    fn annotate(&self, _text: &str) -> Result<Annotation, AnnotateError> {
        Err(AnnotateError::Unavailable("annotation disabled".into()))
    }
}

const VERBS: &[&str] = &[
    "analyze", "ask", "assign", "attend", "book", "bring", "buy", "call", "cancel", "check", "clean",
    "collaborate", "complete", "deal", "delegate", "design", "develop", "discuss", "do", "draft", "email",
    "file", "finish", "fix", "follow", "get", "go", "handle", "have", "implement", "learn", "look", "make",
    "meet", "need", "order", "organize", "pay", "pick", "plan", "practice", "prepare", "purchase", "read",
    "remember", "renew", "reply", "research", "return", "review", "schedule", "send", "set", "share",
    "study", "submit", "text", "update", "visit", "work", "write",
];

const NOUNS: &[&str] = &[
    "appointment", "bill", "client", "course", "dentist", "doctor", "email", "friend", "groceries", "invoice",
    "meeting", "milk", "presentation", "project", "report", "slides", "task", "team",
];

/// All-caps words that are not organizations.
const NOT_ORGS: &[&str] = &["AM", "ASAP", "EOD", "ETA", "FYI", "OK", "PM", "TODO"];

const CALENDAR_WORDS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "january", "february",
    "march", "april", "may", "june", "july", "august", "september", "october", "november", "december",
];

fn compile(src: &str) -> Regex {
    match Regex::new(src) {
        Ok(regex) => regex,
        Err(err) => panic!("annotation pattern '{src}' is invalid: {err}"),
    }
}

static TOKEN: LazyLock<Regex> = LazyLock::new(|| compile(r"\w+(?:'\w+)?|[^\w\s]"));

static SPANS: LazyLock<Vec<(Regex, EntityLabel)>> = LazyLock::new(|| {
    const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";
    vec![
        (compile(r"(?i)\b(?:(?:next|this)\s+)?(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b"), EntityLabel::Date),
        (compile(r"(?i)\b(?:today|tomorrow|yesterday)\b"), EntityLabel::Date),
        (compile(r"(?i)\b(?:next|this)\s+(?:week|month|year)\b"), EntityLabel::Date),
        (compile(r"(?i)\bin\s+\d+\s+(?:days?|weeks?|months?)\b"), EntityLabel::Date),
        (compile(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b"), EntityLabel::Date),
        (compile(&format!(r"(?i)\b{MONTH}\s+\d{{1,2}}(?:st|nd|rd|th)?\b")), EntityLabel::Date),
        (compile(&format!(r"(?i)\b\d{{1,2}}(?:st|nd|rd|th)?\s+{MONTH}\b")), EntityLabel::Date),
        (compile(r"(?i)\b\d{1,2}(?::\d{2})?\s*(?:am|pm)\b"), EntityLabel::Time),
        (compile(r"(?i)\b(?:tonight|noon|midnight|this\s+(?:morning|afternoon|evening))\b"), EntityLabel::Time),
        (compile(r"(?i)\bin\s+\d+\s+(?:hours?|minutes?)\b"), EntityLabel::Time),
    ]
});

/// Rule-based annotator backed by small word lists.
///
/// Dates and times come from span patterns, capitalized words other than the
/// first are taken as names, and short all-caps words as organizations.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconAnnotator;

impl LexiconAnnotator {
    fn tokens(text: &str) -> Vec<Token> {
        TOKEN
            .find_iter(text)
            .map(|m| {
                let word = m.as_str();
                let lower = word.to_lowercase();
                let pos = if VERBS.contains(&lower.as_str()) {
                    PosTag::Verb
                } else if word.chars().all(|c| c.is_ascii_digit()) {
                    PosTag::Num
                } else if !word.chars().any(char::is_alphanumeric) {
                    PosTag::Punct
                } else if NOUNS.contains(&lower.as_str()) {
                    PosTag::Noun
                } else {
                    PosTag::Other
                };
                Token { text: word.to_string(), pos }
            })
            .collect()
    }

    fn temporal_spans(text: &str) -> Vec<(usize, usize, EntityLabel)> {
        let mut spans: Vec<(usize, usize, EntityLabel)> = SPANS
            .iter()
            .flat_map(|(regex, label)| regex.find_iter(text).map(move |m| (m.start(), m.end(), *label)))
            .collect();
        spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut kept: Vec<(usize, usize, EntityLabel)> = Vec::new();
        for span in spans {
            if kept.last().map_or(true, |last| span.0 >= last.1) {
                kept.push(span);
            }
        }
        kept
    }

    fn name_entities(tokens: &[Token]) -> Vec<Entity> {
        tokens
            .iter()
            .enumerate()
            .filter_map(|(i, token)| {
                let word = token.text.as_str();
                let lower = word.to_lowercase();
                if word.chars().count() < 2 || token.pos != PosTag::Other && token.pos != PosTag::Noun {
                    return None;
                }
                if CALENDAR_WORDS.contains(&lower.as_str()) || NOUNS.contains(&lower.as_str()) {
                    return None;
                }
                let alphabetic = word.chars().all(char::is_alphabetic);
                if alphabetic && word.chars().all(char::is_uppercase) && word.len() <= 6 && !NOT_ORGS.contains(&word) {
                    return Some(Entity { text: word.to_string(), label: EntityLabel::Org });
                }
                let mut chars = word.chars();
                let capitalized = chars.next().is_some_and(char::is_uppercase) && chars.all(char::is_lowercase);
                (i > 0 && alphabetic && capitalized).then(|| Entity { text: word.to_string(), label: EntityLabel::Person })
            })
            .collect()
    }
}

impl Annotator for LexiconAnnotator {
    fn annotate(&self, text: &str) -> Result<Annotation, AnnotateError> {
        let tokens = Self::tokens(text);
        let mut entities: Vec<Entity> = Self::temporal_spans(text)
            .into_iter()
            .map(|(start, end, label)| Entity { text: text[start..end].to_string(), label })
            .collect();
        entities.extend(Self::name_entities(&tokens));
        Ok(Annotation { entities, tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entity(text: &str, label: EntityLabel) -> Entity {
        Entity { text: text.into(), label }
    }

    #[test]
    fn test_dates_names_and_orgs() {
        let annotation = LexiconAnnotator.annotate("Call John next Friday at 3pm about the IBM contract").unwrap();
        assert_eq!(
            annotation.entities,
            vec![
                entity("next Friday", EntityLabel::Date),
                entity("3pm", EntityLabel::Time),
                entity("John", EntityLabel::Person),
                entity("IBM", EntityLabel::Org),
            ]
        );
    }

    #[test]
    fn test_overlapping_spans_keep_the_longest() {
        let annotation = LexiconAnnotator.annotate("meet on 15 march").unwrap();
        assert_eq!(annotation.entities, vec![entity("15 march", EntityLabel::Date)]);
    }

    #[test]
    fn test_verbs_are_tagged() {
        let annotation = LexiconAnnotator.annotate("buy milk and call mom").unwrap();
        assert_eq!(annotation.verb_count(), 2);
        assert_eq!(annotation.tokens.len(), 5);
        assert_eq!(annotation.tokens[1].pos, PosTag::Noun);
    }

    #[test]
    fn test_first_word_and_acronyms_are_not_names() {
        let annotation = LexiconAnnotator.annotate("Groceries ASAP!").unwrap();
        assert!(annotation.entities.is_empty());
        assert_eq!(annotation.tokens.last().unwrap().pos, PosTag::Punct);
    }

    #[test]
    fn test_no_annotator_fails() {
        assert!(NoAnnotator.annotate("anything").is_err());
    }

    #[test]
    fn test_closures_are_annotators() {
        let fixed = |_: &str| -> Result<Annotation, AnnotateError> { Ok(Annotation::default()) };
        assert_eq!(fixed.annotate("x").unwrap(), Annotation::default());
    }
}
