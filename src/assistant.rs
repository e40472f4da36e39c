//! Combines the local pipeline with an optional external analyzer.
//!
//! The analyzer is an explicit handle owned by the [`Assistant`]; there is no
//! process-wide client. When it is missing or fails, the local result stands.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dates::DateResolver;
use crate::error::AnalyzerError;
use crate::models::{Category, ParseContext, ParsedTask, Priority, Suggestion, TaskRecord};
use crate::parser::TaskParser;
use crate::suggest::{suggest, suggest_for, TaskView};

/// Structured answer from an external analysis service.
///
/// Mirrors [`ParsedTask`] except that the due date is free text, resolved
/// locally against the call's reference time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExternalAnalysis {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub due_date_suggestion: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

fn default_confidence() -> f64 {
    0.5
}

impl ExternalAnalysis {
    /// Decodes a JSON analysis body.
    pub fn from_json(body: &str) -> Result<Self, AnalyzerError> {
        serde_json::from_str(body).map_err(|err| AnalyzerError::Malformed(err.to_string()))
    }
}

/// External analysis service, e.g. a hosted language model.
pub trait TaskAnalyzer: Send + Sync {
    fn analyze(&self, input: &str, context: Option<&ParseContext>) -> Result<ExternalAnalysis, AnalyzerError>;

    fn suggest(&self, task: &ParsedTask) -> Result<Vec<Suggestion>, AnalyzerError>;
}

/// Where a suggestion came from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Ai,
    NlpRules,
    Rules,
}

impl SuggestionSource {
    fn id_prefix(&self) -> &'static str {
        match self {
            SuggestionSource::Ai => "ai_suggestion",
            SuggestionSource::NlpRules => "nlp_suggestion",
            SuggestionSource::Rules => "rule_suggestion",
        }
    }
}

/// A suggestion tagged with a stable id and its source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SuggestionEnvelope {
    pub id: String,
    pub source: SuggestionSource,
    #[serde(flatten)]
    pub suggestion: Suggestion,
}

/// Numbers suggestions from 1 within one source.
fn envelope(source: SuggestionSource, suggestions: Vec<Suggestion>) -> impl Iterator<Item = SuggestionEnvelope> {
    suggestions.into_iter().enumerate().map(move |(i, suggestion)| SuggestionEnvelope {
        id: format!("{}_{}", source.id_prefix(), i + 1),
        source,
        suggestion,
    })
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Analysis {
    pub task: ParsedTask,
    pub suggestions: Vec<SuggestionEnvelope>,
}

pub struct Assistant {
    parser: TaskParser,
    analyzer: Option<Box<dyn TaskAnalyzer>>,
}

impl Default for Assistant {
    fn default() -> Self {
        Self::new(TaskParser::default())
    }
}

impl Assistant {
    pub fn new(parser: TaskParser) -> Self {
        Self { parser, analyzer: None }
    }

    pub fn with_analyzer(mut self, analyzer: impl TaskAnalyzer + 'static) -> Self {
        self.analyzer = Some(Box::new(analyzer));
        self
    }

    pub fn parser(&self) -> &TaskParser {
        &self.parser
    }

    /// Features available with the current setup.
    pub fn capabilities(&self) -> Vec<&'static str> {
        let mut features = vec!["task_parsing", "nlp_analysis"];
        if self.analyzer.is_some() {
            features.push("ai_suggestions");
        }
        features
    }

    /// Parses `input` and gathers suggestions from every available source.
    pub fn analyze(&self, input: &str, context: Option<&ParseContext>) -> Analysis {
        let reference = context
            .and_then(ParseContext::reference_time)
            .unwrap_or_else(|| Local::now().naive_local());
        self.run(input, context, reference)
    }

    /// Like [`Assistant::analyze`] with a fixed reference instant.
    pub fn analyze_at(&self, input: &str, reference: NaiveDateTime) -> Analysis {
        let context = ParseContext::at(reference.format("%Y-%m-%dT%H:%M:%S").to_string());
        self.run(input, Some(&context), reference)
    }

    fn run(&self, input: &str, context: Option<&ParseContext>, reference: NaiveDateTime) -> Analysis {
        let local = self.parser.parse_at(input, reference);
        if local.raw_input.is_empty() {
            return Analysis { task: local, suggestions: Vec::new() };
        }

        let mut suggestions = Vec::new();
        let mut task = local.clone();

        if let Some(analyzer) = &self.analyzer {
            match analyzer.analyze(&local.raw_input, context) {
                Ok(external) => {
                    debug!(reasoning = %external.reasoning, "merging external analysis");
                    task = merge(local.clone(), external, &DateResolver::new(reference));
                    match analyzer.suggest(&task) {
                        Ok(external) => suggestions.extend(envelope(SuggestionSource::Ai, external)),
                        Err(err) => warn!(error = %err, "external suggestions failed"),
                    }
                }
                Err(err) => warn!(error = %err, "external analysis failed, using local result"),
            }
        }

        suggestions.extend(envelope(SuggestionSource::NlpRules, suggest(&local)));
        Analysis { task, suggestions }
    }

    /// Suggestions for a task that was stored elsewhere, without re-parsing.
    pub fn review(&self, record: &TaskRecord) -> Vec<SuggestionEnvelope> {
        envelope(SuggestionSource::Rules, suggest_for(TaskView::from(record))).collect()
    }
}

/// Applies an external analysis on top of the local parse.
fn merge(local: ParsedTask, external: ExternalAnalysis, resolver: &DateResolver) -> ParsedTask {
    let due_date = external
        .due_date_suggestion
        .as_deref()
        .map(|text| resolver.resolve(text))
        .filter(|date| date.is_resolved())
        .or(local.due_date);

    let title = if external.title.trim().is_empty() { local.title } else { external.title };

    ParsedTask {
        title,
        description: external.description,
        priority: external.priority,
        due_date,
        category: external.category,
        estimated_duration_minutes: external.estimated_duration.or(local.estimated_duration_minutes),
        confidence: external.confidence.clamp(0.0, 1.0),
        raw_input: local.raw_input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::NoAnnotator;
    use crate::models::SuggestionKind;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(9, 0, 0).unwrap()
    }

    struct FakeAnalyzer {
        analysis: Result<ExternalAnalysis, AnalyzerError>,
        calls: Arc<AtomicUsize>,
    }

    impl TaskAnalyzer for FakeAnalyzer {
        fn analyze(&self, _input: &str, context: Option<&ParseContext>) -> Result<ExternalAnalysis, AnalyzerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(context.is_some_and(|c| c.timestamp.is_some()));
            self.analysis.clone()
        }

        fn suggest(&self, task: &ParsedTask) -> Result<Vec<Suggestion>, AnalyzerError> {
            Ok(vec![Suggestion::new(
                SuggestionKind::Breakdown,
                format!("Split '{}'", task.title),
                0.9,
                "external",
                Default::default(),
            )])
        }
    }

    fn external() -> ExternalAnalysis {
        ExternalAnalysis::from_json(
            r#"{
                "title": "Call the client about the contract",
                "priority": "high",
                "category": "work",
                "due_date_suggestion": "next friday",
                "confidence": 0.9,
                "reasoning": "explicit deadline"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_local_only_numbers_nlp_suggestions() {
        let analysis = Assistant::default().analyze_at("water the flowers", reference());
        assert_eq!(analysis.task.title, "water the flowers");
        let ids: Vec<&str> = analysis.suggestions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids[0], "nlp_suggestion_1");
        assert!(analysis.suggestions.iter().all(|s| s.source == SuggestionSource::NlpRules));
    }

    #[test]
    fn test_external_analysis_wins_and_goes_first() {
        let calls = Arc::new(AtomicUsize::new(0));
        let assistant = Assistant::default().with_analyzer(FakeAnalyzer { analysis: Ok(external()), calls: calls.clone() });
        let analysis = assistant.analyze_at("call client tomorrow", reference());

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(analysis.task.title, "Call the client about the contract");
        assert_eq!(analysis.task.priority, Priority::High);
        assert_eq!(analysis.task.due_date.as_ref().unwrap().parsed(), Some("2024-01-12"));
        // no duration from the analyzer: the local estimate is kept
        assert_eq!(analysis.task.estimated_duration_minutes, Some(30));
        assert_eq!(analysis.task.confidence, 0.9);

        assert_eq!(analysis.suggestions[0].id, "ai_suggestion_1");
        assert_eq!(analysis.suggestions[0].source, SuggestionSource::Ai);
        assert_eq!(analysis.suggestions[1].id, "nlp_suggestion_1");
    }

    #[test]
    fn test_unresolvable_external_date_keeps_local_one() {
        let mut vague = external();
        vague.due_date_suggestion = Some("whenever you can".into());
        let assistant = Assistant::default().with_analyzer(FakeAnalyzer { analysis: Ok(vague), calls: Arc::default() });
        let analysis = assistant.analyze_at("call client tomorrow", reference());
        assert_eq!(analysis.task.due_date.unwrap().parsed(), Some("2024-01-11"));
    }

    #[test]
    fn test_analyzer_failure_falls_back_to_local() {
        let assistant = Assistant::new(TaskParser::new(NoAnnotator)).with_analyzer(FakeAnalyzer {
            analysis: Err(AnalyzerError::Unavailable),
            calls: Arc::default(),
        });
        let analysis = assistant.analyze_at("urgent: call client tomorrow", reference());
        assert_eq!(analysis.task.title, "call client");
        assert!(analysis.suggestions.iter().all(|s| s.source == SuggestionSource::NlpRules));
    }

    #[test]
    fn test_rejected_request_falls_back_to_local() {
        let calls = Arc::new(AtomicUsize::new(0));
        let assistant = Assistant::default().with_analyzer(FakeAnalyzer {
            analysis: Err(AnalyzerError::Rejected("quota exceeded".into())),
            calls: calls.clone(),
        });
        let analysis = assistant.analyze_at("urgent: call client tomorrow", reference());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(analysis.task.title, "call client");
        assert_eq!(analysis.task.due_date.unwrap().parsed(), Some("2024-01-11"));
        assert!(!analysis.suggestions.is_empty());
        assert!(analysis.suggestions.iter().all(|s| s.source == SuggestionSource::NlpRules));
    }

    #[test]
    fn test_empty_input_skips_everything() {
        let calls = Arc::new(AtomicUsize::new(0));
        let assistant = Assistant::default().with_analyzer(FakeAnalyzer { analysis: Ok(external()), calls: calls.clone() });
        let analysis = assistant.analyze_at("  ", reference());
        assert_eq!(analysis.task.confidence, 0.0);
        assert!(analysis.suggestions.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_review_uses_rule_ids() {
        let record = TaskRecord {
            title: "Prepare slides".into(),
            description: None,
            priority: Priority::High,
            due_date: Some(reference()),
        };
        let reviewed = Assistant::default().review(&record);
        assert_eq!(reviewed[0].id, "rule_suggestion_1");
        assert!(reviewed.iter().all(|s| s.source == SuggestionSource::Rules));
        let reminders = reviewed
            .iter()
            .filter(|s| s.suggestion.suggestion_type == SuggestionKind::Reminder)
            .count();
        assert_eq!(reminders, 1);
    }

    #[test]
    fn test_capabilities() {
        assert_eq!(Assistant::default().capabilities(), vec!["task_parsing", "nlp_analysis"]);
        let with = Assistant::default().with_analyzer(FakeAnalyzer { analysis: Ok(external()), calls: Arc::default() });
        assert_eq!(with.capabilities(), vec!["task_parsing", "nlp_analysis", "ai_suggestions"]);
    }

    #[test]
    fn test_malformed_body_is_reported() {
        assert!(matches!(ExternalAnalysis::from_json("{not json"), Err(AnalyzerError::Malformed(_))));
    }

    #[test]
    fn test_envelope_serializes_flat() {
        let analysis = Assistant::default().analyze_at("do taxes", reference());
        let value = serde_json::to_value(&analysis.suggestions[0]).unwrap();
        assert_eq!(value["id"], "nlp_suggestion_1");
        assert_eq!(value["source"], "nlp_rules");
        assert!(value["metadata"].is_object());
        assert!(value.get("suggestion_type").is_some());
    }
}
