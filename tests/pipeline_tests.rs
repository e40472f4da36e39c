use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use taskwise::annotate::NoAnnotator;
use taskwise::dates::resolve;
use taskwise::duration::estimate_duration;
use taskwise::models::{Category, ParseContext, Precision, Priority, SuggestionKind};
use taskwise::parser::TaskParser;
use taskwise::suggest::suggest;

fn reference() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(9, 0, 0).unwrap()
}

#[test]
fn test_urgent_call_scenario() {
    let task = TaskParser::default().parse_at("urgent: call client tomorrow", reference());
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.category, Some(Category::Work));
    let due = task.due_date.as_ref().unwrap();
    assert_eq!(due.parsed(), Some("2024-01-11"));
    assert_eq!(due.precision(), Some(Precision::Day));
}

#[test]
fn test_empty_input() {
    let task = TaskParser::default().parse("", None);
    assert_eq!(task.title, "");
    assert_eq!(task.confidence, 0.0);
    assert!(suggest(&task).iter().all(|s| s.suggestion_type != SuggestionKind::Reminder));
}

#[test]
fn test_titles_are_bounded_and_non_empty() {
    let parser = TaskParser::default();
    let long = "organize ".repeat(30);
    for input in ["x", "tomorrow", "urgent!!!", "ASAP", long.as_str(), "  need to   email bob  "] {
        let task = parser.parse_at(input, reference());
        assert!(!task.title.is_empty(), "empty title for {input:?}");
        assert!(task.title.chars().count() <= 100, "long title for {input:?}");
    }
}

#[test]
fn test_parse_is_idempotent() {
    let parser = TaskParser::default();
    let input = "Finish the quarterly report for the team by next friday at 3pm, it is important";
    let first = parser.parse_at(input, reference());
    let second = parser.parse_at(input, reference());
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_annotation_failure_still_extracts() {
    let task = TaskParser::new(NoAnnotator).parse_at("pay the electricity bill next monday", reference());
    assert_eq!(task.category, Some(Category::Finance));
    assert_eq!(task.due_date.unwrap().parsed(), Some("2024-01-15"));
}

#[test]
fn test_malformed_context_falls_back_to_now() {
    let task = TaskParser::default().parse("buy milk", Some(&ParseContext::at("not a date")));
    assert_eq!(task.title, "buy milk");
    assert_eq!(task.due_date, None);
}

#[test]
fn test_resolver_properties() {
    let tomorrow = resolve("tomorrow", Some(reference()));
    assert_eq!(tomorrow.parsed(), Some("2024-01-11"));
    assert_eq!(tomorrow.precision(), Some(Precision::Day));

    let weeks = resolve("in 2 weeks", Some(reference()));
    assert_eq!(weeks.precision(), Some(Precision::Week));

    let nothing = resolve("whenever", Some(reference()));
    assert_eq!(nothing.parsed(), None);
    assert_eq!(nothing.precision(), None);
    assert_eq!(nothing.confidence(), 0.0);
}

#[test]
fn test_duration_of_parsed_task() {
    let task = TaskParser::default().parse_at("write the project proposal", reference());
    assert_eq!(task.estimated_duration_minutes, Some(estimate_duration(&task)));
    assert!(estimate_duration(&task) >= 30);
}

#[test]
fn test_brief_task_suggestions() {
    let task = TaskParser::default().parse_at("water the flowers", reference());
    let priority: Vec<f64> = suggest(&task)
        .into_iter()
        .filter(|s| s.suggestion_type == SuggestionKind::PriorityClarification)
        .map(|s| s.confidence)
        .collect();
    assert_eq!(priority, vec![0.5]);
}

#[test]
fn test_exclaimed_task_still_gets_mild_hint() {
    let task = TaskParser::default().parse_at("fix sink!", reference());
    assert_eq!(task.priority, Priority::High);
    let priority: Vec<f64> = suggest(&task)
        .into_iter()
        .filter(|s| s.suggestion_type == SuggestionKind::PriorityClarification)
        .map(|s| s.confidence)
        .collect();
    assert_eq!(priority, vec![0.5]);
}

#[test]
fn test_never_two_reminders() {
    let parser = TaskParser::default();
    for input in [
        "urgent: call client tomorrow",
        "urgent: fix the build",
        "book dentist next tuesday",
        "plan and organize the research project with the team then share results",
    ] {
        let task = parser.parse_at(input, reference());
        let reminders = suggest(&task)
            .iter()
            .filter(|s| s.suggestion_type == SuggestionKind::Reminder)
            .count();
        assert!(reminders <= 1, "{input:?} produced {reminders} reminders");
    }
}
