use chrono::NaiveDateTime;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use crate::assistant::{Analysis, Assistant, SuggestionEnvelope};
use crate::config::OutputFormat;
use crate::dates::DateResolver;
use crate::error::Result;
use crate::models::{ParsedTask, Priority, StructuredDate, TaskRecord};

fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(label).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table(labels: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(labels));
    table
}

fn confidence_color(confidence: f64) -> Color {
    if confidence >= 0.7 {
        Color::Green
    } else if confidence >= 0.4 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

/// `2024-01-11 (day)`, or `-` when there is nothing to show.
pub fn describe_date(date: Option<&StructuredDate>) -> String {
    match date.and_then(|d| d.parsed().zip(d.precision())) {
        Some((parsed, precision)) => format!("{parsed} ({precision})"),
        None => "-".to_string(),
    }
}

/// Field/value table for a parsed task.
pub fn task_table(task: &ParsedTask) -> Table {
    let mut table = new_table(&["Field", "Value"]);
    let duration = task
        .estimated_duration_minutes
        .map(|m| format!("{m} min"))
        .unwrap_or_else(|| "-".to_string());

    table.add_row(vec![Cell::new("Title"), Cell::new(&task.title)]);
    if let Some(description) = &task.description {
        table.add_row(vec![Cell::new("Description"), Cell::new(description)]);
    }
    table.add_row(vec![
        Cell::new("Priority"),
        Cell::new(task.priority).fg(priority_color(task.priority)),
    ]);
    table.add_row(vec![
        Cell::new("Category"),
        Cell::new(task.category.map(|c| c.as_str()).unwrap_or("-")),
    ]);
    table.add_row(vec![Cell::new("Due"), Cell::new(describe_date(task.due_date.as_ref()))]);
    table.add_row(vec![Cell::new("Duration"), Cell::new(duration)]);
    table.add_row(vec![
        Cell::new("Confidence"),
        Cell::new(format!("{:.2}", task.confidence)).fg(confidence_color(task.confidence)),
    ]);
    table
}

/// One row per suggestion, in the order given.
pub fn suggestion_table(suggestions: &[SuggestionEnvelope]) -> Table {
    let mut table = new_table(&["ID", "Type", "Conf", "Suggestion", "Reasoning"]);
    for envelope in suggestions {
        let s = &envelope.suggestion;
        table.add_row(vec![
            Cell::new(&envelope.id),
            Cell::new(s.suggestion_type),
            Cell::new(format!("{:.2}", s.confidence)).fg(confidence_color(s.confidence)),
            Cell::new(&s.suggestion),
            Cell::new(&s.reasoning),
        ]);
    }
    table
}

pub fn date_table(date: &StructuredDate) -> Table {
    let weekday = date
        .value()
        .map(|value| value.format("%A").to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut table = new_table(&["Input", "Parsed", "Weekday", "Precision", "Conf"]);
    table.add_row(vec![
        Cell::new(date.raw()),
        Cell::new(date.parsed().unwrap_or("-")),
        Cell::new(weekday),
        Cell::new(date.precision().map(|p| p.as_str()).unwrap_or("-")),
        Cell::new(format!("{:.2}", date.confidence())).fg(confidence_color(date.confidence())),
    ]);
    table
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Renders the parse of `text` at `reference`.
pub fn render_parse(assistant: &Assistant, text: &str, reference: NaiveDateTime, format: OutputFormat) -> Result<String> {
    let task = assistant.parser().parse_at(text, reference);
    match format {
        OutputFormat::Json => to_json(&task),
        OutputFormat::Table => Ok(task_table(&task).to_string()),
    }
}

/// Renders the parse of `text` followed by every suggestion for it.
pub fn render_suggest(assistant: &Assistant, text: &str, reference: NaiveDateTime, format: OutputFormat) -> Result<String> {
    let analysis: Analysis = assistant.analyze_at(text, reference);
    match format {
        OutputFormat::Json => to_json(&analysis),
        OutputFormat::Table if analysis.suggestions.is_empty() => {
            Ok(format!("{}\nNo suggestions.", task_table(&analysis.task)))
        }
        OutputFormat::Table => Ok(format!(
            "{}\n{}",
            task_table(&analysis.task),
            suggestion_table(&analysis.suggestions)
        )),
    }
}

/// Renders the resolver's reading of `text` on its own.
pub fn render_date(text: &str, reference: NaiveDateTime, format: OutputFormat) -> Result<String> {
    let date = DateResolver::new(reference).resolve(text);
    match format {
        OutputFormat::Json => to_json(&date),
        OutputFormat::Table => Ok(date_table(&date).to_string()),
    }
}

/// Renders rule suggestions for a stored task.
pub fn render_review(assistant: &Assistant, record: &TaskRecord, format: OutputFormat) -> Result<String> {
    let suggestions = assistant.review(record);
    match format {
        OutputFormat::Json => to_json(&suggestions),
        OutputFormat::Table if suggestions.is_empty() => Ok("No suggestions.".to_string()),
        OutputFormat::Table => Ok(suggestion_table(&suggestions).to_string()),
    }
}

/// Parses a task description and prints the extracted fields.
pub fn cmd_parse(assistant: &Assistant, text: &str, reference: NaiveDateTime, format: OutputFormat) -> Result<()> {
    println!("{}", render_parse(assistant, text, reference, format)?);
    Ok(())
}

/// Parses a task description and prints it with improvement suggestions.
pub fn cmd_suggest(assistant: &Assistant, text: &str, reference: NaiveDateTime, format: OutputFormat) -> Result<()> {
    println!("{}", render_suggest(assistant, text, reference, format)?);
    Ok(())
}

/// Resolves a date expression and prints the result.
pub fn cmd_date(text: &str, reference: NaiveDateTime, format: OutputFormat) -> Result<()> {
    println!("{}", render_date(text, reference, format)?);
    Ok(())
}

/// Prints suggestions for an existing task.
pub fn cmd_review(assistant: &Assistant, record: &TaskRecord, format: OutputFormat) -> Result<()> {
    println!("{}", render_review(assistant, record, format)?);
    Ok(())
}
