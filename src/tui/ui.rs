use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::app::App;
use crate::commands::describe_date;
use crate::models::{ParsedTask, Priority};

fn confidence_style(confidence: f64) -> Style {
    if confidence >= 0.7 {
        Style::default().fg(Color::Green)
    } else if confidence >= 0.4 {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Red)
    }
}

fn field_rows(task: &ParsedTask) -> Vec<Row<'static>> {
    let priority_style = match task.priority {
        Priority::High => Style::default().fg(Color::Red),
        Priority::Medium => Style::default().fg(Color::Yellow),
        Priority::Low => Style::default().fg(Color::Green),
    };
    let duration = task
        .estimated_duration_minutes
        .map(|m| format!("{m} min"))
        .unwrap_or_else(|| "-".to_string());

    vec![
        Row::new(vec![Cell::from("Title"), Cell::from(task.title.clone())]),
        Row::new(vec![Cell::from("Priority"), Cell::from(task.priority.to_string()).style(priority_style)]),
        Row::new(vec![
            Cell::from("Category"),
            Cell::from(task.category.map(|c| c.as_str()).unwrap_or("-")),
        ]),
        Row::new(vec![Cell::from("Due"), Cell::from(describe_date(task.due_date.as_ref()))]),
        Row::new(vec![Cell::from("Duration"), Cell::from(duration)]),
        Row::new(vec![
            Cell::from("Confidence"),
            Cell::from(format!("{:.2}", task.confidence)).style(confidence_style(task.confidence)),
        ]),
    ]
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input
            Constraint::Length(9), // Fields
            Constraint::Min(0),    // Suggestions
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    let input = Paragraph::new(app.input_buffer.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Describe a task"));
    f.render_widget(input, chunks[0]);

    let fields_title = if app.last_input.is_empty() {
        "Taskwise - Fields".to_string()
    } else {
        format!("Taskwise - \"{}\"", app.last_input)
    };
    let rows = app.analysis.as_ref().map(|a| field_rows(&a.task)).unwrap_or_default();
    let fields = Table::new(rows, [Constraint::Length(12), Constraint::Min(20)])
        .block(Block::default().borders(Borders::ALL).title(fields_title));
    f.render_widget(fields, chunks[1]);

    let suggestion_rows: Vec<Row> = app
        .analysis
        .as_ref()
        .map(|a| {
            a.suggestions
                .iter()
                .map(|envelope| {
                    let s = &envelope.suggestion;
                    Row::new(vec![
                        Cell::from(s.suggestion_type.as_str()),
                        Cell::from(format!("{:.2}", s.confidence)).style(confidence_style(s.confidence)),
                        Cell::from(s.suggestion.clone()),
                    ])
                })
                .collect()
        })
        .unwrap_or_default();

    let widths = [Constraint::Length(24), Constraint::Length(6), Constraint::Min(20)];
    let suggestions = Table::new(suggestion_rows, widths)
        .header(
            Row::new(vec!["Type", "Conf", "Suggestion"])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title("Suggestions"))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");
    f.render_stateful_widget(suggestions, chunks[2], &mut app.state);

    let help = Paragraph::new("Enter: Parse | Up/Down: Select | Esc: Clear | q (empty input) / Ctrl-C: Quit")
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::Assistant;
    use chrono::NaiveDate;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_renders_fields_and_suggestions() {
        let reference = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let mut app = App::new(Assistant::default(), Some(reference));
        app.input_buffer = "urgent: call client tomorrow".into();
        app.submit();

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| ui(f, &mut app)).unwrap();

        let screen: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(screen.contains("call client"));
        assert!(screen.contains("2024-01-11 (day)"));
        assert!(screen.contains("reminder"));
    }
}
