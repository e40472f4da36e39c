use chrono::{Local, NaiveDateTime};
use ratatui::widgets::TableState;

use crate::assistant::{Analysis, Assistant};

pub struct App {
    pub assistant: Assistant,
    /// Fixed reference instant; `None` means "now" at each submit.
    pub reference: Option<NaiveDateTime>,
    pub input_buffer: String,
    pub analysis: Option<Analysis>,
    pub state: TableState,
    /// Last submitted input, shown above the results.
    pub last_input: String,
}

impl App {
    pub fn new(assistant: Assistant, reference: Option<NaiveDateTime>) -> App {
        App {
            assistant,
            reference,
            input_buffer: String::new(),
            analysis: None,
            state: TableState::default(),
            last_input: String::new(),
        }
    }

    fn suggestion_count(&self) -> usize {
        self.analysis.as_ref().map_or(0, |a| a.suggestions.len())
    }

    /// Selects the next suggestion, wrapping around.
    pub fn next(&mut self) {
        let len = self.suggestion_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous suggestion, wrapping around.
    pub fn previous(&mut self) {
        let len = self.suggestion_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Parses the input buffer and replaces the shown analysis.
    ///
    /// Blank input is ignored.
    pub fn submit(&mut self) {
        let text = self.input_buffer.trim();
        if text.is_empty() {
            return;
        }
        let reference = self.reference.unwrap_or_else(|| Local::now().naive_local());
        let analysis = self.assistant.analyze_at(text, reference);

        self.state.select(if analysis.suggestions.is_empty() { None } else { Some(0) });
        self.last_input = text.to_string();
        self.analysis = Some(analysis);
        self.input_buffer.clear();
    }

    pub fn clear(&mut self) {
        self.input_buffer.clear();
    }

    /// Whether `q` should quit rather than be typed.
    pub fn quits_on_q(&self) -> bool {
        self.input_buffer.is_empty()
    }
}
