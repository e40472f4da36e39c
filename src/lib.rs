//! # Taskwise
//!
//! Turns free-text task descriptions into structured tasks and suggests how
//! to improve them. Taskwise ships as a library and as a terminal tool with a
//! scriptable CLI and an interactive TUI.
//!
//! ## Features
//!
//! *   **Task extraction**: title, priority, category, due date, estimated
//!     duration and a confidence score from one line of text.
//! *   **Date resolution**: "next friday", "in 2 weeks", "3/15", "at 5pm" and
//!     similar phrases, always anchored at an explicit reference instant.
//! *   **Suggestions**: rule-based hints (add a due date, break the task down,
//!     set a reminder, ...) with structured metadata.
//! *   **Pluggable providers**: annotation through [`annotate::Annotator`],
//!     optional external analysis through [`assistant::TaskAnalyzer`].
//!
//! ## Library usage
//!
//! ```
//! use chrono::NaiveDate;
//! use taskwise::parser::TaskParser;
//! use taskwise::suggest::suggest;
//!
//! let reference = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let task = TaskParser::default().parse_at("urgent: call client tomorrow", reference);
//! assert_eq!(task.title, "call client");
//! assert_eq!(task.due_date.as_ref().and_then(|d| d.parsed()), Some("2024-01-11"));
//!
//! for suggestion in suggest(&task) {
//!     println!("{}: {}", suggestion.suggestion_type, suggestion.suggestion);
//! }
//! ```
//!
//! ## CLI usage
//!
//! ```bash
//! # Structured fields
//! taskwise parse "finish the report by friday" --at 2024-01-10T09:00:00
//!
//! # Fields plus suggestions, as JSON
//! taskwise suggest "plan the team offsite and book the venue" --format json
//!
//! # The date resolver on its own
//! taskwise date "in 2 weeks"
//!
//! # Suggestions for a task stored elsewhere
//! taskwise review --title "Prepare slides" --priority high --due 2024-01-12
//! ```
//!
//! Running `taskwise` with no subcommand (or `taskwise ui`) opens the TUI.
//!
//! #### TUI Key Bindings
//!
//! *   `Enter`: Parse the current input
//! *   `Up`/`Down`: Move through suggestions
//! *   `Esc`: Clear the input
//! *   `Ctrl-C`, or `q` on an empty input: Quit
//!
//! ## Configuration
//!
//! Settings are read from `config.json` in the user config directory:
//! *   Linux: `~/.config/taskwise/config.json`
//! *   macOS: `~/Library/Application Support/taskwise/config.json`
//! *   Windows: `%APPDATA%\taskwise\config.json`
//!
//! Override the location with `TASKWISE_CONFIG`. `TASKWISE_NOW` pins the
//! reference instant and `TASKWISE_LOG` sets the log filter.

pub mod annotate;
pub mod assistant;
pub mod commands;
pub mod confidence;
pub mod config;
pub mod dates;
pub mod duration;
pub mod error;
pub mod extract;
pub mod models;
pub mod parser;
pub mod suggest;
pub mod tui;

pub use error::{Error, Result};
