use std::io;
use std::process::ExitCode;

use chrono::{Local, NaiveDateTime};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use taskwise::annotate::{LexiconAnnotator, NoAnnotator};
use taskwise::assistant::Assistant;
use taskwise::commands::*;
use taskwise::config::{Config, OutputFormat};
use taskwise::dates::parse_timestamp;
use taskwise::models::{Priority, TaskRecord};
use taskwise::parser::TaskParser;
use taskwise::tui::run_tui;
use taskwise::{Error, Result};

#[derive(Parser)]
#[command(name = "taskwise")]
#[command(about = "Turn free-text task descriptions into structured tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract structured fields from a task description
    Parse {
        /// Task description (quoted or as separate words)
        #[arg(required = true)]
        text: Vec<String>,
        /// Reference time for relative dates, ISO 8601
        #[arg(short, long)]
        at: Option<String>,
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Extract fields and suggest improvements
    Suggest {
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(short, long)]
        at: Option<String>,
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Resolve a date expression
    Date {
        #[arg(required = true)]
        text: Vec<String>,
        #[arg(short, long)]
        at: Option<String>,
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Suggest improvements for an existing task
    Review {
        /// Task title
        #[arg(short, long)]
        title: String,
        /// Task description
        #[arg(short, long)]
        description: Option<String>,
        /// Priority
        #[arg(short, long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date, ISO 8601
        #[arg(long)]
        due: Option<String>,
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Open interactive TUI
    Ui,
}

/// Installs the stderr log subscriber. `TASKWISE_LOG` wins over `default_filter`.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env("TASKWISE_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// `--at` when given (and then it must parse), else the configured instant, else now.
fn reference_time(at: Option<&str>, config: &Config) -> Result<NaiveDateTime> {
    match at {
        Some(raw) => parse_timestamp(raw).ok_or_else(|| Error::InvalidTimestamp(raw.to_string())),
        None => Ok(config.reference_time().unwrap_or_else(|| Local::now().naive_local())),
    }
}

fn build_assistant(config: &Config) -> Assistant {
    let parser = if config.builtin_annotator {
        TaskParser::new(LexiconAnnotator)
    } else {
        TaskParser::new(NoAnnotator)
    };
    Assistant::new(parser)
}

fn run(command: Commands, config: &Config) -> Result<()> {
    let assistant = build_assistant(config);
    match command {
        Commands::Parse { text, at, format } => {
            let reference = reference_time(at.as_deref(), config)?;
            cmd_parse(&assistant, &text.join(" "), reference, format.unwrap_or(config.format))
        }
        Commands::Suggest { text, at, format } => {
            let reference = reference_time(at.as_deref(), config)?;
            cmd_suggest(&assistant, &text.join(" "), reference, format.unwrap_or(config.format))
        }
        Commands::Date { text, at, format } => {
            let reference = reference_time(at.as_deref(), config)?;
            cmd_date(&text.join(" "), reference, format.unwrap_or(config.format))
        }
        Commands::Review { title, description, priority, due, format } => {
            let due_date = match due.as_deref() {
                Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| Error::InvalidTimestamp(raw.to_string()))?),
                None => None,
            };
            let record = TaskRecord { title, description, priority, due_date };
            cmd_review(&assistant, &record, format.unwrap_or(config.format))
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "taskwise", &mut io::stdout());
            Ok(())
        }
        Commands::Ui => {
            let reference = config.reference_time();
            run_tui(assistant, reference)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Ui);

    let config_result = Config::load();
    let config = config_result.as_ref().cloned().unwrap_or_default();

    // the TUI owns the terminal; only log there when asked to
    let default_filter = if matches!(command, Commands::Ui) { "off" } else { config.log_filter.as_str() };
    init_tracing(default_filter);
    if let Err(err) = &config_result {
        warn!(error = %err, "using default configuration");
    }

    match run(command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_priority_is_checked_by_clap() {
        let cli = Cli::try_parse_from(["taskwise", "review", "--title", "Prepare slides", "--priority", "high"]).unwrap();
        match cli.command {
            Some(Commands::Review { priority, .. }) => assert_eq!(priority, Priority::High),
            _ => panic!("expected review"),
        }

        let cli = Cli::try_parse_from(["taskwise", "review", "--title", "Prepare slides"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Review { priority: Priority::Medium, .. })));

        assert!(Cli::try_parse_from(["taskwise", "review", "--title", "x", "--priority", "urgent"]).is_err());
    }
}
