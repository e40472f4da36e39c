use crate::models::{ParsedTask, Priority};

/// Smallest estimate ever returned, in minutes.
pub const MIN_MINUTES: u32 = 30;

/// Keyword to minutes. Matches are folded in this order.
pub const DURATION_KEYWORDS: [(&str, f64); 27] = [
    ("quick", 30.0),
    ("brief", 30.0),
    ("call", 30.0),
    ("email", 15.0),
    ("reply", 15.0),
    ("review", 45.0),
    ("meeting", 60.0),
    ("appointment", 60.0),
    ("interview", 60.0),
    ("workout", 60.0),
    ("exercise", 45.0),
    ("errand", 45.0),
    ("shopping", 60.0),
    ("clean", 90.0),
    ("plan", 90.0),
    ("write", 120.0),
    ("report", 120.0),
    ("study", 120.0),
    ("learn", 120.0),
    ("organize", 120.0),
    ("presentation", 180.0),
    ("research", 180.0),
    ("design", 180.0),
    ("develop", 240.0),
    ("implement", 240.0),
    ("project", 480.0),
    ("move", 480.0),
];

/// Estimates completion time of a parsed task in minutes.
pub fn estimate_duration(task: &ParsedTask) -> u32 {
    estimate_minutes(&task.title, task.description.as_deref(), task.priority)
}

/// Estimates completion time in minutes from title, description and priority.
///
/// Matched keywords are folded into a running average in table order: each
/// new value is averaged with the estimate so far, so later keywords weigh
/// more than a plain mean would give them. The result is never below 30.
pub fn estimate_minutes(title: &str, description: Option<&str>, priority: Priority) -> u32 {
    let full_text = format!("{} {}", title.to_lowercase(), description.unwrap_or_default().to_lowercase());
    let word_count = full_text.split_whitespace().count();

    let mut estimate: Option<f64> = None;
    for (keyword, minutes) in DURATION_KEYWORDS {
        if full_text.contains(keyword) {
            estimate = Some(match estimate {
                Some(current) => (current + minutes) / 2.0,
                None => minutes,
            });
        }
    }

    let minutes = match estimate {
        Some(mut minutes) => {
            match priority {
                Priority::High => minutes *= 1.2,
                Priority::Low => minutes *= 0.8,
                Priority::Medium => {}
            }
            if word_count > 20 {
                minutes *= 1.3;
            } else if word_count < 5 {
                minutes = (minutes * 0.8).max(MIN_MINUTES as f64);
            }
            minutes
        }
        None => {
            let base: f64 = match word_count {
                0..=4 => 45.0,
                5..=9 => 60.0,
                10..=19 => 90.0,
                _ => 150.0,
            };
            match priority {
                Priority::High => base * 1.5,
                Priority::Low => (base * 0.7).max(MIN_MINUTES as f64),
                Priority::Medium => base,
            }
        }
    };

    (minutes as u32).max(MIN_MINUTES)
}
