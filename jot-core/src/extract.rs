//! Natural-language text → [`TaskDraft`].
//!
//! Rule-based: title truncation, keyword date offsets, a time-of-day regex,
//! keyword priority/status, then a final pass through a [`PriorityModel`].

use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

use crate::keywords::{
    first_match, first_value, COMPLETED_KEYWORDS, DATE_OFFSETS, IN_PROGRESS_KEYWORDS,
    PRIORITY_KEYWORDS,
};
use crate::recommend::{PriorityModel, RuleModel};
use crate::task::{TaskDraft, TaskStatus, DEFAULT_PRIORITY};

/// Title length in characters before truncation.
pub const TITLE_CHARS: usize = 40;

pub const DESCRIPTION_PREFIX: &str = "Parsed from text: ";

// HH:MM / HH点MM with optional am|pm, or a bare "3pm".
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?P<hour>\d{1,2})(?:",
        r"[:点](?P<minute>\d{0,2})\s*(?P<mer>am|pm)?",
        r"|\s*(?P<bare_mer>am|pm)\b",
        r")"
    ))
    .expect("time regex is valid")
});

/// Hour and minute of the first time-of-day mention in `text`.
pub fn find_time(text: &str) -> Option<(u32, u32)> {
    let caps = TIME_RE.captures(text)?;
    let mut hour: u32 = caps["hour"].parse().ok()?;
    let minute: u32 = caps
        .name("minute")
        .map(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .and_then(|m| m.parse().ok())
        .unwrap_or(0);

    let meridiem = caps
        .name("mer")
        .or_else(|| caps.name("bare_mer"))
        .map(|m| m.as_str().to_ascii_lowercase());
    match meridiem.as_deref() {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    Some((hour, minute))
}

/// First [`TITLE_CHARS`] characters, trimmed, with "..." when the text was longer.
pub fn make_title(text: &str) -> String {
    let mut title: String = text.chars().take(TITLE_CHARS).collect::<String>().trim().to_string();
    if text.chars().count() > TITLE_CHARS {
        title.push_str("...");
    }
    title
}

/// Status implied by keywords; completion wins over in-progress.
pub fn detect_status(lowered: &str) -> TaskStatus {
    if first_match(lowered, COMPLETED_KEYWORDS).is_some() {
        TaskStatus::Completed
    } else if first_match(lowered, IN_PROGRESS_KEYWORDS).is_some() {
        TaskStatus::InProgress
    } else {
        TaskStatus::Pending
    }
}

/// Extract a draft using the rule-based recommender.
pub fn extract(text: &str, today: NaiveDate) -> TaskDraft {
    extract_with(text, today, &RuleModel)
}

/// Extract a draft; `model` decides the final priority.
pub fn extract_with(text: &str, today: NaiveDate, model: &dyn PriorityModel) -> TaskDraft {
    let lowered = text.to_lowercase();

    let mut draft = TaskDraft::new(make_title(text))
        .with_description(format!("{DESCRIPTION_PREFIX}{text}"));

    let offset = first_value(&lowered, DATE_OFFSETS);
    if let Some(days) = offset {
        draft.due_date = Some(today + Duration::days(days));
    }

    let time = find_time(text);
    if let Some((hour, minute)) = time {
        draft
            .description
            .push_str(&format!(" (time: {hour:02}:{minute:02})"));
    }

    draft.priority = first_value(&lowered, PRIORITY_KEYWORDS).unwrap_or(DEFAULT_PRIORITY);
    draft.status = detect_status(&lowered);

    let seed = draft.priority;
    draft.priority = model.recommend(&draft.to_input(), today);

    tracing::debug!(
        offset = ?offset,
        time = ?time,
        seed,
        priority = draft.priority,
        model = model.name(),
        "extracted task draft"
    );

    draft
}
