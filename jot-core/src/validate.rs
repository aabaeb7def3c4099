//! Coerce a loose record into a schema-valid [`TaskDraft`]. Never fails.

use crate::task::{TaskDraft, TaskInput, TaskStatus, DEFAULT_PRIORITY, UNTITLED};
use crate::time::parse_due_date;

/// Maximum description length in characters (before the "..." marker).
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

pub fn validate(input: TaskInput) -> TaskDraft {
    // Blank titles are replaced; anything else is kept as written.
    let title = match &input.title {
        Some(t) if !t.trim().is_empty() => t.clone(),
        _ => UNTITLED.to_string(),
    };

    let priority = input.valid_priority().unwrap_or(DEFAULT_PRIORITY);
    let status = input.status().unwrap_or(TaskStatus::Pending);

    let due_date = input.due_date.as_deref().and_then(|raw| {
        let parsed = parse_due_date(raw);
        if parsed.is_none() {
            tracing::debug!(due_date = raw, "dropping unparseable due date");
        }
        parsed
    });

    let mut description = input.description.unwrap_or_default();
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        description = description.chars().take(MAX_DESCRIPTION_CHARS).collect();
        description.push_str("...");
    }

    TaskDraft {
        title,
        description,
        status,
        due_date,
        priority,
    }
}
