//! Task model shared by the extractor, the recommenders and the validator.
//!
//! Two shapes exist on purpose:
//! - [`TaskDraft`]: typed, produced by extraction and validation.
//! - [`TaskInput`]: loose and all-optional, accepted by every scoring pass so
//!   that persisted or user-supplied records with missing or malformed fields
//!   still produce a result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Most urgent priority.
pub const MIN_PRIORITY: u8 = 1;
/// Least urgent priority.
pub const MAX_PRIORITY: u8 = 5;
/// Priority used whenever nothing better is known.
pub const DEFAULT_PRIORITY: u8 = 3;

/// Title used when a record arrives without one.
pub const UNTITLED: &str = "Untitled Task";

/// Clamp an arbitrary score into `[MIN_PRIORITY, MAX_PRIORITY]`.
pub fn clamp_priority(score: i64) -> u8 {
    score.clamp(MIN_PRIORITY as i64, MAX_PRIORITY as i64) as u8
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Exact, case-sensitive match on the wire name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema-valid (after validation) task record that has not been persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub priority: u8,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Pending,
            due_date: None,
            priority: DEFAULT_PRIORITY,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Loose view of this draft for the scoring passes.
    pub fn to_input(&self) -> TaskInput {
        TaskInput::from(self)
    }
}

/// Loose task record. No field is required.
///
/// `priority` is kept as raw JSON so that non-integer values can be detected
/// and reset instead of rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub priority: Option<serde_json::Value>,
}

impl TaskInput {
    /// Priority if it is an integer in range.
    pub fn valid_priority(&self) -> Option<u8> {
        let p = self.priority.as_ref()?.as_i64()?;
        if (MIN_PRIORITY as i64..=MAX_PRIORITY as i64).contains(&p) {
            Some(p as u8)
        } else {
            None
        }
    }

    pub fn status(&self) -> Option<TaskStatus> {
        self.status.as_deref().and_then(TaskStatus::parse)
    }

    /// Lowercased `title + " " + description`, the haystack for keyword passes.
    pub fn keyword_text(&self) -> String {
        format!(
            "{} {}",
            self.title.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or("")
        )
        .to_lowercase()
    }
}

impl From<&TaskDraft> for TaskInput {
    fn from(d: &TaskDraft) -> Self {
        Self {
            title: Some(d.title.clone()),
            description: Some(d.description.clone()),
            status: Some(d.status.as_str().to_string()),
            due_date: d.due_date.map(|dd| dd.format("%Y-%m-%d").to_string()),
            priority: Some(serde_json::Value::from(d.priority)),
        }
    }
}

impl From<TaskDraft> for TaskInput {
    fn from(d: TaskDraft) -> Self {
        TaskInput::from(&d)
    }
}
