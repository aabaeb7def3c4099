use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use jot_core::{TaskDraft, TaskInput, TaskStatus};
use serde::{Deserialize, Serialize};

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    pub priority: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            due_date: self.due_date,
            priority: self.priority,
        }
    }
}

impl From<&Task> for TaskInput {
    fn from(t: &Task) -> Self {
        TaskInput::from(&t.draft())
    }
}

/// Partial update. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<u8>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_date.is_none()
            && self.priority.is_none()
    }

    pub fn priority(priority: u8) -> Self {
        Self {
            priority: Some(priority),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: i64,
    pub completed: i64,
    pub pending: i64,
    pub in_progress: i64,
    /// Due before today and not completed.
    pub overdue: i64,
    /// Percentage, one decimal.
    pub completion_rate: f64,
    /// `priority_N` → count, only for priorities that occur.
    pub priority_distribution: BTreeMap<String, i64>,
    /// Priority 1 or 2.
    pub high_priority_tasks: i64,
}
