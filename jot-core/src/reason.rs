//! Human-readable explanations for recommended priorities.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::keywords::{first_match, REASON_IMPORTANT, REASON_LOW, REASON_URGENT};
use crate::recommend::PriorityModel;
use crate::task::{TaskInput, TaskStatus, DEFAULT_PRIORITY};
use crate::time::days_until_raw;

/// Response body for "recommend a priority for this task".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRecommendation {
    pub current_priority: u8,
    pub recommended_priority: u8,
    pub reason: String,
    /// 0.0..=1.0
    pub confidence: f64,
}

/// Canned sentence for a priority level when no specific clause applies.
pub fn generic_reason(priority: u8) -> &'static str {
    match priority {
        1 => "Based on content and timing, handle this immediately",
        2 => "Relatively important, schedule it early",
        3 => "Normal task, handle it as planned",
        4 => "Not urgent, can be handled later",
        5 => "No time pressure, handle it in spare time",
        _ => "Recommended from task analysis",
    }
}

fn due_clause(days: i64) -> Option<String> {
    match days {
        d if d < 0 => Some("Task is overdue and needs immediate attention".to_string()),
        0 => Some("Due today".to_string()),
        1 => Some("Only 1 day left until the due date".to_string()),
        2 => Some("Only 2 days left until the due date".to_string()),
        3..=7 => Some("Due within a week".to_string()),
        _ => None,
    }
}

/// Explain a task's priority. `text` is the raw input, if any.
///
/// Clauses, in order: due date, keywords (urgent > important > low), in
/// progress. Falls back to [`generic_reason`] for the task's priority.
pub fn explain(text: &str, task: &TaskInput, today: NaiveDate) -> String {
    let mut reasons: Vec<String> = Vec::new();

    if let Some(clause) = days_until_raw(task.due_date.as_deref(), today).and_then(due_clause) {
        reasons.push(clause);
    }

    let haystack = format!("{} {}", text.to_lowercase(), task.keyword_text());
    if first_match(&haystack, REASON_URGENT).is_some() {
        reasons.push("Urgent keywords detected".to_string());
    } else if first_match(&haystack, REASON_IMPORTANT).is_some() {
        reasons.push("Important keywords detected".to_string());
    } else if first_match(&haystack, REASON_LOW).is_some() {
        reasons.push("Low-priority keywords detected".to_string());
    }

    if task.status() == Some(TaskStatus::InProgress) {
        reasons.push("Task is already in progress".to_string());
    }

    if reasons.is_empty() {
        let priority = task.valid_priority().unwrap_or(DEFAULT_PRIORITY);
        reasons.push(generic_reason(priority).to_string());
    }

    reasons.join("; ")
}

/// Confidence grows with the evidence available on the task.
pub fn confidence(task: &TaskInput) -> f64 {
    let mut c: f64 = 0.7;
    if task.due_date.as_deref().is_some_and(|d| !d.is_empty()) {
        c += 0.2;
    }
    if task.description.as_deref().is_some_and(|d| d.chars().count() > 10) {
        c += 0.1;
    }
    c.min(1.0)
}

/// Run `model` on `task` and package the result with a reason and confidence.
pub fn recommendation(
    task: &TaskInput,
    model: &dyn PriorityModel,
    today: NaiveDate,
) -> PriorityRecommendation {
    let current = task.valid_priority().unwrap_or(DEFAULT_PRIORITY);
    let recommended = model.recommend(task, today);

    let mut explained = task.clone();
    explained.priority = Some(serde_json::Value::from(recommended));
    let title = task.title.as_deref().unwrap_or("");

    PriorityRecommendation {
        current_priority: current,
        recommended_priority: recommended,
        reason: explain(title, &explained, today),
        confidence: confidence(task),
    }
}
