//! Priority recommendation.
//!
//! Deterministic and rule-first. The rules are also the fallback for any
//! other [`PriorityModel`] (see `jot-cli`'s remote model).
//!
//! Stages run in a fixed order, each one overwriting or bounding the last:
//! 1) base score 3
//! 2) due-date proximity
//! 3) in-progress tightening
//! 4) keyword overrides (urgent > important, then low-priority)
//! 5) clamp to 1..=5

use chrono::NaiveDate;

use crate::keywords::{first_match, IMPORTANT_KEYWORDS, LOW_PRIORITY_KEYWORDS, URGENT_KEYWORDS};
use crate::task::{clamp_priority, TaskInput, TaskStatus, DEFAULT_PRIORITY};
use crate::time::days_until_raw;

/// Anything that can turn a task into a 1..=5 priority.
pub trait PriorityModel: Send + Sync {
    /// Short identifier for logs and API messages.
    fn name(&self) -> &str;

    fn recommend(&self, task: &TaskInput, today: NaiveDate) -> u8;
}

/// The keyword/date rule engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleModel;

impl PriorityModel for RuleModel {
    fn name(&self) -> &str {
        "rules"
    }

    fn recommend(&self, task: &TaskInput, today: NaiveDate) -> u8 {
        recommend(task, today)
    }
}

/// Map days-until-due onto a priority.
pub fn due_date_score(days: i64) -> i64 {
    match days {
        d if d <= 0 => 1,
        1..=2 => 2,
        3..=7 => 3,
        8..=30 => 4,
        _ => 5,
    }
}

/// Rule-based priority for `task` as of `today`.
pub fn recommend(task: &TaskInput, today: NaiveDate) -> u8 {
    let mut score = DEFAULT_PRIORITY as i64;

    // Unparseable dates are skipped, not reported.
    if let Some(days) = days_until_raw(task.due_date.as_deref(), today) {
        score = due_date_score(days);
    }

    if task.status() == Some(TaskStatus::InProgress) {
        score = (score - 1).max(1);
    }

    let text = task.keyword_text();
    if first_match(&text, URGENT_KEYWORDS).is_some() {
        score = 1;
    } else if score > 2 && first_match(&text, IMPORTANT_KEYWORDS).is_some() {
        score = score.min(2);
    }

    if score > 3 && first_match(&text, LOW_PRIORITY_KEYWORDS).is_some() {
        score = (score + 1).min(5);
    }

    clamp_priority(score)
}
