//! Importance analysis: a second, independent look at a task.
//!
//! This does not have to agree with [`crate::recommend`]; the two passes use
//! different thresholds and keyword sets and are exposed separately.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::keywords::{contains_keyword, IMPORTANCE_BUCKETS};
use crate::task::{clamp_priority, TaskInput, DEFAULT_PRIORITY};
use crate::time::days_until_raw;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

/// Importance labels. `Critical` is produced by the first keyword bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportanceAnalysis {
    pub priority: u8,
    pub urgency: Urgency,
    pub importance: Importance,
}

/// Urgency from days-until-due; `Medium` when unknown.
pub fn urgency_for(days: Option<i64>) -> Urgency {
    match days {
        None => Urgency::Medium,
        Some(d) if d < 0 => Urgency::Critical,
        Some(d) if d <= 1 => Urgency::High,
        Some(d) if d <= 3 => Urgency::Medium,
        Some(_) => Urgency::Low,
    }
}

/// First bucket with any keyword contained in `text`; `Medium` when none.
pub fn importance_for(text: &str) -> Importance {
    IMPORTANCE_BUCKETS
        .iter()
        .find(|(_, kws)| kws.iter().any(|kw| contains_keyword(text, kw)))
        .map(|(level, _)| *level)
        .unwrap_or(Importance::Medium)
}

pub fn analyze(task: &TaskInput, today: NaiveDate) -> ImportanceAnalysis {
    let urgency = urgency_for(days_until_raw(task.due_date.as_deref(), today));
    let importance = importance_for(&task.keyword_text());

    let mut priority = task.valid_priority().unwrap_or(DEFAULT_PRIORITY) as i64;
    if urgency == Urgency::Critical || importance == Importance::Critical {
        priority = 1;
    } else if urgency == Urgency::High || importance == Importance::High {
        priority = priority.min(2);
    } else if urgency == Urgency::Low && importance == Importance::Low {
        priority = priority.max(4);
    }

    ImportanceAnalysis {
        priority: clamp_priority(priority),
        urgency,
        importance,
    }
}
