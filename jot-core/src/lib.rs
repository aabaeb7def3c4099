//! jot-core: text-to-task inference for the jot task manager.
//!
//! Everything here is pure and synchronous. Functions that depend on the
//! current date take `today` explicitly; use [`time::today_in`] at the edges.

pub mod extract;
pub mod importance;
pub mod keywords;
pub mod reason;
pub mod recommend;
pub mod task;
pub mod time;
pub mod validate;

pub use extract::{extract, extract_with};
pub use importance::{analyze, Importance, ImportanceAnalysis, Urgency};
pub use reason::{explain, recommendation, PriorityRecommendation};
pub use recommend::{recommend, PriorityModel, RuleModel};
pub use task::{
    clamp_priority, TaskDraft, TaskInput, TaskStatus, DEFAULT_PRIORITY, MAX_PRIORITY,
    MIN_PRIORITY, UNTITLED,
};
pub use time::{parse_due_date, today_in};
pub use validate::validate;
