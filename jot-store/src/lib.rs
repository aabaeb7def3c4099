//! jot-store: SQLite persistence for jot tasks.

pub mod task_store;
pub mod types;

pub use task_store::TaskStore;
pub use types::{Task, TaskPatch, TaskStats};
