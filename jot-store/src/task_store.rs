//! SQLite task table.
//!
//! Single connection, single writer. Callers that share a store across
//! threads wrap it in a mutex.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use jot_core::{clamp_priority, TaskDraft, TaskStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::types::{Task, TaskPatch, TaskStats};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'pending',
    due_date TEXT,
    priority INTEGER NOT NULL DEFAULT 3,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_status ON tasks(status);
CREATE INDEX IF NOT EXISTS idx_due_date ON tasks(due_date);
"#;

pub struct TaskStore {
    conn: Connection,
}

impl TaskStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .context("set journal_mode")?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .context("set synchronous")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).context("create tasks schema")?;
        tracing::debug!("task schema ready");
        Ok(Self { conn })
    }

    /// All tasks, newest first, optionally filtered by status.
    pub fn list(&self, status: Option<TaskStatus>) -> Result<Vec<Task>> {
        let tasks = match status {
            Some(st) => {
                let mut stmt = self.conn.prepare(
                    "SELECT * FROM tasks WHERE status = ?1 ORDER BY created_at DESC, id DESC",
                )?;
                let rows = stmt.query_map(params![st.as_str()], task_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            }
            None => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT * FROM tasks ORDER BY created_at DESC, id DESC")?;
                let rows = stmt.query_map([], task_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            }
        };
        tasks.context("list tasks")
    }

    pub fn get(&self, id: i64) -> Result<Option<Task>> {
        self.conn
            .query_row("SELECT * FROM tasks WHERE id = ?1", params![id], task_from_row)
            .optional()
            .with_context(|| format!("get task {id}"))
    }

    pub fn create(&self, draft: &TaskDraft) -> Result<Task> {
        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO tasks (title, description, status, due_date, priority, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    draft.title,
                    draft.description,
                    draft.status.as_str(),
                    draft.due_date,
                    draft.priority,
                    now,
                ],
            )
            .context("insert task")?;

        let id = self.conn.last_insert_rowid();
        tracing::info!(id, title = %draft.title, "task created");
        self.get(id)?
            .with_context(|| format!("task {id} missing after insert"))
    }

    /// Apply `patch`; `Ok(None)` when the task does not exist.
    pub fn update(&self, id: i64, patch: &TaskPatch) -> Result<Option<Task>> {
        let Some(mut task) = self.get(id)? else {
            return Ok(None);
        };

        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = description.clone();
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(priority) = patch.priority {
            task.priority = clamp_priority(priority as i64);
        }
        task.updated_at = Utc::now();

        self.conn
            .execute(
                "UPDATE tasks SET
                   title = ?1, description = ?2, status = ?3, due_date = ?4,
                   priority = ?5, updated_at = ?6
                 WHERE id = ?7",
                params![
                    task.title,
                    task.description,
                    task.status.as_str(),
                    task.due_date,
                    task.priority,
                    task.updated_at,
                    id,
                ],
            )
            .with_context(|| format!("update task {id}"))?;

        tracing::info!(id, "task updated");
        self.get(id)
    }

    /// `true` when a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .with_context(|| format!("delete task {id}"))?;
        if n > 0 {
            tracing::info!(id, "task deleted");
        }
        Ok(n > 0)
    }

    /// Aggregate counts; `today` decides what is overdue.
    pub fn stats(&self, today: NaiveDate) -> Result<TaskStats> {
        let count = |sql: &str, p: &[&dyn rusqlite::ToSql]| -> Result<i64> {
            self.conn
                .query_row(sql, p, |r| r.get(0))
                .with_context(|| format!("stats query: {sql}"))
        };

        let total = count("SELECT COUNT(*) FROM tasks", &[])?;
        let by_status = "SELECT COUNT(*) FROM tasks WHERE status = ?1";
        let completed = count(by_status, &[&TaskStatus::Completed.as_str()])?;
        let pending = count(by_status, &[&TaskStatus::Pending.as_str()])?;
        let in_progress = count(by_status, &[&TaskStatus::InProgress.as_str()])?;
        let overdue = count(
            "SELECT COUNT(*) FROM tasks WHERE due_date < ?1 AND status != 'completed'",
            &[&today],
        )?;
        let high_priority_tasks = count("SELECT COUNT(*) FROM tasks WHERE priority <= 2", &[])?;

        let mut stmt = self
            .conn
            .prepare("SELECT priority, COUNT(*) FROM tasks GROUP BY priority ORDER BY priority")?;
        let priority_distribution = stmt
            .query_map([], |r| {
                Ok((format!("priority_{}", r.get::<_, i64>(0)?), r.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<BTreeMap<_, _>>>()
            .context("priority distribution")?;

        let completion_rate = if total > 0 {
            ((completed as f64 / total as f64) * 1000.0).round() / 10.0
        } else {
            0.0
        };

        Ok(TaskStats {
            total,
            completed,
            pending,
            in_progress,
            overdue,
            completion_rate,
            priority_distribution,
            high_priority_tasks,
        })
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let priority: i64 = row.get("priority")?;
    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status: TaskStatus::parse(&status).unwrap_or_default(),
        due_date: row.get("due_date")?,
        priority: clamp_priority(priority),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
