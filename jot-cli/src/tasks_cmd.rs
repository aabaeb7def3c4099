use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use jot_core::{
    analyze, extract_with, recommendation, validate, PriorityModel, TaskDraft, TaskInput,
    TaskStatus,
};
use jot_store::{Task, TaskPatch, TaskStore};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::limits::check_patch_fields;
use crate::llm::build_model;

/// Everything a task command needs: store, model and "today".
pub struct Session {
    pub store: TaskStore,
    pub model: Arc<dyn PriorityModel>,
    pub today: NaiveDate,
}

impl Session {
    pub fn open(cfg: &Config) -> Result<Self> {
        let today = cfg.today()?;
        let store = TaskStore::open(&cfg.database_path()?)?;
        let model = build_model(&cfg.inference)?;
        Ok(Self {
            store,
            model,
            today,
        })
    }

    fn task(&self, id: i64) -> Result<Task> {
        match self.store.get(id)? {
            Some(t) => Ok(t),
            None => bail!("no task with id {id}"),
        }
    }

    fn parse_text(&self, text: &str) -> TaskDraft {
        validate(extract_with(text, self.today, self.model.as_ref()).to_input())
    }
}

pub fn parse_status(s: &str) -> std::result::Result<TaskStatus, String> {
    TaskStatus::parse(s).ok_or_else(|| {
        let all: Vec<&str> = TaskStatus::ALL.iter().map(|st| st.as_str()).collect();
        format!("unknown status {s:?} (expected one of: {})", all.join(", "))
    })
}

fn due_label(due: Option<NaiveDate>) -> String {
    due.map(|d| format!(" (due {d})")).unwrap_or_default()
}

fn print_draft(d: &TaskDraft) {
    println!("title:       {}", d.title);
    println!("description: {}", d.description);
    println!("status:      {}", d.status);
    println!(
        "due:         {}",
        d.due_date.map(|x| x.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!("priority:    {}", d.priority);
}

fn print_task(t: &Task) {
    println!("#{}", t.id);
    print_draft(&t.draft());
    println!("created:     {}", t.created_at.to_rfc3339());
    println!("updated:     {}", t.updated_at.to_rfc3339());
}

fn task_line(t: &Task) -> String {
    format!(
        "#{:<4} p{} [{}] {}{}",
        t.id,
        t.priority,
        t.status,
        t.title,
        due_label(t.due_date)
    )
}

pub fn parse(s: &Session, text: &str, as_json: bool) -> Result<()> {
    let draft = s.parse_text(text);
    if as_json {
        println!("{}", serde_json::to_string_pretty(&draft)?);
    } else {
        print_draft(&draft);
    }
    Ok(())
}

pub fn add(s: &Session, text: &str) -> Result<()> {
    let task = s.store.create(&s.parse_text(text))?;
    println!("Added {}", task_line(&task));
    Ok(())
}

pub fn list(s: &Session, status: Option<TaskStatus>) -> Result<()> {
    let tasks = s.store.list(status)?;
    if tasks.is_empty() {
        println!("(no tasks)");
        return Ok(());
    }
    for t in &tasks {
        println!("{}", task_line(t));
    }
    Ok(())
}

pub fn show(s: &Session, id: i64) -> Result<()> {
    print_task(&s.task(id)?);
    Ok(())
}

pub fn update(s: &Session, id: i64, patch: TaskPatch) -> Result<()> {
    if patch.is_empty() {
        bail!("nothing to update; pass at least one of --title, --description, --status, --due, --priority");
    }
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        bail!("--title cannot be empty");
    }
    if let Err(msg) = check_patch_fields(&patch) {
        bail!("{msg}");
    }
    match s.store.update(id, &patch)? {
        Some(t) => println!("Updated {}", task_line(&t)),
        None => bail!("no task with id {id}"),
    }
    Ok(())
}

pub fn delete(s: &Session, id: i64) -> Result<()> {
    if !s.store.delete(id)? {
        bail!("no task with id {id}");
    }
    println!("Deleted #{id}");
    Ok(())
}

pub fn recommend(s: &Session, id: i64, apply: bool) -> Result<()> {
    let task = s.task(id)?;
    let rec = recommendation(&TaskInput::from(&task), s.model.as_ref(), s.today);
    println!(
        "#{id} {}: priority {} -> {} (confidence {:.1})",
        task.title, rec.current_priority, rec.recommended_priority, rec.confidence
    );
    println!("  {}", rec.reason);

    if apply && rec.recommended_priority != rec.current_priority {
        s.store
            .update(id, &TaskPatch::priority(rec.recommended_priority))?
            .with_context(|| format!("task {id} vanished during update"))?;
        println!("Applied priority {}", rec.recommended_priority);
    }
    Ok(())
}

pub fn analyze_task(s: &Session, id: i64) -> Result<()> {
    let task = s.task(id)?;
    let a = analyze(&TaskInput::from(&task), s.today);
    println!("#{id} {}", task.title);
    println!("  urgency:    {:?}", a.urgency);
    println!("  importance: {:?}", a.importance);
    println!("  priority:   {} (stored {})", a.priority, task.priority);
    Ok(())
}

pub fn stats(s: &Session) -> Result<()> {
    let st = s.store.stats(s.today)?;
    println!("total:        {}", st.total);
    println!("pending:      {}", st.pending);
    println!("in progress:  {}", st.in_progress);
    println!("completed:    {} ({}%)", st.completed, st.completion_rate);
    println!("overdue:      {}", st.overdue);
    println!("high (p1-p2): {}", st.high_priority_tasks);
    for (k, v) in &st.priority_distribution {
        println!("  {k}: {v}");
    }
    Ok(())
}

pub const CSV_HEADER: [&str; 8] = [
    "id",
    "title",
    "description",
    "status",
    "due_date",
    "priority",
    "created_at",
    "updated_at",
];

pub fn write_csv<W: Write>(tasks: &[Task], out: W) -> Result<()> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(CSV_HEADER)?;
    for t in tasks {
        w.write_record([
            t.id.to_string(),
            t.title.clone(),
            t.description.clone(),
            t.status.to_string(),
            t.due_date.map(|d| d.to_string()).unwrap_or_default(),
            t.priority.to_string(),
            t.created_at.to_rfc3339(),
            t.updated_at.to_rfc3339(),
        ])?;
    }
    w.flush().context("flush csv")?;
    Ok(())
}

pub fn export_csv(s: &Session, path: &Path) -> Result<()> {
    let tasks = s.store.list(None)?;
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(&tasks, f)?;
    println!("Exported {} tasks to {}", tasks.len(), path.display());
    Ok(())
}
