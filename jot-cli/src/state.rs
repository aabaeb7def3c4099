use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$JOT_HOME`, or `~/.jot`.
pub fn jot_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("JOT_HOME").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".jot"))
}

pub fn ensure_jot_home() -> Result<PathBuf> {
    let dir = jot_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(ensure_jot_home()?.join("tasks.db"))
}
