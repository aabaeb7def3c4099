//! Field limits shared by the HTTP API and the `jot update` command.

use jot_core::{MAX_PRIORITY, MIN_PRIORITY};
use jot_store::TaskPatch;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

pub fn check_title(title: &str) -> Result<(), String> {
    let n = title.chars().count();
    if n == 0 || n > MAX_TITLE_CHARS {
        return Err(format!("title must be 1-{MAX_TITLE_CHARS} characters"));
    }
    Ok(())
}

pub fn check_description(description: &str) -> Result<(), String> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(format!(
            "description must be at most {MAX_DESCRIPTION_CHARS} characters"
        ));
    }
    Ok(())
}

pub fn check_priority(priority: u8) -> Result<(), String> {
    if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&priority) {
        return Err(format!(
            "priority must be between {MIN_PRIORITY} and {MAX_PRIORITY}"
        ));
    }
    Ok(())
}

/// Field checks for the fields a patch sets. Emptiness is the caller's call.
pub fn check_patch_fields(patch: &TaskPatch) -> Result<(), String> {
    if let Some(title) = &patch.title {
        check_title(title)?;
    }
    if let Some(description) = &patch.description {
        check_description(description)?;
    }
    if let Some(priority) = patch.priority {
        check_priority(priority)?;
    }
    Ok(())
}
