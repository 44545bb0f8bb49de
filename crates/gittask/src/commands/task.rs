use std::io::Read;
use std::path::Path;

use libgittask_core::{
    resolve_state,
    tasks::{new_task, read_tasks, save_task},
    Record, SyncState, TaskError, TrackedRecord,
};
use serde::Serialize;
use serde_json::Value;
use crate::cli::Cli;
use crate::context::TaskContext;
use crate::output::{output_success, print_human, short_id, task_lines, task_table, warn_human};

#[derive(Serialize)]
struct TaskListOutput<'a> {
    branch: String,
    tasks: &'a [TrackedRecord],
    total: usize,
    skipped: Vec<String>,
}

#[derive(Serialize)]
struct TaskDeleteOutput {
    id: String,
    deleted: bool,
}

/// `key:value`; the value is JSON when it parses as a number, boolean or
/// null, otherwise the raw text. Entries without a colon are ignored.
fn parse_property(property: &str) -> Option<(String, Value)> {
    let (key, value) = property.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    let value = value.trim();
    let parsed = match serde_json::from_str::<Value>(value) {
        Ok(v @ (Value::Number(_) | Value::Bool(_) | Value::Null)) => v,
        _ => Value::String(value.to_string()),
    };
    Some((key.to_string(), parsed))
}

pub fn add(cli: &Cli, title: &[String], properties: &[String]) -> Result<(), TaskError> {
    let ctx = TaskContext::resolve(cli)?;
    let mut props = Vec::new();
    for property in properties {
        match parse_property(property) {
            Some(prop) => props.push(prop),
            None => warn_human(cli, &format!("ignoring property without key:value form: {}", property)),
        }
    }
    let task = new_task(&ctx.config.task_defaults, &title.join(" "), props);
    if let Some(status) = task.status() {
        if !ctx.config.is_known_status(status) {
            warn_human(cli, &format!("status '{}' is not one of the configured statuses", status));
        }
    }

    let saved = save_task(&ctx.store, &ctx.repo, TrackedRecord::new(task, SyncState::STAGED_ADDED))?;
    let id = saved.record.id().unwrap_or_default().to_string();
    output_success(cli, &saved);
    print_human(cli, &format!("Created task {}", short_id(&id)));
    Ok(())
}

pub fn list(cli: &Cli) -> Result<(), TaskError> {
    let ctx = TaskContext::resolve(cli)?;
    let listing = read_tasks(&ctx.store, &ctx.repo)?;
    let branch = ctx.repo.current_branch()?;

    for skipped in &listing.skipped {
        warn_human(cli, &format!("skipped {}: {}", skipped.file_name, skipped.reason));
    }

    output_success(
        cli,
        TaskListOutput {
            branch: branch.clone(),
            tasks: &listing.tasks,
            total: listing.tasks.len(),
            skipped: listing.skipped.iter().map(|s| s.file_name.clone()).collect(),
        },
    );
    if listing.tasks.is_empty() {
        print_human(cli, "No tasks");
    } else {
        print_human(cli, &task_table(&listing.tasks).to_string());
        print_human(cli, &format!("{} task(s) on branch {}", listing.tasks.len(), branch));
    }
    Ok(())
}

pub fn show(cli: &Cli, id: &str) -> Result<(), TaskError> {
    let ctx = TaskContext::resolve(cli)?;
    let record = ctx.store.read(id)?;
    let path = ctx.store.record_path(id)?;
    let lines = ctx.repo.status_lines(&path)?;
    let task = TrackedRecord::new(record, resolve_state(Some(id), lines.as_slice()));

    output_success(cli, &task);
    print_human(cli, &task_lines(&task));
    Ok(())
}

pub fn save(cli: &Cli, file: Option<&Path>) -> Result<(), TaskError> {
    let ctx = TaskContext::resolve(cli)?;
    let text = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            text
        }
    };
    let body: Value = serde_json::from_str(&text)?;
    let request = TrackedRecord::from_request(Record::from_value(body)?)?;
    let requested = request.state;

    let saved = save_task(&ctx.store, &ctx.repo, request)?;
    let id = saved.record.id().unwrap_or_default().to_string();
    output_success(cli, &saved);
    if requested == SyncState::DISCARD {
        print_human(cli, &format!("Discarded changes to task {}", short_id(&id)));
    } else {
        print_human(
            cli,
            &format!("Saved task {} ({})", short_id(&id), saved.state.describe()),
        );
    }
    Ok(())
}

pub fn delete(cli: &Cli, id: &str) -> Result<(), TaskError> {
    let ctx = TaskContext::resolve(cli)?;
    if !ctx.store.exists(id) {
        return Err(TaskError::task_not_found(id));
    }
    let path = ctx.store.record_path(id)?;
    ctx.repo.remove(&path)?;

    output_success(
        cli,
        TaskDeleteOutput {
            id: id.to_string(),
            deleted: true,
        },
    );
    print_human(cli, &format!("Deleted task {}", short_id(id)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_property() {
        assert_eq!(parse_property("estimation:2"), Some(("estimation".to_string(), json!(2))));
        assert_eq!(parse_property(" done : true "), Some(("done".to_string(), json!(true))));
        assert_eq!(
            parse_property("url:http://example.com"),
            Some(("url".to_string(), json!("http://example.com")))
        );
        assert_eq!(parse_property("tags:[1]"), Some(("tags".to_string(), json!("[1]"))));
        assert_eq!(parse_property("novalue"), None);
        assert_eq!(parse_property(":x"), None);
    }
}
