use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use libgittask_core::{TaskError, TrackedRecord};
use serde::Serialize;
use crate::cli::Cli;

/// JSON response envelope
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    pub schema_version: u32,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonError>,
}

#[derive(Serialize)]
pub struct JsonError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

fn to_pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"ok\": false, \"error\": \"serialization failed: {}\"}}", e))
}

/// Output a successful result. Human mode prints nothing here; commands
/// call `print_human` with their own rendering.
pub fn output_success<T: Serialize>(cli: &Cli, data: T) {
    if cli.json {
        let response = JsonResponse {
            schema_version: 1,
            ok: true,
            data: Some(data),
            error: None,
        };
        println!("{}", to_pretty(&response));
    }
}

/// Output an error
pub fn output_error(cli: &Cli, err: &TaskError) {
    if cli.json {
        let suggestions = err.suggestions();
        let details = if suggestions.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::json!({ "suggestions": suggestions })
        };

        let response: JsonResponse<()> = JsonResponse {
            schema_version: 1,
            ok: false,
            data: None,
            error: Some(JsonError {
                code: err.error_code().to_string(),
                message: err.to_string(),
                details,
            }),
        };
        eprintln!("{}", to_pretty(&response));
    } else {
        eprintln!("error: {}", err);
        let suggestions = err.suggestions();
        if !suggestions.is_empty() {
            eprintln!();
            eprintln!("Suggestions:");
            for suggestion in suggestions {
                eprintln!("  - {}", suggestion);
            }
        }
    }
}

/// Print human-readable output (ignored in quiet mode)
pub fn print_human(cli: &Cli, msg: &str) {
    if !cli.json && !cli.quiet {
        println!("{}", msg);
    }
}

/// Print a warning to stderr in human mode
pub fn warn_human(cli: &Cli, msg: &str) {
    if !cli.json && !cli.quiet {
        eprintln!("warning: {}", msg);
    }
}

/// First eight characters of a task id
pub fn short_id(id: &str) -> &str {
    id.char_indices().nth(8).map_or(id, |(i, _)| &id[..i])
}

/// Render a field value for a table cell or a `key: value` line
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Task table for `list`
pub fn task_table(tasks: &[TrackedRecord]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["ID", "Git", "Status", "Title", "Pending", "Assigned"]);
    for task in tasks {
        let field = |name: &str| task.record.get(name).map(display_value).unwrap_or_default();
        table.add_row(vec![
            short_id(task.record.id().unwrap_or_default()).to_string(),
            task.state.describe().to_string(),
            field("status"),
            field("title"),
            field("pending"),
            field("assignedTo"),
        ]);
    }
    table
}

/// `key: value` lines in key order, id first
pub fn task_lines(task: &TrackedRecord) -> String {
    let mut lines = vec![format!("id: {}", task.record.id().unwrap_or_default())];
    let mut keys: Vec<&String> = task.record.keys().filter(|k| k.as_str() != "id").collect();
    keys.sort();
    for key in keys {
        if let Some(value) = task.record.get(key) {
            lines.push(format!("{}: {}", key, display_value(value)));
        }
    }
    lines.push(format!("gitStatus: {:?} ({})", task.state.as_str(), task.state.describe()));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use libgittask_core::{Record, SyncState};
    use serde_json::json;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_task_lines_sorted_with_state() {
        let record = Record::from_value(json!({ "title": "t", "id": "abc", "assignedTo": null })).unwrap();
        let text = task_lines(&TrackedRecord::new(record, SyncState::UNTRACKED));
        assert_eq!(text, "id: abc\nassignedTo: \ntitle: t\ngitStatus: \"??\" (untracked)");
    }
}
