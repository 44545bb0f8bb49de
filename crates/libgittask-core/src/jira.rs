//! Mapping rules for JIRA issues (REST API v2 issue documents).

use chrono::DateTime;
use serde_json::{Number, Value};

use crate::error::TaskError;
use crate::mapper::{FieldMapper, RuleTable};
use crate::types::record::{value_kind, FIELD_CREATED_AT, FIELD_ID, FIELD_STATUS, FIELD_UPDATED_AT};
use crate::types::{generate_task_id, Record};

/// Record field that keeps the JIRA issue id (from the `.*` rule on `id`)
pub const JIRA_EXTERNAL_ID_FIELD: &str = "jira_id";

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Rule table turning a JIRA issue into a task record
pub fn jira_rules() -> Result<RuleTable, TaskError> {
    RuleTable::new()
        .field(".fields.status", |task, issue| {
            let name = issue["fields"]["status"]["name"]
                .as_str()
                .ok_or("status has no name")?;
            task.insert(FIELD_STATUS, name);
            Ok(())
        })?
        .field(".fields.created", |task, issue| {
            set_timestamp(task, FIELD_CREATED_AT, &issue["fields"]["created"])
        })?
        .field(".fields.updated", |task, issue| {
            set_timestamp(task, FIELD_UPDATED_AT, &issue["fields"]["updated"])
        })?
        .field(".fields.timeestimate", |task, issue| {
            if let Some(estimate) = seconds(&issue["fields"]["timeestimate"])? {
                task.insert("estimation", hours(estimate));
            }
            Ok(())
        })?
        .field(".fields.timespent", |task, issue| {
            let estimate = seconds(&issue["fields"]["timeestimate"])?;
            let spent = seconds(&issue["fields"]["timespent"])?.unwrap_or(0.0);
            if let Some(estimate) = estimate {
                task.insert("pending", hours(estimate - spent));
            }
            Ok(())
        })?
        .field(".fields.summary", |task, issue| {
            task.insert("title", issue["fields"]["summary"].clone());
            Ok(())
        })?
        .field(".fields.labels", |task, issue| {
            let labels: Vec<&str> = match &issue["fields"]["labels"] {
                Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                _ => Vec::new(),
            };
            if !labels.is_empty() {
                task.insert("tags", labels.join(","));
            }
            Ok(())
        })?
        .field(".fields.assignee", |task, issue| {
            let key = issue["fields"]["assignee"]["key"].clone();
            task.insert("assignedTo", key);
            Ok(())
        })?
        .wildcard(".fields.*", |task, issue, name| {
            task.insert(format!("jira_fields_{}", name), issue["fields"][name].clone());
            Ok(())
        })?
        .wildcard(".*", |task, issue, name| {
            task.insert(format!("jira_{}", name), issue[name].clone());
            Ok(())
        })
}

/// Map one issue onto a copy of `template` and give it a fresh task id
pub fn map_jira_issue(
    issue: &Value,
    rules: &RuleTable,
    template: &Record,
) -> Result<Record, TaskError> {
    let mut task = FieldMapper::new(rules)
        .with_template(template.clone())
        .map(issue)?;
    task.insert(FIELD_ID, generate_task_id());
    Ok(task)
}

/// Issues from an export file: a plain array, or a search response with
/// an `issues` array
pub fn issues_from_json(value: Value) -> Result<Vec<Value>, TaskError> {
    match value {
        Value::Array(issues) => Ok(issues),
        Value::Object(mut response) => match response.remove("issues") {
            Some(Value::Array(issues)) => Ok(issues),
            _ => Err(TaskError::InvalidArgs(
                "expected a JSON array of issues or an object with an 'issues' array".to_string(),
            )),
        },
        other => Err(TaskError::InvalidArgs(format!(
            "expected a JSON array of issues, got {}",
            value_kind(&other)
        ))),
    }
}

/// Epoch milliseconds of a JIRA timestamp (`2016-09-19T18:37:13.000+0200`)
pub fn parse_timestamp(text: &str) -> Result<i64, String> {
    DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| format!("invalid timestamp {:?}: {}", text, e))
}

fn set_timestamp(task: &mut Record, field: &str, value: &Value) -> Result<(), String> {
    match value {
        Value::Null => Ok(()),
        Value::String(text) => {
            task.insert(field, parse_timestamp(text)?);
            Ok(())
        }
        other => Err(format!("expected a timestamp string, got {}", value_kind(other))),
    }
}

fn seconds(value: &Value) -> Result<Option<f64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("expected a number of seconds, got {:?}", s)),
        other => Err(format!("expected a number of seconds, got {}", value_kind(other))),
    }
}

/// Whole hours stay integers in the record
fn hours(seconds: f64) -> Value {
    let hours = seconds / SECONDS_PER_HOUR;
    if hours.fract() == 0.0 && hours.abs() < i64::MAX as f64 {
        Value::from(hours as i64)
    } else {
        Number::from_f64(hours).map_or(Value::Null, Value::Number)
    }
}
