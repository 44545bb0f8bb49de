use std::path::Path;

use libgittask_core::{
    jira::{issues_from_json, jira_rules, map_jira_issue},
    tasks::{apply_import, plan_import, ImportFailure},
    ConflictStrategy, Record, TaskError,
};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use crate::cli::{Cli, ImportCommand};
use crate::context::TaskContext;
use crate::output::{output_success, print_human, warn_human};

#[derive(Serialize)]
struct ImportOutput {
    source: &'static str,
    strategy: ConflictStrategy,
    external_id_field: String,
    dry_run: bool,
    issues: usize,
    adopted: usize,
    merged: usize,
    unchanged: usize,
    saved: Vec<String>,
    failed: Vec<ImportFailure>,
}

pub fn run(cli: &Cli, cmd: ImportCommand) -> Result<(), TaskError> {
    match cmd {
        ImportCommand::Jira {
            file,
            strategy,
            key,
            dry_run,
        } => jira(cli, &file, strategy.as_deref(), key, dry_run),
    }
}

fn jira(
    cli: &Cli,
    file: &Path,
    strategy: Option<&str>,
    key: Option<String>,
    dry_run: bool,
) -> Result<(), TaskError> {
    let ctx = TaskContext::resolve(cli)?;
    let strategy = match strategy {
        Some(name) => name.parse::<ConflictStrategy>()?,
        None => ctx.config.import.strategy,
    };
    let external_id_field = key.unwrap_or_else(|| ctx.config.import.external_id_field.clone());

    let text = std::fs::read_to_string(file)?;
    let issues = issues_from_json(serde_json::from_str::<Value>(&text)?)?;
    let rules = jira_rules()?;

    let mut mapped: Vec<Record> = Vec::with_capacity(issues.len());
    let mut failed = Vec::new();
    for issue in &issues {
        match map_jira_issue(issue, &rules, &ctx.config.task_defaults) {
            Ok(task) => mapped.push(task),
            Err(e) => {
                let key = issue.get("key").and_then(Value::as_str).map(str::to_string);
                warn!(issue = key.as_deref().unwrap_or("<unknown>"), error = %e, "skipping unmappable issue");
                failed.push(ImportFailure {
                    id: key,
                    error: e.to_string(),
                });
            }
        }
    }

    let plan = plan_import(&ctx.store, mapped, &external_id_field, strategy)?;
    let (adopted, merged, unchanged) = (plan.adopted, plan.merged, plan.unchanged);

    let saved = if dry_run {
        plan.records
            .iter()
            .filter_map(|r| r.id().map(str::to_string))
            .collect()
    } else {
        let report = apply_import(&ctx.store, &ctx.repo, plan);
        failed.extend(report.failed);
        report
            .saved
            .iter()
            .filter_map(|t| t.record.id().map(str::to_string))
            .collect::<Vec<_>>()
    };

    for failure in &failed {
        warn_human(
            cli,
            &format!(
                "{}: {}",
                failure.id.as_deref().unwrap_or("<unknown>"),
                failure.error
            ),
        );
    }
    let verb = if dry_run { "Would import" } else { "Imported" };
    print_human(
        cli,
        &format!(
            "{} {} of {} issue(s) with {}: {} new, {} merged, {} unchanged, {} failed",
            verb,
            saved.len(),
            issues.len(),
            strategy,
            adopted,
            merged,
            unchanged,
            failed.len()
        ),
    );

    output_success(
        cli,
        ImportOutput {
            source: "jira",
            strategy,
            external_id_field,
            dry_run,
            issues: issues.len(),
            adopted,
            merged,
            unchanged,
            saved,
            failed,
        },
    );
    Ok(())
}
