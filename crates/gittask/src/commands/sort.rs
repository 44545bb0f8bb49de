use libgittask_core::TaskError;
use libgittask_git::GitError;
use serde::Serialize;
use crate::cli::Cli;
use crate::context::TaskContext;
use crate::output::{output_success, print_human, warn_human};

/// Tag name prefix for commits produced by `sort --commit`
pub const SORT_TAG_PREFIX: &str = "sorted_fields_";

#[derive(Serialize)]
struct SortOutput {
    sorted: usize,
    skipped: Vec<String>,
    commit: Option<String>,
    tag: Option<String>,
}

pub fn run(cli: &Cli, commit: bool) -> Result<(), TaskError> {
    let ctx = TaskContext::resolve(cli)?;
    let report = ctx.store.sort_fields_in_dir()?;
    for skipped in &report.skipped {
        warn_human(cli, &format!("skipped {}: {}", skipped.file_name, skipped.reason));
    }
    print_human(cli, &format!("Sorted fields in {} task file(s)", report.sorted.len()));

    let mut output = SortOutput {
        sorted: report.sorted.len(),
        skipped: report.skipped.iter().map(|s| s.file_name.clone()).collect(),
        commit: None,
        tag: None,
    };

    if commit {
        match ctx.repo.commit_paths("Sort task fields", &ctx.repo.tasks_dir()) {
            Ok(oid) => {
                let tag = ctx.repo.tag_head(SORT_TAG_PREFIX)?;
                print_human(cli, &format!("Committed {} and tagged {}", &oid.to_string()[..7], tag));
                output.commit = Some(oid.to_string());
                output.tag = Some(tag);
            }
            Err(GitError::NothingToCommit(_)) => {
                print_human(cli, "Task files were already sorted, nothing to commit");
            }
            Err(e) => return Err(e.into()),
        }
    }

    output_success(cli, output);
    Ok(())
}
