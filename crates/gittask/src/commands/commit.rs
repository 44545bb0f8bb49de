use libgittask_core::TaskError;
use libgittask_git::GitError;
use serde::Serialize;
use crate::cli::Cli;
use crate::context::TaskContext;
use crate::output::{output_success, print_human};

pub const DEFAULT_COMMIT_MESSAGE: &str = "Update tasks";

#[derive(Serialize)]
struct CommitOutput {
    committed: bool,
    commit: Option<String>,
    branch: String,
}

pub fn run(cli: &Cli, message: Option<&str>) -> Result<(), TaskError> {
    let repo = TaskContext::find_repo(cli)?;
    let message = message.unwrap_or(DEFAULT_COMMIT_MESSAGE);
    let branch = repo.current_branch()?;

    let commit = match repo.commit_paths(message, &repo.tasks_dir()) {
        Ok(oid) => Some(oid.to_string()),
        Err(GitError::NothingToCommit(_)) => None,
        Err(e) => return Err(e.into()),
    };

    match &commit {
        Some(oid) => print_human(cli, &format!("[{} {}] {}", branch, &oid[..7], message)),
        None => print_human(cli, "Nothing to commit in .tasks"),
    }
    output_success(
        cli,
        CommitOutput {
            committed: commit.is_some(),
            commit,
            branch,
        },
    );
    Ok(())
}
