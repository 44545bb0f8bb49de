use std::path::PathBuf;

use libgittask_core::TaskError;
use thiserror::Error;

/// Errors that can occur during Git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a git repository")]
    NotARepo,

    #[error("Bare repositories have no working tree for tasks")]
    BareRepo,

    #[error("Path is outside the working tree: {}", .0.display())]
    OutsideWorkdir(PathBuf),

    #[error("Path is not in the index: {0}")]
    NotTracked(String),

    #[error("Nothing to commit under {0}")]
    NothingToCommit(String),
}

impl From<GitError> for TaskError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::NotARepo | GitError::BareRepo => {
                TaskError::NotFound(format!("git repository with a working tree: {}", err))
            }
            GitError::Io(e) => TaskError::Io(e),
            GitError::NothingToCommit(dir) => {
                TaskError::InvalidArgs(format!("nothing to commit under {}", dir))
            }
            other => TaskError::vcs("git", String::new(), other),
        }
    }
}
