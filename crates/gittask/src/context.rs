use std::path::PathBuf;

use libgittask_core::{config, RepoConfig, TaskError, TaskStore};
use libgittask_git::GitRepo;
use crate::cli::Cli;

/// Resolved repository, store and configuration for a command
pub struct TaskContext {
    pub repo: GitRepo,
    pub store: TaskStore,
    pub config: RepoConfig,
}

impl TaskContext {
    /// Start directory for repository discovery: `--repo` or the cwd
    fn start_dir(cli: &Cli) -> Result<PathBuf, TaskError> {
        match &cli.repo {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Find the repository without requiring an initialized tasks directory
    pub fn find_repo(cli: &Cli) -> Result<GitRepo, TaskError> {
        let start = Self::start_dir(cli)?;
        Ok(GitRepo::discover(&start)?)
    }

    pub fn resolve(cli: &Cli) -> Result<Self, TaskError> {
        let repo = Self::find_repo(cli)?;
        let config = config::load_or_default(repo.workdir())?;
        let store = TaskStore::new(repo.data_dir());
        Ok(Self { repo, store, config })
    }
}
