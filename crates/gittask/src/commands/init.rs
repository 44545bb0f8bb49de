use libgittask_core::{config, save_repo_config, RepoConfig, TaskError, TaskStore};
use serde::Serialize;
use crate::cli::Cli;
use crate::context::TaskContext;
use crate::output::{output_success, print_human};

#[derive(Serialize)]
struct InitOutput {
    tasks_dir: String,
    data_dir: String,
    config: String,
    config_created: bool,
}

pub fn run(cli: &Cli) -> Result<(), TaskError> {
    let repo = TaskContext::find_repo(cli)?;
    let workdir = repo.workdir();

    let store = TaskStore::new(repo.data_dir());
    store.ensure_data_dir()?;

    let config_path = config::config_path(workdir);
    let config_created = !config_path.exists();
    if config_created {
        save_repo_config(workdir, &RepoConfig::default())?;
    }
    repo.stage(&config_path)?;

    let output = InitOutput {
        tasks_dir: repo.tasks_dir().to_string_lossy().to_string(),
        data_dir: repo.data_dir().to_string_lossy().to_string(),
        config: config_path.to_string_lossy().to_string(),
        config_created,
    };

    output_success(cli, output);
    print_human(
        cli,
        &format!("Initialized gittask in {}", repo.tasks_dir().display()),
    );

    Ok(())
}
