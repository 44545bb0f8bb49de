use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::TaskError;
use crate::merge::ConflictStrategy;
use crate::types::Record;

/// Directory holding everything gittask owns inside a working tree
pub const TASKS_DIR: &str = ".tasks";
/// Record files, one per task, under the tasks directory
pub const DATA_DIR: &str = "data";
pub const CONFIG_FILE: &str = "config.toml";

/// Repo-level configuration stored in .tasks/config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Dashboard server port
    pub port: u16,
    /// Dashboard server bind address
    pub bind_address: String,
    /// Allowed values of the `status` field
    pub statuses: Vec<String>,
    /// Fields the dashboard shows but does not edit
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub readonly_fields: Vec<String>,
    /// Fields rendered as dates (epoch milliseconds)
    pub date_fields: Vec<String>,
    /// Starting point of every new or imported task
    pub task_defaults: Record,
    pub import: ImportConfig,
}

/// Import settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub strategy: ConflictStrategy,
    /// Record field holding the remote tracker's issue id
    pub external_id_field: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            strategy: ConflictStrategy::LatestWins,
            external_id_field: crate::jira::JIRA_EXTERNAL_ID_FIELD.to_string(),
        }
    }
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            port: 16100,
            bind_address: "localhost".to_string(),
            statuses: vec!["open".into(), "in_progress".into(), "done".into()],
            readonly_fields: Vec::new(),
            date_fields: vec!["createdAt".into(), "updatedAt".into()],
            task_defaults: default_task_template(),
            import: ImportConfig::default(),
        }
    }
}

impl RepoConfig {
    pub fn is_known_status(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }
}

/// The record every new task starts from
pub fn default_task_template() -> Record {
    let mut template = Record::new();
    template.insert("status", "open");
    template.insert("pending", 1);
    template.insert("estimation", 1);
    template.insert("title", "New task");
    template.insert("description", "");
    template.insert("tags", "");
    template.insert("assignedTo", "");
    template.insert("priority", 5);
    template.insert("actualTime", json!(0));
    template
}

/// `<workdir>/.tasks`
pub fn tasks_dir(workdir: &Path) -> PathBuf {
    workdir.join(TASKS_DIR)
}

/// `<workdir>/.tasks/data`
pub fn data_dir(workdir: &Path) -> PathBuf {
    tasks_dir(workdir).join(DATA_DIR)
}

/// `<workdir>/.tasks/config.toml`
pub fn config_path(workdir: &Path) -> PathBuf {
    tasks_dir(workdir).join(CONFIG_FILE)
}

/// Load repo config from .tasks/config.toml
pub fn load_repo_config(workdir: &Path) -> Result<Option<RepoConfig>, TaskError> {
    let config_path = config_path(workdir);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&config_path)?;
    let config: RepoConfig = toml::from_str(&content)?;
    Ok(Some(config))
}

/// Load repo config, falling back to the defaults when there is none
pub fn load_or_default(workdir: &Path) -> Result<RepoConfig, TaskError> {
    Ok(load_repo_config(workdir)?.unwrap_or_default())
}

/// Save repo config to .tasks/config.toml
pub fn save_repo_config(workdir: &Path, config: &RepoConfig) -> Result<(), TaskError> {
    std::fs::create_dir_all(tasks_dir(workdir))?;
    let content = toml::to_string_pretty(config)?;
    std::fs::write(config_path(workdir), content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_repo_config_roundtrip() {
        let dir = tempdir().unwrap();
        let workdir = dir.path();

        let mut config = RepoConfig::default();
        config.port = 16200;
        config.statuses.push("blocked".to_string());
        config.import.strategy = ConflictStrategy::RemoteWins;
        config.task_defaults.insert("priority", 3);

        save_repo_config(workdir, &config).unwrap();
        let loaded = load_repo_config(workdir).unwrap().unwrap();

        assert_eq!(loaded, config);
        assert!(loaded.is_known_status("blocked"));
    }

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempdir().unwrap();
        assert!(load_repo_config(dir.path()).unwrap().is_none());
        assert_eq!(load_or_default(dir.path()).unwrap(), RepoConfig::default());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(tasks_dir(dir.path())).unwrap();
        std::fs::write(
            config_path(dir.path()),
            "port = 9000\n\n[import]\nstrategy = \"local-wins\"\n",
        )
        .unwrap();

        let config = load_or_default(dir.path()).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.bind_address, "localhost");
        assert_eq!(config.import.strategy, ConflictStrategy::LocalWins);
        assert_eq!(config.import.external_id_field, "jira_id");
        assert_eq!(config.task_defaults.status(), Some("open"));
    }

    #[test]
    fn test_invalid_config_is_parse_error() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(tasks_dir(dir.path())).unwrap();
        std::fs::write(config_path(dir.path()), "port = \"high\"").unwrap();
        assert!(matches!(
            load_repo_config(dir.path()),
            Err(TaskError::TomlParse(_))
        ));
    }

    #[test]
    fn test_layout_paths() {
        let root = Path::new("/repo");
        assert_eq!(data_dir(root), Path::new("/repo/.tasks/data"));
        assert_eq!(config_path(root), Path::new("/repo/.tasks/config.toml"));
    }
}
