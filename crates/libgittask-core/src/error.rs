use std::path::PathBuf;
use thiserror::Error;

/// Main error type for gittask operations
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("mapping failed at '{path}': {message}")]
    Mapping { path: String, message: String },

    #[error("merge aborted, cannot extract external id of {side} record #{position}: {message}")]
    MergeIdentity {
        side: &'static str,
        position: usize,
        message: String,
    },

    #[error("failed to persist '{}': {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("git {op} failed for '{path}': {message}")]
    Vcs {
        op: &'static str,
        path: String,
        message: String,
    },

    #[error("invalid sync state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl TaskError {
    /// Get the error code for JSON output
    pub fn error_code(&self) -> &'static str {
        match self {
            TaskError::InvalidArgs(_) => "invalid_args",
            TaskError::NotFound(_) => "not_found",
            TaskError::Mapping { .. } => "mapping_error",
            TaskError::MergeIdentity { .. } => "merge_identity_error",
            TaskError::Persistence { .. } => "persistence_error",
            TaskError::Vcs { .. } => "vcs_error",
            TaskError::InvalidState(_) => "invalid_args",
            TaskError::Io(_) => "io_error",
            TaskError::Json(_) => "invalid_json",
            TaskError::TomlParse(_) => "invalid_config",
            TaskError::TomlSerialize(_) => "internal_error",
            TaskError::Internal(_) => "internal_error",
        }
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            TaskError::InvalidArgs(_) => 2,
            TaskError::InvalidState(_) => 2,
            TaskError::Json(_) => 2,
            TaskError::NotFound(_) => 3,
            TaskError::Mapping { .. } => 4,
            TaskError::MergeIdentity { .. } => 4,
            TaskError::Persistence { .. } => 5,
            TaskError::Io(_) => 5,
            TaskError::Vcs { .. } => 6,
            _ => 1,
        }
    }

    /// Get actionable suggestions for fixing the error
    pub fn suggestions(&self) -> Vec<&'static str> {
        match self {
            TaskError::NotFound(msg) => {
                if msg.contains("task") || msg.starts_with("Task") {
                    vec!["Run 'gittask list' to see available tasks"]
                } else if msg.contains("repository") {
                    vec!["Run gittask inside a git working tree, or pass --repo <path>"]
                } else {
                    vec![]
                }
            }
            TaskError::Persistence { .. } => vec![
                "Run 'gittask init' to create the data directory",
                "Check permissions on .tasks/data",
            ],
            TaskError::Vcs { .. } => vec![
                "The task file may have been written without being staged",
                "Run 'git status .tasks' to inspect the working tree",
            ],
            TaskError::InvalidState(_) => vec![
                "gitStatus must be a two-character code such as 'A ', '??' or '--'",
            ],
            TaskError::TomlParse(_) => vec!["Check the syntax of .tasks/config.toml"],
            _ => vec![],
        }
    }

    /// Create a NotFound error for a task with helpful context
    pub fn task_not_found(task_id: &str) -> Self {
        let short: String = task_id.chars().take(16).collect();
        TaskError::NotFound(format!("Task '{}' not found", short))
    }

    /// Shorthand for a failed git operation on a path
    pub fn vcs(op: &'static str, path: impl Into<String>, message: impl ToString) -> Self {
        TaskError::Vcs {
            op,
            path: path.into(),
            message: message.to_string(),
        }
    }
}
