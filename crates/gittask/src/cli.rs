use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gittask", about = "Git-backed task tracking", version)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress human-readable output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Log filter when GITTASK_LOG and RUST_LOG are unset (e.g. "debug")
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Repository to operate on (default: the one containing the cwd)
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create .tasks/data and a default .tasks/config.toml
    Init,

    /// Add a new task
    Add {
        /// Task title
        #[arg(required = true)]
        title: Vec<String>,

        /// Extra property as key:value (repeatable)
        #[arg(short = 'p', long = "property")]
        property: Vec<String>,
    },

    /// List all tasks with their git state
    List,

    /// Show one task
    Show {
        /// Task ID
        id: String,
    },

    /// Save a task from JSON (stdin by default)
    Save {
        /// Read the task from this file instead of stdin
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete a task and remove it from the index
    Delete {
        /// Task ID
        id: String,
    },

    /// Commit only the content of the .tasks directory
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Order the fields of every task file
    Sort {
        /// Commit the result and tag it
        #[arg(long)]
        commit: bool,
    },

    /// Import tasks from an external tracker
    Import {
        #[command(subcommand)]
        cmd: ImportCommand,
    },
}

#[derive(Clone, Subcommand)]
pub enum ImportCommand {
    /// Import JIRA issues exported as JSON
    Jira {
        /// Array of issues, or a search response with an "issues" array
        #[arg(long)]
        file: PathBuf,

        /// Conflict strategy: latest-wins, local-wins, remote-wins, manual
        #[arg(long)]
        strategy: Option<String>,

        /// Record field holding the JIRA issue id
        #[arg(long)]
        key: Option<String>,

        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,
    },
}
