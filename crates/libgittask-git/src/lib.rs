//! Git integration for gittask
//!
//! This crate backs the task store with a git working tree:
//! - staging, unstaging and reverting single task files
//! - porcelain-style status lines for the sync-state resolver
//! - committing and tagging only the tasks directory

mod error;
mod repo;
mod vcs;

pub use error::GitError;
pub use repo::GitRepo;
