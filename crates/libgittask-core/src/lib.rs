pub mod types;
pub mod mapper;
pub mod merge;
pub mod order;
pub mod sync_state;
pub mod store;
pub mod config;
pub mod jira;
pub mod tasks;
pub mod error;

pub use error::TaskError;
pub use types::{generate_task_id, is_well_formed_id, Record, SyncState, TrackedRecord};
pub use mapper::{map_document, FieldMapper, FieldPath, PathPattern, RuleTable};
pub use merge::{field_extractor, merge_all, merge_fields, merge_tasks, ConflictStrategy};
pub use order::order_fields;
pub use sync_state::{apply_persistence_policy, resolve_state, PersistPolicy, Vcs};
pub use store::{LoadReport, SkippedFile, SortReport, TaskStore};
pub use config::{load_or_default, load_repo_config, save_repo_config, RepoConfig};
