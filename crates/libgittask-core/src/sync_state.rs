//! Sync-state resolution: which git action follows a task write, and
//! what state the task file is in afterwards.

use std::path::Path;

use tracing::debug;

use crate::error::TaskError;
use crate::store::TaskStore;
use crate::types::{is_well_formed_id, Record, SyncState, TrackedRecord};

/// Version-control operations on single task files
pub trait Vcs {
    /// Add the file's current content to the index
    fn stage(&self, path: &Path) -> Result<(), TaskError>;
    /// Remove the file's staged changes from the index
    fn unstage(&self, path: &Path) -> Result<(), TaskError>;
    /// Restore the file's working-tree content from the index
    fn revert(&self, path: &Path) -> Result<(), TaskError>;
    /// Porcelain status lines (`XY path`) for the path
    fn status(&self, path: &Path) -> Result<Vec<String>, TaskError>;
}

/// State of the task `record_id` according to `status_lines`.
///
/// The last line ending in `/<id>` wins. Ill-formed ids and ids with no
/// matching line are clean.
pub fn resolve_state<S: AsRef<str>>(record_id: Option<&str>, status_lines: &[S]) -> SyncState {
    let id = match record_id {
        Some(id) if is_well_formed_id(id) => id,
        _ => return SyncState::CLEAN,
    };
    let suffix = format!("/{}", id);
    status_lines
        .iter()
        .map(|line| line.as_ref())
        .filter(|line| line.ends_with(&suffix))
        .filter_map(SyncState::from_status_line)
        .last()
        .unwrap_or(SyncState::CLEAN)
}

/// Follow-up action after a task file is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistPolicy {
    /// Add the file to the index
    Stage,
    /// Leave the file's changes out of the index
    KeepUntracked,
    /// Unstage, then restore the indexed content
    Discard,
}

impl PersistPolicy {
    pub fn for_state(requested: SyncState) -> Self {
        match requested {
            SyncState::UNTRACKED => PersistPolicy::KeepUntracked,
            SyncState::DISCARD => PersistPolicy::Discard,
            _ => PersistPolicy::Stage,
        }
    }
}

/// Write `record` and bring its file into the `requested` state.
///
/// The returned record carries the state git reports afterwards. On
/// discard it is the reverted on-disk content, not `record`.
pub fn apply_persistence_policy<V: Vcs + ?Sized>(
    store: &TaskStore,
    mut record: Record,
    requested: SyncState,
    vcs: &V,
) -> Result<TrackedRecord, TaskError> {
    let path = store.write(&mut record)?;
    let policy = PersistPolicy::for_state(requested);
    debug!(path = %path.display(), requested = %requested, ?policy, "applying persistence policy");

    match policy {
        PersistPolicy::Stage => vcs.stage(&path)?,
        PersistPolicy::KeepUntracked => vcs.unstage(&path)?,
        PersistPolicy::Discard => {
            vcs.unstage(&path)?;
            vcs.revert(&path)?;
            record = store.read_path(&path)?;
        }
    }

    let lines = vcs.status(&path)?;
    let state = resolve_state(record.id(), lines.as_slice());
    Ok(TrackedRecord::new(record, state))
}
