//! Task-level operations: create, save, list and import, built on the
//! store, the merge engine and the sync-state resolver.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::TaskError;
use crate::merge::{field_extractor, merge_all, ConflictStrategy};
use crate::store::{SkippedFile, TaskStore};
use crate::sync_state::{apply_persistence_policy, resolve_state, Vcs};
use crate::types::record::{FIELD_CREATED_AT, FIELD_ID, FIELD_UPDATED_AT};
use crate::types::{generate_task_id, Record, SyncState, TrackedRecord};

/// Current time in epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A new task: the template, a fresh id, the title, then `properties`
pub fn new_task<I>(template: &Record, title: &str, properties: I) -> Record
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut task = template.clone();
    task.insert(FIELD_ID, generate_task_id());
    task.insert("title", title);
    for (key, value) in properties {
        task.insert(key, value);
    }
    task
}

/// Save a task the way the dashboard does.
///
/// A blank id gets a fresh one, `createdAt` is set once, `updatedAt` is
/// bumped to now. The requested state selects the git follow-up.
pub fn save_task<V: Vcs + ?Sized>(
    store: &TaskStore,
    vcs: &V,
    request: TrackedRecord,
) -> Result<TrackedRecord, TaskError> {
    let TrackedRecord { mut record, state } = request;
    if record.is_blank(FIELD_ID) {
        record.insert(FIELD_ID, generate_task_id());
    } else if record.id().is_none() {
        return Err(TaskError::InvalidArgs("task id must be a string".to_string()));
    }
    let now = now_ms();
    if record.created_at().is_none() {
        record.insert(FIELD_CREATED_AT, now);
    }
    record.insert(FIELD_UPDATED_AT, now);
    apply_persistence_policy(store, record, state, vcs)
}

/// Every task with its sync state
#[derive(Debug, Default, Serialize)]
pub struct TaskListing {
    pub tasks: Vec<TrackedRecord>,
    #[serde(skip)]
    pub skipped: Vec<SkippedFile>,
}

/// Load all tasks and resolve their states from one status query
pub fn read_tasks<V: Vcs + ?Sized>(store: &TaskStore, vcs: &V) -> Result<TaskListing, TaskError> {
    let report = store.load_all()?;
    let lines = if store.data_dir().is_dir() {
        vcs.status(store.data_dir())?
    } else {
        Vec::new()
    };
    let tasks = report
        .records
        .into_iter()
        .map(|record| {
            let state = resolve_state(record.id(), lines.as_slice());
            TrackedRecord::new(record, state)
        })
        .collect();
    Ok(TaskListing {
        tasks,
        skipped: report.skipped,
    })
}

/// What an import would write
#[derive(Debug, Default, Serialize)]
pub struct ImportPlan {
    /// Records that differ from their stored version
    pub records: Vec<Record>,
    /// Remote records with no local counterpart
    pub adopted: usize,
    /// Local records updated from a remote one
    pub merged: usize,
    /// Records identical to what is already stored
    pub unchanged: usize,
}

/// Merge `mapped` remote records into the stored tasks, without writing
pub fn plan_import(
    store: &TaskStore,
    mapped: Vec<Record>,
    external_id_field: &str,
    strategy: ConflictStrategy,
) -> Result<ImportPlan, TaskError> {
    let local = store.load_all()?.records;
    let merged = merge_all(&local, &mapped, field_extractor(external_id_field), strategy)?;

    let by_id: HashMap<&str, &Record> = local
        .iter()
        .filter_map(|record| record.id().map(|id| (id, record)))
        .collect();

    let mut plan = ImportPlan::default();
    for mut record in merged {
        store.clamp_updated_at(&mut record);
        match record.id().and_then(|id| by_id.get(id)) {
            Some(stored) if **stored == record => plan.unchanged += 1,
            Some(_) => {
                plan.merged += 1;
                plan.records.push(record);
            }
            None => {
                plan.adopted += 1;
                plan.records.push(record);
            }
        }
    }
    Ok(plan)
}

/// A record the import could not save
#[derive(Debug, Serialize)]
pub struct ImportFailure {
    pub id: Option<String>,
    pub error: String,
}

/// Outcome of an import
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub saved: Vec<TrackedRecord>,
    pub failed: Vec<ImportFailure>,
    pub adopted: usize,
    pub merged: usize,
    pub unchanged: usize,
}

/// Write and stage every planned record. Failures are collected per
/// record and do not stop the import.
pub fn apply_import<V: Vcs + ?Sized>(store: &TaskStore, vcs: &V, plan: ImportPlan) -> ImportReport {
    let mut report = ImportReport {
        adopted: plan.adopted,
        merged: plan.merged,
        unchanged: plan.unchanged,
        ..ImportReport::default()
    };
    for record in plan.records {
        let id = record.id().map(str::to_string);
        match apply_persistence_policy(store, record, SyncState::STAGED_ADDED, vcs) {
            Ok(tracked) => report.saved.push(tracked),
            Err(e) => {
                warn!(id = id.as_deref().unwrap_or("<none>"), error = %e, "failed to save imported task");
                report.failed.push(ImportFailure {
                    id,
                    error: e.to_string(),
                });
            }
        }
    }
    info!(
        saved = report.saved.len(),
        failed = report.failed.len(),
        unchanged = report.unchanged,
        "import finished"
    );
    report
}

/// Plan and apply an import in one step
pub fn import_records<V: Vcs + ?Sized>(
    store: &TaskStore,
    vcs: &V,
    mapped: Vec<Record>,
    external_id_field: &str,
    strategy: ConflictStrategy,
) -> Result<ImportReport, TaskError> {
    let plan = plan_import(store, mapped, external_id_field, strategy)?;
    Ok(apply_import(store, vcs, plan))
}
