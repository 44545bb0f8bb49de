//! File-backed task store: one pretty-printed JSON document per task in
//! the data directory, named by the task ID.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::TaskError;
use crate::order::order_fields;
use crate::types::record::{FIELD_GIT_STATUS, FIELD_UPDATED_AT};
use crate::types::{is_well_formed_id, Record};

/// A data-directory entry that could not be loaded as a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

/// Result of loading every record in the data directory
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Records in file-name order
    pub records: Vec<Record>,
    pub skipped: Vec<SkippedFile>,
}

/// Result of rewriting every record with ordered fields
#[derive(Debug, Default)]
pub struct SortReport {
    pub sorted: Vec<PathBuf>,
    pub skipped: Vec<SkippedFile>,
}

/// Task records stored under one data directory
#[derive(Debug, Clone)]
pub struct TaskStore {
    data_dir: PathBuf,
}

impl TaskStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn ensure_data_dir(&self) -> Result<(), TaskError> {
        fs::create_dir_all(&self.data_dir).map_err(|source| TaskError::Persistence {
            path: self.data_dir.clone(),
            source,
        })
    }

    /// File path of the record with `id`
    pub fn record_path(&self, id: &str) -> Result<PathBuf, TaskError> {
        if !is_well_formed_id(id) {
            return Err(TaskError::InvalidArgs(format!(
                "{:?} is not a valid task id",
                id
            )));
        }
        Ok(self.data_dir.join(id))
    }

    pub fn exists(&self, id: &str) -> bool {
        self.record_path(id).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Write a record to its file.
    ///
    /// `updatedAt` never goes backwards: if the stored version is newer,
    /// its timestamp is carried into `record` before writing.
    pub fn write(&self, record: &mut Record) -> Result<PathBuf, TaskError> {
        let id = record
            .id()
            .ok_or_else(|| TaskError::InvalidArgs("task has no string id".to_string()))?
            .to_string();
        let path = self.record_path(&id)?;
        record.remove(FIELD_GIT_STATUS);
        self.clamp_updated_at(record);

        self.ensure_data_dir()?;
        write_record_file(&path, record)?;
        debug!(id = %id, path = %path.display(), "wrote task file");
        Ok(path)
    }

    /// Raise `record`'s `updatedAt` to the stored version's if that one is
    /// newer. Records without a string id are left alone.
    pub fn clamp_updated_at(&self, record: &mut Record) {
        let Some(stored) = record.id().and_then(|id| self.stored_updated_at(id)) else {
            return;
        };
        if record.updated_at().map_or(true, |ts| ts < stored) {
            record.insert(FIELD_UPDATED_AT, stored);
        }
    }

    /// Read the record with `id`
    pub fn read(&self, id: &str) -> Result<Record, TaskError> {
        let path = self.record_path(id)?;
        if !path.is_file() {
            return Err(TaskError::task_not_found(id));
        }
        self.read_path(&path)
    }

    /// Read and parse one record file. A `gitStatus` left in the file by
    /// older writers is dropped.
    pub fn read_path(&self, path: &Path) -> Result<Record, TaskError> {
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let mut record = Record::from_value(value)?;
        record.remove(FIELD_GIT_STATUS);
        Ok(record)
    }

    /// `updatedAt` of the version on disk, if there is a readable one
    pub fn stored_updated_at(&self, id: &str) -> Option<i64> {
        let path = self.record_path(id).ok()?;
        if !path.is_file() {
            return None;
        }
        self.read_path(&path).ok()?.updated_at()
    }

    /// Load every record. Unreadable or malformed files are skipped and
    /// reported; a missing data directory yields an empty report.
    pub fn load_all(&self) -> Result<LoadReport, TaskError> {
        let mut report = LoadReport::default();
        for (file_name, path) in self.record_files()? {
            match self.read_path(&path) {
                Ok(record) => report.records.push(record),
                Err(e) => {
                    warn!(file = %file_name, error = %e, "skipping unreadable task file");
                    report.skipped.push(SkippedFile {
                        file_name,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Rewrite every record with its fields in lexicographic order
    pub fn sort_fields_in_dir(&self) -> Result<SortReport, TaskError> {
        let mut report = SortReport::default();
        for (file_name, path) in self.record_files()? {
            let record = match self.read_path(&path) {
                Ok(record) => record,
                Err(e) => {
                    warn!(file = %file_name, error = %e, "not sorting unreadable task file");
                    report.skipped.push(SkippedFile {
                        file_name,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            if let Err(e) = write_record_file(&path, &order_fields(&record)) {
                warn!(file = %file_name, error = %e, "failed to rewrite task file");
                report.skipped.push(SkippedFile {
                    file_name,
                    reason: e.to_string(),
                });
                continue;
            }
            report.sorted.push(path);
        }
        debug!(sorted = report.sorted.len(), "sorted task fields");
        Ok(report)
    }

    /// Non-hidden regular files in the data directory, by file name
    fn record_files(&self) -> Result<Vec<(String, PathBuf)>, TaskError> {
        if !self.data_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.starts_with('.') {
                continue;
            }
            files.push((file_name, entry.path()));
        }
        files.sort();
        Ok(files)
    }
}

fn write_record_file(path: &Path, record: &Record) -> Result<(), TaskError> {
    let mut content = serde_json::to_string_pretty(record)?;
    content.push('\n');
    fs::write(path, content).map_err(|source| TaskError::Persistence {
        path: path.to_path_buf(),
        source,
    })
}
