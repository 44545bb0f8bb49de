//! Merge of imported (remote) task records into local ones.
//!
//! Records are paired by an external identifier. Each pair is resolved by
//! a [`ConflictStrategy`]; every strategy keeps the local record's `id`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::TaskError;
use crate::types::record::{value_kind, FIELD_ID};
use crate::types::Record;

/// Named conflict resolution strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStrategy {
    #[default]
    LatestWins,
    LocalWins,
    RemoteWins,
    /// No interactive resolution; behaves as `RemoteWins`
    Manual,
}

type ResolveFn = fn(&Record, &Record) -> Record;

/// Indexed by `ConflictStrategy as usize`
const STRATEGY_TABLE: [(ConflictStrategy, &str, ResolveFn); 4] = [
    (ConflictStrategy::LatestWins, "latest-wins", resolve_latest_wins),
    (ConflictStrategy::LocalWins, "local-wins", resolve_local_wins),
    (ConflictStrategy::RemoteWins, "remote-wins", resolve_remote_wins),
    (ConflictStrategy::Manual, "manual", resolve_remote_wins),
];

impl ConflictStrategy {
    pub const ALL: [ConflictStrategy; 4] = [
        ConflictStrategy::LatestWins,
        ConflictStrategy::LocalWins,
        ConflictStrategy::RemoteWins,
        ConflictStrategy::Manual,
    ];

    pub fn as_str(self) -> &'static str {
        STRATEGY_TABLE[self as usize].1
    }

    /// Resolve one matched pair into the merged record
    pub fn resolve(self, local: &Record, remote: &Record) -> Record {
        (STRATEGY_TABLE[self as usize].2)(local, remote)
    }
}

impl fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConflictStrategy {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STRATEGY_TABLE
            .iter()
            .find(|(_, name, _)| *name == s)
            .map(|(strategy, _, _)| *strategy)
            .ok_or_else(|| {
                let names: Vec<&str> = STRATEGY_TABLE.iter().map(|(_, n, _)| *n).collect();
                TaskError::InvalidArgs(format!(
                    "unknown conflict strategy '{}' (expected one of: {})",
                    s,
                    names.join(", ")
                ))
            })
    }
}

fn resolve_remote_wins(local: &Record, remote: &Record) -> Record {
    merge_tasks(remote, local, true)
}

fn resolve_local_wins(local: &Record, remote: &Record) -> Record {
    merge_tasks(remote, local, false)
}

fn resolve_latest_wins(local: &Record, remote: &Record) -> Record {
    let remote_is_newer = match (remote.updated_at(), local.updated_at()) {
        (Some(remote_ts), Some(local_ts)) => remote_ts > local_ts,
        _ => false,
    };
    merge_tasks(remote, local, remote_is_newer)
}

/// Copy every field of `first`, then overlay every field of `second`
pub fn merge_fields(first: &Record, second: &Record) -> Record {
    let mut merged = first.clone();
    for (key, value) in second {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Merge a mapped remote task with its local counterpart. With
/// `prefer_remote` the remote fields win on overlap, otherwise the local
/// ones do. The result always carries the local `id`.
pub fn merge_tasks(remote: &Record, local: &Record, prefer_remote: bool) -> Record {
    let mut merged = if prefer_remote {
        merge_fields(local, remote)
    } else {
        merge_fields(remote, local)
    };
    match local.get(FIELD_ID) {
        Some(id) => {
            merged.insert(FIELD_ID, id.clone());
        }
        None => {
            merged.remove(FIELD_ID);
        }
    }
    merged
}

/// Merge local and remote record sets.
///
/// Local records without an external id are passed through first, in
/// order. Then, for each remote record in order, either the remote record
/// itself (no local counterpart) or the strategy's merge is appended.
/// Indexed local records that no remote record matches are not part of
/// the result. If two local records share an external id the later one
/// is used. Any extractor failure aborts the whole merge.
pub fn merge_all<F>(
    local: &[Record],
    remote: &[Record],
    external_id_of: F,
    strategy: ConflictStrategy,
) -> Result<Vec<Record>, TaskError>
where
    F: Fn(&Record) -> Result<Option<String>, String>,
{
    let mut result = Vec::with_capacity(local.len() + remote.len());
    let mut index: HashMap<String, &Record> = HashMap::new();

    for (position, record) in local.iter().enumerate() {
        let external_id = external_id_of(record).map_err(|message| TaskError::MergeIdentity {
            side: "local",
            position,
            message,
        })?;
        match external_id {
            Some(id) => {
                index.insert(id, record);
            }
            None => result.push(record.clone()),
        }
    }

    let mut matched = 0usize;
    for (position, record) in remote.iter().enumerate() {
        let external_id = external_id_of(record).map_err(|message| TaskError::MergeIdentity {
            side: "remote",
            position,
            message,
        })?;
        let counterpart = external_id.as_ref().and_then(|id| index.get(id));
        match counterpart {
            Some(local_record) => {
                matched += 1;
                result.push(strategy.resolve(local_record, record));
            }
            None => result.push(record.clone()),
        }
    }

    debug!(
        local = local.len(),
        remote = remote.len(),
        matched,
        strategy = %strategy,
        "merged task sets"
    );
    Ok(result)
}

/// External id extractor reading one field. Strings and numbers are ids;
/// a missing or null field means "no external id".
pub fn field_extractor(field: &str) -> impl Fn(&Record) -> Result<Option<String>, String> + '_ {
    move |record: &Record| match record.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(format!(
            "field '{}' is {}, expected a string or number",
            field,
            value_kind(other)
        )),
    }
}
