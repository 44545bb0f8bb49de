use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::record::{Record, FIELD_GIT_STATUS};
use crate::error::TaskError;

/// Two-character sync state of a task file, as reported by `git status
/// --porcelain` (`XY`), plus the internal `--` discard sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncState([u8; 2]);

impl SyncState {
    pub const CLEAN: SyncState = SyncState(*b"  ");
    pub const STAGED_ADDED: SyncState = SyncState(*b"A ");
    pub const STAGED_MODIFIED: SyncState = SyncState(*b"M ");
    pub const UNSTAGED_MODIFIED: SyncState = SyncState(*b" M");
    pub const UNTRACKED: SyncState = SyncState(*b"??");
    /// Not a git code: a request to revert local changes
    pub const DISCARD: SyncState = SyncState(*b"--");

    /// Parse a code; exactly two printable ASCII characters (space allowed)
    pub fn parse(code: &str) -> Result<Self, TaskError> {
        let bytes = code.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(|b| *b == b' ' || b.is_ascii_graphic()) {
            return Err(TaskError::InvalidState(format!("{:?}", code)));
        }
        Ok(SyncState([bytes[0], bytes[1]]))
    }

    /// The state carried by the first two characters of a status line
    pub fn from_status_line(line: &str) -> Option<Self> {
        line.get(..2).and_then(|code| Self::parse(code).ok())
    }

    pub fn as_str(&self) -> &str {
        // Always ASCII, enforced by `parse` and the constants
        std::str::from_utf8(&self.0).unwrap_or("  ")
    }

    pub fn is_clean(&self) -> bool {
        *self == Self::CLEAN
    }

    pub fn describe(&self) -> &'static str {
        match *self {
            Self::CLEAN => "clean",
            Self::STAGED_ADDED => "staged-added",
            Self::STAGED_MODIFIED => "staged-modified",
            Self::UNSTAGED_MODIFIED => "unstaged-modified",
            Self::UNTRACKED => "untracked",
            Self::DISCARD => "discard-requested",
            _ => "other",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncState {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for SyncState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SyncState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Self::parse(&code).map_err(serde::de::Error::custom)
    }
}

/// A record together with its sync state. The state serializes next to
/// the record's fields as `gitStatus` but is never written to disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedRecord {
    #[serde(flatten)]
    pub record: Record,
    #[serde(rename = "gitStatus")]
    pub state: SyncState,
}

impl TrackedRecord {
    /// Any `gitStatus` field inside `record` gives way to `state`
    pub fn new(mut record: Record, state: SyncState) -> Self {
        record.remove(FIELD_GIT_STATUS);
        Self { record, state }
    }

    /// Split a request body into the record and its requested state.
    /// A missing or null `gitStatus` requests staging.
    pub fn from_request(mut record: Record) -> Result<Self, TaskError> {
        let state = match record.remove(FIELD_GIT_STATUS) {
            None | Some(serde_json::Value::Null) => SyncState::STAGED_ADDED,
            Some(serde_json::Value::String(code)) => SyncState::parse(&code)?,
            Some(other) => return Err(TaskError::InvalidState(other.to_string())),
        };
        Ok(Self { record, state })
    }
}
