use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new task ID: lowercase hex SHA-256 of (time, pid, counter)
pub fn generate_task_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let mut hasher = Sha256::new();
    hasher.update(nanos.to_le_bytes());
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(ID_COUNTER.fetch_add(1, Ordering::Relaxed).to_le_bytes());
    hex::encode(hasher.finalize())
}

/// A task ID doubles as a file name in the data directory, so it must
/// not be empty, contain separators, or name a directory entry.
pub fn is_well_formed_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
        && !id.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_task_id_is_unique() {
        let id1 = generate_task_id();
        let id2 = generate_task_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generate_task_id_is_hex_sha256() {
        let id = generate_task_id();
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(is_well_formed_id(&id));
    }

    #[test]
    fn test_well_formed_ids() {
        assert!(is_well_formed_id("0ae54bd852ad6a68"));
        assert!(is_well_formed_id("task-1"));
        assert!(!is_well_formed_id(""));
        assert!(!is_well_formed_id("."));
        assert!(!is_well_formed_id(".."));
        assert!(!is_well_formed_id("a/b"));
        assert!(!is_well_formed_id("a\\b"));
        assert!(!is_well_formed_id("a\nb"));
    }
}
