use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Keys making up one persisted snapshot. `clear` removes all of them.
pub const KEY_COUNT: &str = "count";
pub const KEY_START: &str = "start";
pub const KEY_END: &str = "end";
pub const KEY_DURATION: &str = "duration";

/// Durable key/value gateway. Writes are best effort: callers fire and
/// forget, implementations absorb any I/O trouble and stay coherent in
/// memory. Readers treat anything unparseable as absent.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    /// Removes every key in one logical operation.
    fn clear(&mut self);
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: HashMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// File-backed store holding the snapshot as a single JSON object.
/// The whole map is rewritten on every `set`; last write wins.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileKvStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "tally") {
            pd.data_local_dir().join("state.json")
        } else {
            PathBuf::from("tally_state.json")
        };
        Self::with_path(path)
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        let path = p.as_ref().to_path_buf();
        let entries = Self::read_entries(&path);
        Self { path, entries }
    }

    fn read_entries(path: &Path) -> HashMap<String, String> {
        if let Ok(bytes) = fs::read(path) {
            if let Ok(map) = serde_json::from_slice::<HashMap<String, String>>(&bytes) {
                return map;
            }
        }
        HashMap::new()
    }

    fn write_entries(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&self.entries).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        // The in-memory map stays authoritative if the disk write fails
        let _ = self.write_entries();
    }

    fn clear(&mut self) {
        self.entries.clear();
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryKvStore::new();
        assert_eq!(store.get(KEY_COUNT), None);

        store.set(KEY_COUNT, "10");
        assert_eq!(store.get(KEY_COUNT), Some("10".to_string()));

        store.set(KEY_COUNT, "-3");
        assert_eq!(store.get(KEY_COUNT), Some("-3".to_string()));
    }

    #[test]
    fn memory_store_clear_removes_everything() {
        let mut store = MemoryKvStore::new();
        store.set(KEY_COUNT, "5");
        store.set(KEY_START, "2024-01-01T00:00:00+00:00");

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.get(KEY_COUNT), None);
        assert_eq!(store.get(KEY_START), None);
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = FileKvStore::with_path(&path);
        store.set(KEY_COUNT, "42");
        store.set(KEY_DURATION, r#"{"seconds":5,"string":"00:00:05"}"#);

        // A fresh store over the same path sees the same entries
        let reopened = FileKvStore::with_path(&path);
        assert_eq!(reopened.get(KEY_COUNT), Some("42".to_string()));
        assert_eq!(
            reopened.get(KEY_DURATION),
            Some(r#"{"seconds":5,"string":"00:00:05"}"#.to_string())
        );
    }

    #[test]
    fn file_store_clear_removes_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = FileKvStore::with_path(&path);
        store.set(KEY_COUNT, "1");
        assert!(path.exists());

        store.clear();
        assert!(!path.exists());
        assert_eq!(store.get(KEY_COUNT), None);

        // Clearing an already-missing file is a no-op
        store.clear();
    }

    #[test]
    fn file_store_stays_coherent_when_the_disk_write_fails() {
        let dir = tempdir().unwrap();
        // A regular file where a parent directory is expected makes every
        // write fail
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let path = blocker.join("state.json");

        let mut store = FileKvStore::with_path(&path);
        store.set(KEY_COUNT, "7");

        assert_eq!(store.get(KEY_COUNT), Some("7".to_string()));
        store.clear();
        assert_eq!(store.get(KEY_COUNT), None);
    }

    #[test]
    fn file_store_corrupt_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, b"not json at all").unwrap();

        let store = FileKvStore::with_path(&path);
        assert_eq!(store.get(KEY_COUNT), None);
    }

    #[test]
    fn file_store_missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileKvStore::with_path(dir.path().join("nope.json"));
        assert_eq!(store.get(KEY_COUNT), None);
    }
}
