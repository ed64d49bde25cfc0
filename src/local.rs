use crate::error::{serde_error, storage_error, OnboardingResult};
use crate::store::LocalStore;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Process-local store backed by a concurrent hash map. Nothing survives a
/// restart; used by tests and as the default backend.
#[derive(Default)]
pub struct InMemoryLocalStore {
    entries: DashMap<String, String>,
}

impl InMemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocalStore for InMemoryLocalStore {
    fn get(&self, key: &str) -> OnboardingResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> OnboardingResult<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> OnboardingResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }
}

/// Store persisted as a single JSON object on disk.
///
/// The whole document is cached in memory and rewritten on every mutation
/// through a sibling temp file plus rename, so a crash mid-write leaves the
/// previous contents intact.
pub struct FileLocalStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileLocalStore {
    /// Opens (or lazily creates) the store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> OnboardingResult<Self> {
        let path = path.into();
        let entries = Self::load(&path)?;
        debug!(path = %path.display(), keys = entries.len(), "opened file local store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> OnboardingResult<BTreeMap<String, String>> {
        match fs::read_to_string(path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(serde_error),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(storage_error(err)),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> OnboardingResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(storage_error)?;
            }
        }
        let payload = serde_json::to_string_pretty(entries).map_err(serde_error)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, payload).map_err(storage_error)?;
        fs::rename(&tmp, &self.path).map_err(storage_error)
    }
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> OnboardingResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> OnboardingResult<()> {
        let mut entries = self.entries.lock();
        let previous = entries.insert(key.to_owned(), value.to_owned());
        if let Err(err) = self.persist(&entries) {
            match previous {
                Some(old) => entries.insert(key.to_owned(), old),
                None => entries.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> OnboardingResult<bool> {
        let mut entries = self.entries.lock();
        let Some(previous) = entries.remove(key) else {
            return Ok(false);
        };
        if let Err(err) = self.persist(&entries) {
            entries.insert(key.to_owned(), previous);
            return Err(err);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inmemory_set_get_delete() {
        let store = InMemoryLocalStore::new();
        assert!(store.get("k").expect("get").is_none());
        store.set("k", "v1").expect("set");
        store.set("k", "v2").expect("overwrite");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v2"));
        assert!(store.delete("k").expect("delete"));
        assert!(!store.delete("k").expect("delete again"));
        assert!(store.is_empty());
    }
}
