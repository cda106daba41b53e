use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

/// Namespaced key-value storage: one record per key, read and written whole.
pub trait StorageManager: Send + Sync {
    /// Returns `None` when nothing was ever written under `key`.
    fn get(&self, key: &str) -> std::io::Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, data: &[u8]) -> std::io::Result<()>;
    fn dir(&self) -> &Path;
}

/// Stores every key as a file inside `base_dir`.
#[derive(Clone, Debug)]
pub struct BackendLocal {
    base_dir: PathBuf,
}

impl BackendLocal {
    pub fn new(storage_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let base_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        Ok(BackendLocal { base_dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(key)
    }
}

impl StorageManager for BackendLocal {
    fn get(&self, key: &str) -> std::io::Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&self, key: &str, data: &[u8]) -> std::io::Result<()> {
        let path = self.path_for(key);
        // write aside then rename, readers never observe a half-written record
        let temp_path = self
            .base_dir
            .join(format!(".{}-{key}.tmp", rusty_ulid::generate_ulid_string()));

        std::fs::write(&temp_path, data)?;
        std::fs::rename(&temp_path, &path)
    }

    fn dir(&self) -> &Path {
        &self.base_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_as_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BackendLocal::new(tmp.path()).unwrap();
        assert!(store.get("knowledgeBase").unwrap().is_none());
    }

    #[test]
    fn test_set_replaces_previous_value() {
        let tmp = tempfile::tempdir().unwrap();
        let store = BackendLocal::new(tmp.path()).unwrap();

        store.set("k", b"first").unwrap();
        store.set("k", b"second").unwrap();

        assert_eq!(store.get("k").unwrap().as_deref(), Some(&b"second"[..]));

        let leftovers = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
