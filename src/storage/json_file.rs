//! JSON file backed user store.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{StoreError, UserMap, UserStore};

/// Stores the whole user map in one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the given file. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file without failing open, for tools that must report errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid user map.
    pub fn load_strict(&self) -> Result<UserMap, StoreError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl UserStore for JsonFileStore {
    fn load(&self) -> UserMap {
        match self.load_strict() {
            Ok(users) => users,
            Err(e) => {
                debug!("Treating user data at {} as empty: {}", self.path.display(), e);
                UserMap::new()
            }
        }
    }

    fn save(&self, users: &UserMap) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(users)?;

        // Readers never observe a half-written file.
        let temp = self.temp_path();
        std::fs::write(&temp, json)?;
        std::fs::rename(&temp, &self.path)?;

        debug!("Saved {} user record(s) to {}", users.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::UserRecord;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("user_data.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_data.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(store.load().is_empty());
        assert!(store.load_strict().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("user_data.json"));

        store.set_city("100", "Санкт-Петербург").unwrap();
        store.set_city("200", "London").unwrap();
        store.unsubscribe("200").unwrap();

        let reopened = JsonFileStore::new(store.path());
        let users = reopened.load();
        assert_eq!(users["100"], UserRecord::subscribed_to("Санкт-Петербург"));
        assert!(!users["200"].subscribed);
        assert_eq!(users["200"].city.as_deref(), Some("London"));
    }

    #[test]
    fn test_file_is_human_readable() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("user_data.json"));
        store.set_city("1", "Москва").unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("Москва"));
        assert!(content.contains('\n'));
        assert!(!store.temp_path().exists());
    }
}
