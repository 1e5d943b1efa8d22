//! JSON key-value persistence in the gridsnake data directory.
//!
//! Each key is one `<key>.json` file. Reads fall back to defaults on any
//! missing or malformed value; the `_quiet` writers log and swallow errors.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resolve the default data directory, creating it if needed.
///
/// Platform data dir via `directories`, falling back to `~/.gridsnake`.
pub fn default_data_dir() -> io::Result<PathBuf> {
    let dir = match directories::ProjectDirs::from("", "", "gridsnake") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => {
            let home_dir = dirs::home_dir().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    "Could not determine home directory",
                )
            })?;
            home_dir.join(".gridsnake")
        }
    };
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Key-value store rooted at one directory.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Open (and create) a store at `dir`.
    pub fn at(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open the store in the default data directory.
    pub fn open_default() -> io::Result<Self> {
        Self::at(default_data_dir()?)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path for a key.
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Load a value, returning `T::default()` if missing or invalid.
    pub fn load_or_default<T: Default + DeserializeOwned>(&self, key: &str) -> T {
        self.load(key).unwrap_or_default()
    }

    /// Load a value, `None` if missing or invalid.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let json = fs::read_to_string(self.path(key)).ok()?;
        match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding malformed persisted value");
                None
            }
        }
    }

    /// Save a value as pretty-printed JSON.
    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.path(key), json)?;
        Ok(())
    }

    /// Save, logging instead of failing.
    pub fn save_quiet<T: Serialize>(&self, key: &str, data: &T) {
        if let Err(e) = self.save(key, data) {
            tracing::warn!(key, error = %e, "could not persist value");
        }
    }

    /// Delete a key. Missing keys are fine.
    pub fn remove_quiet(&self, key: &str) {
        match fs::remove_file(self.path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(key, error = %e, "could not remove persisted value"),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_store() -> Store {
    use std::sync::atomic::{AtomicU64, Ordering};
    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    let test_id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!(
        "gridsnake-test-{}-{}",
        std::process::id(),
        test_id
    ));
    let _ = fs::remove_dir_all(&dir);
    Store::at(dir).expect("temp store")
}
