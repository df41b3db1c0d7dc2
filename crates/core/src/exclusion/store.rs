//! Persistence for the per-session exclusion overrides.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use parking_lot::Mutex;
use tracing::debug;

use crate::{error::StoreError, models::StateExclusion};

/// Key under which the override list is stored.
pub const OVERRIDE_NAMESPACE: &str = "resource-pools-exclusions";

/// Root directory under the platform data dir used for overrides.
pub const DEFAULT_OVERRIDE_DIR: &str = "poolboard/overrides";

/// Storage medium for the local override list.
///
/// Implementations always persist the full list; there is no partial update.
pub trait OverrideStore {
    /// Read the stored list. An absent list is an empty list.
    fn load(&self) -> Result<Vec<StateExclusion>, StoreError>;

    /// Replace the stored list.
    fn save(&self, entries: &[StateExclusion]) -> Result<(), StoreError>;
}

impl<S: OverrideStore + ?Sized> OverrideStore for &S {
    fn load(&self) -> Result<Vec<StateExclusion>, StoreError> {
        (**self).load()
    }

    fn save(&self, entries: &[StateExclusion]) -> Result<(), StoreError> {
        (**self).save(entries)
    }
}

/// Stores the list as a JSON array in `<root>/<namespace>.json`.
#[derive(Debug, Clone)]
pub struct FileOverrideStore {
    path: PathBuf,
}

impl FileOverrideStore {
    /// Store under `root` using the fixed namespace.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_namespace(root, OVERRIDE_NAMESPACE)
    }

    /// Store under `root` using a custom namespace.
    pub fn with_namespace(root: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            path: root.as_ref().join(format!("{namespace}.json")),
        }
    }

    /// Default location under the user's data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_OVERRIDE_DIR)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl OverrideStore for FileOverrideStore {
    fn load(&self) -> Result<Vec<StateExclusion>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(self.io_error(err)),
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        let entries: Vec<StateExclusion> = serde_json::from_str(&content)?;
        debug!(path = %self.path.display(), entries = entries.len(), "overrides loaded");
        Ok(entries)
    }

    fn save(&self, entries: &[StateExclusion]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let serialised = serde_json::to_vec_pretty(entries)?;
        fs::write(&self.path, serialised).map_err(|err| self.io_error(err))
    }
}

/// Keeps the list in memory; used for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryOverrideStore {
    entries: Mutex<Vec<StateExclusion>>,
    saves: Mutex<usize>,
}

impl MemoryOverrideStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with entries, as if loaded from an earlier session.
    pub fn with_entries(entries: Vec<StateExclusion>) -> Self {
        Self {
            entries: Mutex::new(entries),
            saves: Mutex::new(0),
        }
    }

    /// Snapshot of what is currently stored.
    pub fn entries(&self) -> Vec<StateExclusion> {
        self.entries.lock().clone()
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }
}

impl OverrideStore for MemoryOverrideStore {
    fn load(&self) -> Result<Vec<StateExclusion>, StoreError> {
        Ok(self.entries.lock().clone())
    }

    fn save(&self, entries: &[StateExclusion]) -> Result<(), StoreError> {
        *self.entries.lock() = entries.to_vec();
        *self.saves.lock() += 1;
        Ok(())
    }
}
