//! Persisted trigger-map storage.
//!
//! The single serialized id→trigger-ids map is a best-effort cache, not
//! ground truth: readers must tolerate an empty map after a failed read,
//! and writers drop the update on failure rather than propagate.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::types::TriggerMap;

/// Durable key-value slot for the serialized trigger map.
#[async_trait]
pub trait TriggerStore: Send + Sync {
    async fn get(&self) -> Result<TriggerMap, StoreError>;
    async fn set(&self, map: &TriggerMap) -> Result<(), StoreError>;
}

/// JSON file store, the default for an app shell.
///
/// Writes go through a temp file and rename so a crash mid-write never
/// leaves a truncated map behind.
pub struct JsonFileTriggerStore {
    path: PathBuf,
}

impl JsonFileTriggerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the user's home directory (`~/.remindkit/triggers.json`).
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self::new(default_store_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn default_store_path() -> Result<PathBuf, StoreError> {
    let home = dirs::home_dir().ok_or(StoreError::HomeDirNotFound)?;
    Ok(home.join(".remindkit").join("triggers.json"))
}

#[async_trait]
impl TriggerStore for JsonFileTriggerStore {
    async fn get(&self) -> Result<TriggerMap, StoreError> {
        if !self.path.exists() {
            return Ok(TriggerMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn set(&self, map: &TriggerMap) -> Result<(), StoreError> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(self.path.clone()))?;
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral shells.
#[derive(Default)]
pub struct InMemoryTriggerStore {
    map: Mutex<TriggerMap>,
}

impl InMemoryTriggerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the map, e.g. to simulate state left over from a previous
    /// process run.
    pub fn seeded(map: TriggerMap) -> Self {
        Self { map: Mutex::new(map) }
    }

    pub fn snapshot(&self) -> TriggerMap {
        self.map.lock().clone()
    }
}

#[async_trait]
impl TriggerStore for InMemoryTriggerStore {
    async fn get(&self) -> Result<TriggerMap, StoreError> {
        Ok(self.map.lock().clone())
    }

    async fn set(&self, map: &TriggerMap) -> Result<(), StoreError> {
        *self.map.lock() = map.clone();
        Ok(())
    }
}
