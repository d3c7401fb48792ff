//! Offset store.
//!
//! Persists the [`OffsetMap`] between runs. The store is read once at the
//! start of a run and written once at the end; there is no concurrent access
//! and no partial or append-style writes.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::sync::file::{atomic_write, to_pretty_json};
use crate::sync::types::{OffsetMap, SyncError, SyncResult};

/// Default file name, next to the config file.
pub const DEFAULT_OFFSET_FILE: &str = "notion_offset.json";

/// Persistent record id -> timestamp map.
pub trait OffsetStore {
    /// Load the persisted map, or an empty map if nothing was persisted yet.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::CorruptOffsetStore`] if persisted data exists but
    /// cannot be parsed.
    fn load(&self) -> SyncResult<OffsetMap>;

    /// Replace the persisted map with `offsets`.
    ///
    /// # Errors
    ///
    /// Returns an error if the map cannot be written.
    fn persist(&mut self, offsets: &OffsetMap) -> SyncResult<()>;
}

/// Offset store backed by a pretty-printed JSON object file.
#[derive(Debug, Clone)]
pub struct JsonOffsetStore {
    path: PathBuf,
}

impl JsonOffsetStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, message: impl Into<String>) -> SyncError {
        SyncError::CorruptOffsetStore {
            path: self.path.display().to_string(),
            message: message.into(),
        }
    }
}

impl OffsetStore for JsonOffsetStore {
    fn load(&self) -> SyncResult<OffsetMap> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No offset file, starting empty");
            return Ok(OffsetMap::new());
        }

        let mut leftover = self.path.clone().into_os_string();
        leftover.push(".tmp");
        if Path::new(&leftover).exists() {
            warn!(
                path = %self.path.display(),
                "Ignoring temp file left by an interrupted offset write"
            );
        }

        let bytes = fs::read(&self.path)?;
        let offsets: OffsetMap =
            serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))?;

        debug!(path = %self.path.display(), records = offsets.len(), "Loaded offsets");
        Ok(offsets)
    }

    fn persist(&mut self, offsets: &OffsetMap) -> SyncResult<()> {
        let content = to_pretty_json(offsets)?;
        atomic_write(&self.path, &content)?;
        debug!(path = %self.path.display(), records = offsets.len(), "Persisted offsets");
        Ok(())
    }
}

/// In-memory offset store.
///
/// Counts persists so callers can check the once-per-run contract.
#[derive(Debug, Clone, Default)]
pub struct MemoryOffsetStore {
    stored: Option<OffsetMap>,
    persist_count: usize,
}

impl MemoryOffsetStore {
    /// Store that starts out holding `offsets`.
    #[must_use]
    pub fn with_offsets(offsets: OffsetMap) -> Self {
        Self {
            stored: Some(offsets),
            persist_count: 0,
        }
    }

    /// Last persisted map, if any.
    #[must_use]
    pub fn stored(&self) -> Option<&OffsetMap> {
        self.stored.as_ref()
    }

    /// Number of `persist` calls so far.
    #[must_use]
    pub fn persist_count(&self) -> usize {
        self.persist_count
    }
}

impl OffsetStore for MemoryOffsetStore {
    fn load(&self) -> SyncResult<OffsetMap> {
        Ok(self.stored.clone().unwrap_or_default())
    }

    fn persist(&mut self, offsets: &OffsetMap) -> SyncResult<()> {
        self.stored = Some(offsets.clone());
        self.persist_count += 1;
        Ok(())
    }
}
