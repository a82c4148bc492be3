//! Best-effort storage slot for the serialized transcript.
//!
//! The controller reads the slot once at startup and overwrites it after
//! every append.  Failures are logged by the caller and never affect the
//! conversation.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;

/// A single key-value slot holding the serialized transcript.
pub trait TranscriptStorage: Send + Sync {
    /// Stored JSON, or `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored JSON.
    fn save(&self, serialized: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// JsonFileStorage
// ---------------------------------------------------------------------------

/// Stores the transcript in a JSON file, e.g.
/// [`AppPaths::transcript_file`](crate::config::AppPaths).
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TranscriptStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&self.path)?))
    }

    fn save(&self, serialized: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Write-then-rename so a crash never leaves a truncated file behind.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serialized)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// Session-only slot; lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(serialized: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(serialized.into())),
        }
    }
}

impl TranscriptStorage for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| anyhow::anyhow!("storage lock poisoned: {e}"))?;
        Ok(slot.clone())
    }

    fn save(&self, serialized: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| anyhow::anyhow!("storage lock poisoned: {e}"))?;
        *slot = Some(serialized.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_storage_missing_file_loads_none() {
        let dir = tempdir().expect("temp dir");
        let storage = JsonFileStorage::new(dir.path().join("transcript.json"));
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn file_storage_round_trip_creates_parent_dirs() {
        let dir = tempdir().expect("temp dir");
        let storage = JsonFileStorage::new(dir.path().join("nested/deeper/transcript.json"));

        storage.save("[]").unwrap();
        storage.save(r#"[{"x":1}]"#).unwrap();

        assert_eq!(storage.load().unwrap().as_deref(), Some(r#"[{"x":1}]"#));
        assert!(!storage.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        assert!(storage.load().unwrap().is_none());

        storage.save("[]").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("[]"));

        let seeded = MemoryStorage::with_contents("seed");
        assert_eq!(seeded.load().unwrap().as_deref(), Some("seed"));
    }
}
