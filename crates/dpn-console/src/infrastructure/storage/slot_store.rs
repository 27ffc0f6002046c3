//! Handoff slot stores.
//!
//! - [`JsonFileSlotStore`] keeps the record in a small JSON key-value file so
//!   it survives console restarts and can be shared by two console processes
//!   pointed at the same path:
//!
//!   ```json
//!   { "uploaded_file": { "name": "report.pdf", "size_bytes": 2048, … } }
//!   ```
//!
//!   Writes go to a temporary sibling file first and are renamed into place,
//!   so a reader never sees a half-written record.  A missing file, an empty
//!   file, and a file without the `uploaded_file` key all read as "no record".
//!
//! - [`MemorySlotStore`] keeps the record in process memory only.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dpn_core::FileRecord;
use serde_json::{Map, Value};
use tracing::debug;

use crate::application::handoff_slot::{SlotStore, StoreError};

/// Key under which the record is stored.
pub const SLOT_KEY: &str = "uploaded_file";

/// JSON-file backed [`SlotStore`].
#[derive(Debug, Clone)]
pub struct JsonFileSlotStore {
    path: PathBuf,
}

impl JsonFileSlotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn read_map(&self) -> Result<Map<String, Value>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn write_map(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let json =
            serde_json::to_string_pretty(map).map_err(|e| StoreError::Serialize(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        let mut tmp_file = fs::File::create(&tmp_path).map_err(|e| self.io_error(e))?;
        tmp_file
            .write_all(json.as_bytes())
            .map_err(|e| self.io_error(e))?;
        tmp_file.sync_all().map_err(|e| self.io_error(e))?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path).map_err(|e| self.io_error(e))
    }
}

impl SlotStore for JsonFileSlotStore {
    fn load(&self) -> Result<Option<FileRecord>, StoreError> {
        let mut map = self.read_map()?;
        match map.remove(SLOT_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StoreError::Corrupt {
                    path: self.path.clone(),
                    reason: e.to_string(),
                }),
        }
    }

    fn save(&self, record: &FileRecord) -> Result<(), StoreError> {
        let mut map = self.read_map()?;
        let value =
            serde_json::to_value(record).map_err(|e| StoreError::Serialize(e.to_string()))?;
        map.insert(SLOT_KEY.to_string(), value);
        self.write_map(&map)?;
        debug!("slot record written to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut map = self.read_map()?;
        if map.remove(SLOT_KEY).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

/// In-process [`SlotStore`].
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slot: Mutex<Option<FileRecord>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlotStore {
    fn load(&self) -> Result<Option<FileRecord>, StoreError> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, record: &FileRecord) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(uploader: &str) -> FileRecord {
        FileRecord::new("notes.txt", 12, "text/plain", uploader)
    }

    #[test]
    fn test_missing_file_reads_as_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSlotStore::new(dir.path().join("slot.json"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_empty_file_reads_as_no_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.json");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(JsonFileSlotStore::new(path).load().unwrap(), None);
    }

    #[test]
    fn test_save_then_load_returns_whole_record() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSlotStore::new(dir.path().join("nested").join("slot.json"));
        let record = sample("alice@example.com");

        // Act
        store.save(&record).unwrap();

        // Assert
        assert_eq!(store.load().unwrap(), Some(record));
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"uploaded_file\""));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_second_save_overwrites_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSlotStore::new(dir.path().join("slot.json"));
        store.save(&sample("alice@example.com")).unwrap();
        let second = sample("bob@example.com");

        store.save(&second).unwrap();

        assert_eq!(store.load().unwrap(), Some(second));
    }

    #[test]
    fn test_two_stores_on_same_path_share_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.json");
        let writer = JsonFileSlotStore::new(&path);
        let reader = JsonFileSlotStore::new(&path);

        writer.save(&sample("alice@example.com")).unwrap();

        assert!(reader.load().unwrap().is_some());
    }

    #[test]
    fn test_clear_removes_key_but_keeps_other_entries() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.json");
        fs::write(&path, r#"{"theme":"dark"}"#).unwrap();
        let store = JsonFileSlotStore::new(&path);
        store.save(&sample("alice@example.com")).unwrap();

        // Act
        store.clear().unwrap();

        // Assert
        assert_eq!(store.load().unwrap(), None);
        let map: Map<String, Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(map.get("theme"), Some(&Value::String("dark".to_string())));
    }

    #[test]
    fn test_garbage_file_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.json");
        fs::write(&path, "not json").unwrap();

        let result = JsonFileSlotStore::new(path).load();

        assert!(matches!(result, Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_memory_store_round_trip_and_clear() {
        let store = MemorySlotStore::new();
        assert_eq!(store.load().unwrap(), None);

        store.save(&sample("alice@example.com")).unwrap();
        assert!(store.load().unwrap().is_some());

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
