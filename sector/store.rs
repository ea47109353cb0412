/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Sector resolution across launch parameters and the durable key-value store.
//!
//! Precedence, evaluated once at construction:
//! - the transient sector carried by the launch parameters (never persisted)
//! - the value persisted under [`SECTOR_STORAGE_KEY`]
//! - unknown

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, warn};
use tempfile::NamedTempFile;

use super::Sector;

/// Durable key holding the persisted sector string.
pub const SECTOR_STORAGE_KEY: &str = "nperf_user_sector";

const STORAGE_DIR_NAME: &str = "nperf-bridge";
const STORAGE_FILE_NAME: &str = "storage.json";

/// Scoped string key-value store standing in for the browser's local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store. Clones share the same entries.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.entries.borrow().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten in full on every mutation.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| StoreError::Io(format!("Failed to read {}: {e}", path.display())))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    StoreError::Format(format!("Invalid store file {}: {e}", path.display()))
                })?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    /// Open the store at the per-user default location.
    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(default_store_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .map_err(|e| StoreError::Io(format!("Failed to create dir: {e}")))?;
        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| StoreError::Format(format!("{e}")))?;
        let write_error =
            |e: std::io::Error| StoreError::Io(format!("Failed to write {}: {e}", self.path.display()));
        // Staged next to the target so the final rename stays on one filesystem.
        let mut staged = NamedTempFile::new_in(dir).map_err(write_error)?;
        staged.write_all(content.as_bytes()).map_err(write_error)?;
        staged.as_file().sync_all().map_err(write_error)?;
        staged.persist(&self.path).map_err(|e| write_error(e.error))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_none() {
            return Ok(());
        }
        self.flush()
    }
}

/// Default location of the durable store file.
pub fn default_store_path() -> Result<PathBuf, StoreError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| StoreError::Unavailable("config dir not found".to_string()))?;
    Ok(config_dir.join(STORAGE_DIR_NAME).join(STORAGE_FILE_NAME))
}

/// Owns the session's current sector and its durable copy.
pub struct SectorStore {
    durable: Box<dyn KeyValueStore>,
    current: Option<Sector>,
}

impl SectorStore {
    pub fn new(durable: Box<dyn KeyValueStore>, launch_sector: Option<Sector>) -> Self {
        let current = match launch_sector {
            Some(sector) => {
                debug!("Sector initialized from launch parameters: {sector}");
                Some(sector)
            },
            None => match durable.get(SECTOR_STORAGE_KEY) {
                Ok(stored) => stored.and_then(Sector::new),
                Err(e) => {
                    warn!("Failed to read stored sector: {e}");
                    None
                },
            },
        };
        Self { durable, current }
    }

    /// The sector for this session, or `None` when the user must be asked.
    pub fn current_sector(&self) -> Option<&Sector> {
        self.current.as_ref()
    }

    /// Adopt `sector` for the rest of the session.
    ///
    /// Catch-all values clear the durable entry so the next session asks again;
    /// every other value overwrites it.
    pub fn commit(&mut self, sector: Sector) {
        let persisted = if sector.is_catch_all() {
            self.durable.remove(SECTOR_STORAGE_KEY)
        } else {
            self.durable.set(SECTOR_STORAGE_KEY, sector.as_str())
        };
        if let Err(e) = persisted {
            warn!("Failed to update stored sector: {e}");
        }
        self.current = Some(sector);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Io(String),
    Format(String),
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "IO error: {e}"),
            StoreError::Format(e) => write!(f, "Format error: {e}"),
            StoreError::Unavailable(e) => write!(f, "Store unavailable: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sector::SectorCategory;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn sector(value: &str) -> Sector {
        Sector::new(value).unwrap()
    }

    #[test]
    fn launch_sector_takes_precedence_over_stored_value() {
        let durable = MemoryStore::with_entry(SECTOR_STORAGE_KEY, "Secteur Santé");
        let store = SectorStore::new(Box::new(durable.clone()), Some(sector("ARTCI")));

        assert_eq!(store.current_sector(), Some(&sector("ARTCI")));
        // The transient value is never written back.
        assert_eq!(
            durable.snapshot().get(SECTOR_STORAGE_KEY).map(String::as_str),
            Some("Secteur Santé")
        );
    }

    #[test]
    fn stored_value_is_used_without_launch_sector() {
        let durable = MemoryStore::with_entry(SECTOR_STORAGE_KEY, "Presse / Médias");
        let store = SectorStore::new(Box::new(durable), None);
        assert_eq!(store.current_sector(), Some(&sector("Presse / Médias")));
    }

    #[test]
    fn blank_stored_value_counts_as_unknown() {
        let durable = MemoryStore::with_entry(SECTOR_STORAGE_KEY, "");
        let store = SectorStore::new(Box::new(durable), None);
        assert_eq!(store.current_sector(), None);
    }

    #[test]
    fn commit_of_enumerated_category_overwrites_stored_value() {
        let durable = MemoryStore::with_entry(SECTOR_STORAGE_KEY, "ARTCI");
        let mut store = SectorStore::new(Box::new(durable.clone()), None);

        store.commit(Sector::from_category(SectorCategory::Education));

        assert_eq!(
            durable.snapshot().get(SECTOR_STORAGE_KEY).map(String::as_str),
            Some("Secteur Education")
        );
        assert_eq!(
            store.current_sector().map(Sector::as_str),
            Some("Secteur Education")
        );
    }

    #[test]
    fn commit_of_catch_all_clears_stored_value() {
        let durable = MemoryStore::with_entry(SECTOR_STORAGE_KEY, "ARTCI");
        let mut store = SectorStore::new(Box::new(durable.clone()), None);

        store.commit(Sector::other("Freelance").unwrap());

        assert!(durable.snapshot().get(SECTOR_STORAGE_KEY).is_none());
        assert_eq!(
            store.current_sector().map(Sector::as_str),
            Some("Autres: Freelance")
        );
    }

    #[test]
    fn json_file_store_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut file_store = JsonFileStore::open(path.clone()).unwrap();
        assert_eq!(file_store.get(SECTOR_STORAGE_KEY).unwrap(), None);
        file_store.set(SECTOR_STORAGE_KEY, "ARTCI").unwrap();

        let reopened = JsonFileStore::open(path.clone()).unwrap();
        assert_eq!(
            reopened.get(SECTOR_STORAGE_KEY).unwrap().as_deref(),
            Some("ARTCI")
        );

        let mut reopened = reopened;
        reopened.remove(SECTOR_STORAGE_KEY).unwrap();
        let after_remove = JsonFileStore::open(path).unwrap();
        assert_eq!(after_remove.get(SECTOR_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn json_file_store_replaces_file_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{\"other\": \"kept\"}").unwrap();

        let mut file_store = JsonFileStore::open(path.clone()).unwrap();
        file_store.set(SECTOR_STORAGE_KEY, "ARTCI").unwrap();
        file_store.set(SECTOR_STORAGE_KEY, "Secteur Santé").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("storage.json")]);

        let reopened = JsonFileStore::open(path).unwrap();
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("kept"));
        assert_eq!(
            reopened.get(SECTOR_STORAGE_KEY).unwrap().as_deref(),
            Some("Secteur Santé")
        );
    }

    #[test]
    fn json_file_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let err = JsonFileStore::open(path).unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
    }

    #[test]
    fn sector_store_over_json_file_forgets_catch_all_next_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let file_store = JsonFileStore::open(path.clone()).unwrap();
        let mut store = SectorStore::new(Box::new(file_store), None);
        store.commit(Sector::from_category(SectorCategory::Regulator));

        let next_session = SectorStore::new(Box::new(JsonFileStore::open(path.clone()).unwrap()), None);
        assert_eq!(next_session.current_sector().map(Sector::as_str), Some("ARTCI"));

        let mut next_session = next_session;
        next_session.commit(Sector::other("Freelance").unwrap());

        let third_session = SectorStore::new(Box::new(JsonFileStore::open(path).unwrap()), None);
        assert_eq!(third_session.current_sector(), None);
    }

    proptest! {
        #[test]
        fn current_sector_is_stable_between_commits(reads in 1_usize..16, stored in "[A-Za-z]{1,12}") {
            let durable = MemoryStore::with_entry(SECTOR_STORAGE_KEY, &stored);
            let store = SectorStore::new(Box::new(durable), None);
            let first = store.current_sector().cloned();
            for _ in 0..reads {
                prop_assert_eq!(store.current_sector().cloned(), first.clone());
            }
        }

        #[test]
        fn enumerated_commit_leaves_exactly_the_committed_value(index in 0_usize..8, prior in proptest::option::of("[a-z]{1,8}")) {
            let durable = match &prior {
                Some(value) => MemoryStore::with_entry(SECTOR_STORAGE_KEY, value),
                None => MemoryStore::new(),
            };
            let mut store = SectorStore::new(Box::new(durable.clone()), None);
            let category = SectorCategory::ALL[index];
            store.commit(Sector::from_category(category));
            prop_assert_eq!(
                durable.snapshot().get(SECTOR_STORAGE_KEY).cloned(),
                Some(category.label().to_string())
            );
        }

        #[test]
        fn catch_all_commit_leaves_no_entry(detail in "[A-Za-z]{1,12}", prior in proptest::option::of("[a-z]{1,8}")) {
            let durable = match &prior {
                Some(value) => MemoryStore::with_entry(SECTOR_STORAGE_KEY, value),
                None => MemoryStore::new(),
            };
            let mut store = SectorStore::new(Box::new(durable.clone()), None);
            store.commit(Sector::other(&detail).unwrap());
            prop_assert!(durable.snapshot().get(SECTOR_STORAGE_KEY).is_none());
        }
    }
}
