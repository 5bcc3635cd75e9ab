//! Persistence port for the Pokebank slot
//!
//! The slot holds a JSON array of [`StoredEntry`] records. Decoding is done in
//! two steps: serde reads the on-disk shape (current or legacy field names,
//! optional fields defaulted), then each record is converted into an [`Entry`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::collection::{Collection, Entry};
use crate::error::StorageError;

/// A single named slot that can be read and overwritten whole.
pub trait Storage: Send + Sync {
    /// Returns `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<String>, StorageError>;
    fn write(&self, contents: &str) -> Result<(), StorageError>;
}

/// Slot backed by a JSON file on disk.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl Storage for FileStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        // Readers only ever see the old file or the complete new one.
        let tmp = self.temp_path();
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-memory slot, used by tests and render-once sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(contents.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl Storage for MemoryStorage {
    fn read(&self) -> Result<Option<String>, StorageError> {
        let slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(slot.clone())
    }

    fn write(&self, contents: &str) -> Result<(), StorageError> {
        let mut slot = self.slot.lock().map_err(|_| StorageError::Poisoned)?;
        *slot = Some(contents.to_string());
        Ok(())
    }
}

/// On-disk record. Field aliases accept the first-generation web format
/// (`id`, `name`, `spanishName`, `img`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEntry {
    #[serde(alias = "id")]
    pub species_id: u16,
    #[serde(alias = "name")]
    pub canonical_name: String,
    #[serde(alias = "spanishName")]
    pub display_name: String,
    #[serde(alias = "img")]
    pub standard_image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default)]
    pub is_rare_variant: bool,
}

impl From<StoredEntry> for Entry {
    fn from(stored: StoredEntry) -> Self {
        let image_url = stored
            .image_url
            .unwrap_or_else(|| stored.standard_image_url.clone());
        Entry {
            species_id: stored.species_id,
            canonical_name: stored.canonical_name,
            display_name: stored.display_name,
            standard_image_url: stored.standard_image_url,
            image_url,
            nickname: stored.nickname.filter(|n| !n.trim().is_empty()),
            is_rare_variant: stored.is_rare_variant,
        }
    }
}

impl From<&Entry> for StoredEntry {
    fn from(entry: &Entry) -> Self {
        StoredEntry {
            species_id: entry.species_id,
            canonical_name: entry.canonical_name.clone(),
            display_name: entry.display_name.clone(),
            standard_image_url: entry.standard_image_url.clone(),
            image_url: Some(entry.image_url.clone()),
            nickname: entry.nickname.clone(),
            is_rare_variant: entry.is_rare_variant,
        }
    }
}

/// Serialize a collection into the slot format.
pub fn encode(collection: &Collection) -> Result<String, StorageError> {
    let records: Vec<StoredEntry> = collection.entries().iter().map(StoredEntry::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Parse the slot format. Records outside the Gen 1 range are dropped, and
/// stored duplicates of a species id keep the first record.
pub fn decode(contents: &str) -> Result<Collection, StorageError> {
    let records: Vec<StoredEntry> = serde_json::from_str(contents)?;
    Ok(Collection::from_entries(records.into_iter().map(Entry::from)))
}

/// Load the collection from `storage`. Missing or malformed data yields an
/// empty collection; the problem is logged and never surfaced.
pub fn restore(storage: &dyn Storage) -> Collection {
    let contents = match storage.read() {
        Ok(Some(contents)) => contents,
        Ok(None) => {
            tracing::info!("no saved pokebank, starting empty");
            return Collection::new();
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to read saved pokebank");
            return Collection::new();
        }
    };

    match decode(&contents) {
        Ok(collection) => {
            tracing::info!(
                total = collection.count_total(),
                rare = collection.count_rare(),
                "restored pokebank"
            );
            collection
        }
        Err(e) => {
            tracing::warn!(error = %e, "saved pokebank is malformed, starting empty");
            Collection::new()
        }
    }
}

/// Write the whole collection to `storage`.
pub fn persist(storage: &dyn Storage, collection: &Collection) -> Result<(), StorageError> {
    let contents = encode(collection)?;
    storage.write(&contents)
}
