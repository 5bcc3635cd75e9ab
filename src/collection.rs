//! The Pokebank: captured entries, unique by species

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::encounter::{self, Encounter};
use crate::error::StorageError;
use crate::storage::{self, Storage};

/// Shown after the name of rare entries.
pub const RARE_MARKER: &str = "✨";

/// A captured creature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Entry {
    pub species_id: u16,
    pub canonical_name: String,
    pub display_name: String,
    pub standard_image_url: String,
    /// Image shown for this entry; the alternate artwork for rare entries.
    pub image_url: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub is_rare_variant: bool,
}

impl Entry {
    pub fn from_encounter(encounter: &Encounter) -> Self {
        Self {
            species_id: encounter.species_id,
            canonical_name: encounter.canonical_name.clone(),
            display_name: encounter.display_name.clone(),
            standard_image_url: encounter.standard_image_url.clone(),
            image_url: encounter.image_url.clone(),
            nickname: None,
            is_rare_variant: encounter.is_rare_variant,
        }
    }

    /// Nickname if set, otherwise the display name.
    pub fn label(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.display_name)
    }

    /// `Nickname (Display name)` when nicknamed, the display name otherwise.
    pub fn full_label(&self) -> String {
        match &self.nickname {
            Some(nickname) => format!("{} ({})", nickname, self.display_name),
            None => self.display_name.clone(),
        }
    }

    /// Display name with the rarity marker appended for rare entries.
    pub fn marked_name(&self) -> String {
        marked(&self.display_name, self.is_rare_variant)
    }
}

fn marked(name: &str, rare: bool) -> String {
    if rare {
        format!("{name} {RARE_MARKER}")
    } else {
        name.to_string()
    }
}

/// What a capture attempt did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum CaptureOutcome {
    Captured { display_name: String, rare: bool },
    /// The species was already held; fields describe the stored entry.
    Duplicate { display_name: String, rare: bool },
}

impl CaptureOutcome {
    pub fn message(&self) -> String {
        match self {
            CaptureOutcome::Captured { display_name, rare } => {
                format!("{} was caught!", marked(display_name, *rare))
            }
            CaptureOutcome::Duplicate { display_name, rare } => {
                format!(
                    "You already have {} in your Pokébank!",
                    marked(display_name, *rare)
                )
            }
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, CaptureOutcome::Duplicate { .. })
    }
}

/// A user edit to the Pokebank.
#[derive(Clone, Copy, Debug)]
pub enum Edit<'a> {
    Capture(&'a Encounter),
    Rename { index: usize, nickname: &'a str },
    Release { index: usize },
}

/// What an applied [`Edit`] did. Every change has to be persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    /// Both capture outcomes count as a change.
    Captured(CaptureOutcome),
    Renamed,
    Released(Entry),
}

/// Ordered list of entries with no two sharing a species id.
///
/// Deserializing goes through [`Collection::from_entries`], so records from a
/// state file obey the same rules as the saved Pokebank.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Collection {
    entries: Vec<Entry>,
}

impl<'de> Deserialize<'de> for Collection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(Collection::from_entries(entries))
    }
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection in order, dropping entries for unknown species and
    /// repeats of a species already seen (the first one wins).
    pub fn from_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut collection = Self::new();
        for entry in entries {
            let species_id = entry.species_id;
            if !encounter::is_known_species(species_id) {
                tracing::warn!(species_id, "dropping entry for unknown species");
                continue;
            }
            if !collection.insert(entry) {
                tracing::warn!(species_id, "dropping duplicate entry");
            }
        }
        collection
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, species_id: u16) -> bool {
        self.find(species_id).is_some()
    }

    pub fn find(&self, species_id: u16) -> Option<&Entry> {
        self.entries.iter().find(|e| e.species_id == species_id)
    }

    /// Append unless the species is already held. Returns whether it was added.
    fn insert(&mut self, entry: Entry) -> bool {
        if self.contains(entry.species_id) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn capture(&mut self, encounter: &Encounter) -> CaptureOutcome {
        if let Some(existing) = self.find(encounter.species_id) {
            return CaptureOutcome::Duplicate {
                display_name: existing.display_name.clone(),
                rare: existing.is_rare_variant,
            };
        }
        self.entries.push(Entry::from_encounter(encounter));
        CaptureOutcome::Captured {
            display_name: encounter.display_name.clone(),
            rare: encounter.is_rare_variant,
        }
    }

    /// Set or clear the nickname at `index`. Whitespace-only clears it.
    /// Returns false when `index` is out of range.
    pub fn rename(&mut self, index: usize, nickname: &str) -> bool {
        let Some(entry) = self.entries.get_mut(index) else {
            return false;
        };
        let trimmed = nickname.trim();
        entry.nickname = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        true
    }

    pub fn release(&mut self, index: usize) -> Option<Entry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    pub fn count_total(&self) -> usize {
        self.entries.len()
    }

    pub fn count_rare(&self) -> usize {
        self.entries.iter().filter(|e| e.is_rare_variant).count()
    }

    /// Apply an edit. `None` means nothing changed and nothing needs saving.
    pub fn apply(&mut self, edit: Edit<'_>) -> Option<Change> {
        match edit {
            Edit::Capture(encounter) => Some(Change::Captured(self.capture(encounter))),
            Edit::Rename { index, nickname } => {
                self.rename(index, nickname).then_some(Change::Renamed)
            }
            Edit::Release { index } => self.release(index).map(Change::Released),
        }
    }
}

/// A [`Collection`] bound to the slot it is persisted in, for callers without
/// an effect loop. Every change is written through before returning; the
/// terminal app applies the same [`Collection::apply`] in its reducer and
/// persists through an effect instead.
pub struct CollectionStore<S: Storage> {
    collection: Collection,
    storage: S,
}

impl<S: Storage> CollectionStore<S> {
    /// Restore from `storage`, starting empty if the slot is missing or malformed.
    pub fn restore(storage: S) -> Self {
        let collection = storage::restore(&storage);
        Self {
            collection,
            storage,
        }
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Capture persists on both outcomes; no-op renames and releases do not write.
    pub fn apply(&mut self, edit: Edit<'_>) -> Result<Option<Change>, StorageError> {
        let change = self.collection.apply(edit);
        if change.is_some() {
            storage::persist(&self.storage, &self.collection)?;
        }
        Ok(change)
    }

    pub fn count_total(&self) -> usize {
        self.collection.count_total()
    }

    pub fn count_rare(&self) -> usize {
        self.collection.count_rare()
    }
}
