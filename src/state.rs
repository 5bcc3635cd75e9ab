//! Application state - single source of truth

use std::collections::{HashMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::artwork::Artwork;
use crate::collection::{Collection, Entry};
use crate::encounter::{Encounter, EncounterTracker, StalePolicy};

pub const TICK_MS: u64 = 150;

/// The modal currently covering the page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Dialog {
    /// Result of a capture attempt.
    Capture { message: String, duplicate: bool },
    /// Waiting for the user to confirm releasing the entry at `index`.
    Release { index: usize },
    /// Editing the nickname of the entry at `index`.
    Nickname { index: usize, draft: String },
}

#[derive(Clone, Debug, tui_dispatch::DebugState, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppState {
    /// Captured entries, persisted after every mutation
    #[debug(section = "Pokebank", label = "Entries", debug_fmt)]
    pub collection: Collection,

    /// Highlighted row in the Pokebank list
    #[debug(section = "Pokebank", label = "Selected")]
    pub selected: usize,

    /// The wild Pokemon on display
    #[debug(section = "Encounter", label = "Current", debug_fmt)]
    pub encounter: Option<Encounter>,

    /// Request tokens for encounter lookups
    #[debug(section = "Encounter", label = "Requests", debug_fmt)]
    pub tracker: EncounterTracker,

    /// Last failed lookup, kept for diagnostics only
    #[debug(section = "Encounter", label = "Last error", debug_fmt)]
    pub last_lookup_error: Option<String>,

    #[debug(section = "UI", label = "Dialog", debug_fmt)]
    pub dialog: Option<Dialog>,

    /// Draw creature images; needs a terminal with kitty graphics
    #[debug(section = "UI", label = "Artwork")]
    pub show_artwork: bool,

    /// Decoded images by URL
    #[debug(skip)]
    pub artwork: HashMap<String, Artwork>,

    /// Image URLs with a download in flight
    #[debug(section = "UI", label = "Artwork loading", debug_fmt)]
    pub artwork_pending: HashSet<String>,

    /// Spinner frame counter
    #[debug(skip)]
    pub tick_count: u32,
}

impl AppState {
    pub fn new(collection: Collection, policy: StalePolicy) -> Self {
        Self {
            collection,
            selected: 0,
            encounter: None,
            tracker: EncounterTracker::new(policy),
            last_lookup_error: None,
            dialog: None,
            show_artwork: true,
            artwork: HashMap::new(),
            artwork_pending: HashSet::new(),
            tick_count: 0,
        }
    }

    pub fn with_artwork(mut self, show: bool) -> Self {
        self.show_artwork = show;
        self
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.collection.get(self.selected)
    }

    /// Image URLs the screen wants: the encounter and the highlighted entry.
    pub fn wanted_artwork(&self) -> Vec<&str> {
        if !self.show_artwork {
            return Vec::new();
        }
        let encounter = self.encounter.as_ref().map(|e| e.image_url.as_str());
        let selected = self.selected_entry().map(|e| e.image_url.as_str());
        let mut urls: Vec<&str> = encounter.into_iter().chain(selected).collect();
        urls.dedup();
        urls
    }

    pub fn is_searching(&self) -> bool {
        self.tracker.is_pending()
    }

    /// Keep the selection on a valid row after the list shrinks.
    pub fn clamp_selection(&mut self) {
        let len = self.collection.len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Collection::new(), StalePolicy::default())
    }
}
