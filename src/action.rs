//! Actions: user intents and async results

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::artwork::Artwork;
use crate::encounter::{Encounter, RequestToken};

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    // ===== Encounter category =====
    /// Intent: look for another wild Pokemon (triggers async task)
    EncounterSearch,

    /// Result: lookup for `token` finished
    EncounterDidLoad {
        token: RequestToken,
        encounter: Encounter,
    },

    /// Result: lookup for `token` failed
    EncounterDidError { token: RequestToken, error: String },

    /// Put the current encounter into the Pokebank
    EncounterCapture,

    // ===== Artwork category =====
    /// Result: image at `url` downloaded and decoded
    ArtworkDidLoad { url: String, artwork: Artwork },

    /// Result: image at `url` could not be shown
    ArtworkDidError { url: String, error: String },

    // ===== Collection category =====
    /// Highlight a row in the Pokebank list
    CollectionSelect(usize),

    // ===== Release category =====
    /// Ask for confirmation before releasing the highlighted entry
    ReleaseOpen,
    ReleaseConfirm,

    // ===== Nickname category =====
    /// Open the nickname editor for the highlighted entry
    NicknameOpen,
    NicknameChange(String),
    NicknameSave,

    // ===== Dialog category =====
    /// Dismiss whatever dialog is open
    DialogClose,

    // ===== UI category =====
    UiTerminalResize(u16, u16),

    // ===== Uncategorized (global) =====
    Tick,
    Quit,
}
