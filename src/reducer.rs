//! Reducer - pure function: (state, action) -> DispatchResult

use tui_dispatch::DispatchResult;

use crate::action::Action;
use crate::collection::{Change, Edit};
use crate::effect::Effect;
use crate::state::{AppState, Dialog};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        // ===== Encounter actions =====
        Action::EncounterSearch => {
            let token = state.tracker.issue();
            state.tick_count = 0;
            let mut effects = vec![Effect::FetchEncounter { token }];
            effects.extend(request_artwork(state));
            DispatchResult::changed_with_many(effects)
        }

        Action::EncounterDidLoad { token, encounter } => {
            if state.tracker.complete(token) {
                state.encounter = Some(encounter);
                state.last_lookup_error = None;
            }
            DispatchResult::changed_with_many(request_artwork(state))
        }

        Action::EncounterDidError { token, error } => {
            state.tracker.complete(token);
            state.last_lookup_error = Some(error);
            DispatchResult::changed()
        }

        Action::EncounterCapture => {
            if state.dialog.is_some() {
                return DispatchResult::unchanged();
            }
            let Some(encounter) = state.encounter.clone() else {
                return DispatchResult::unchanged();
            };
            let Some((Change::Captured(outcome), persist)) = commit(state, Edit::Capture(&encounter))
            else {
                return DispatchResult::unchanged();
            };
            state.dialog = Some(Dialog::Capture {
                message: outcome.message(),
                duplicate: outcome.is_duplicate(),
            });
            DispatchResult::changed_with(persist)
        }

        // ===== Artwork actions =====
        Action::ArtworkDidLoad { url, artwork } => {
            state.artwork_pending.remove(&url);
            state.artwork.insert(url, artwork);
            DispatchResult::changed()
        }

        Action::ArtworkDidError { url, .. } => {
            if state.artwork_pending.remove(&url) {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        // ===== Collection actions =====
        Action::CollectionSelect(index) => {
            if index < state.collection.len() && index != state.selected {
                state.selected = index;
                DispatchResult::changed_with_many(request_artwork(state))
            } else {
                DispatchResult::unchanged()
            }
        }

        // ===== Release actions =====
        Action::ReleaseOpen => {
            if state.dialog.is_some() || state.selected_entry().is_none() {
                return DispatchResult::unchanged();
            }
            state.dialog = Some(Dialog::Release {
                index: state.selected,
            });
            DispatchResult::changed()
        }

        Action::ReleaseConfirm => {
            let Some(Dialog::Release { index }) = state.dialog else {
                return DispatchResult::unchanged();
            };
            state.dialog = None;
            let Some((_, persist)) = commit(state, Edit::Release { index }) else {
                return DispatchResult::changed();
            };
            state.clamp_selection();
            let mut effects = vec![persist];
            effects.extend(request_artwork(state));
            DispatchResult::changed_with_many(effects)
        }

        // ===== Nickname actions =====
        Action::NicknameOpen => {
            if state.dialog.is_some() {
                return DispatchResult::unchanged();
            }
            let Some(entry) = state.selected_entry() else {
                return DispatchResult::unchanged();
            };
            state.dialog = Some(Dialog::Nickname {
                index: state.selected,
                draft: entry.nickname.clone().unwrap_or_default(),
            });
            DispatchResult::changed()
        }

        Action::NicknameChange(value) => match state.dialog.as_mut() {
            Some(Dialog::Nickname { draft, .. }) => {
                *draft = value;
                DispatchResult::changed()
            }
            _ => DispatchResult::unchanged(),
        },

        Action::NicknameSave => {
            let (index, draft) = match state.dialog.take() {
                Some(Dialog::Nickname { index, draft }) => (index, draft),
                other => {
                    state.dialog = other;
                    return DispatchResult::unchanged();
                }
            };
            let edit = Edit::Rename {
                index,
                nickname: &draft,
            };
            match commit(state, edit) {
                Some((_, persist)) => DispatchResult::changed_with(persist),
                None => DispatchResult::changed(),
            }
        }

        // ===== Dialog actions =====
        Action::DialogClose => {
            if state.dialog.take().is_some() {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        // ===== UI actions =====
        Action::UiTerminalResize(..) => DispatchResult::changed(),

        // ===== Global actions =====
        Action::Tick => {
            if state.is_searching() {
                state.tick_count = state.tick_count.wrapping_add(1);
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Quit => DispatchResult::unchanged(),
    }
}

/// Apply an edit to the Pokebank; a change comes back with its persist effect.
fn commit(state: &mut AppState, edit: Edit<'_>) -> Option<(Change, Effect)> {
    let change = state.collection.apply(edit)?;
    let persist = Effect::PersistCollection {
        collection: state.collection.clone(),
    };
    Some((change, persist))
}

/// Load effects for wanted artwork that is neither decoded nor on its way.
fn request_artwork(state: &mut AppState) -> Vec<Effect> {
    let missing: Vec<String> = state
        .wanted_artwork()
        .into_iter()
        .filter(|url| !state.artwork.contains_key(*url) && !state.artwork_pending.contains(*url))
        .map(str::to_string)
        .collect();
    missing
        .into_iter()
        .map(|url| {
            state.artwork_pending.insert(url.clone());
            Effect::LoadArtwork { url }
        })
        .collect()
}
