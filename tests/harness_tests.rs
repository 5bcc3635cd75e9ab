//! Store flows using EffectStoreTestHarness
//!
//! Dispatch user intents, simulate async lookups completing, and check both
//! state and declared effects.

use tui_dispatch::testing::*;
use tui_dispatch::EffectStore;

use pokecatch::{
    action::Action,
    collection::RARE_MARKER,
    effect::Effect,
    encounter::{Encounter, RequestToken, StalePolicy},
    reducer::reducer,
    state::{AppState, Dialog},
    storage::{self, MemoryStorage},
};

fn wild(species_id: u16, name: &str, rare: bool) -> Encounter {
    Encounter {
        species_id,
        canonical_name: name.to_lowercase(),
        display_name: name.to_string(),
        standard_image_url: format!("https://img/{species_id}.png"),
        image_url: format!("https://img/{species_id}.png"),
        is_rare_variant: rare,
    }
}

fn loaded(token: u64, encounter: Encounter) -> Action {
    Action::EncounterDidLoad {
        token: RequestToken(token),
        encounter,
    }
}

fn capture_message(state: &AppState) -> Option<String> {
    match &state.dialog {
        Some(Dialog::Capture { message, .. }) => Some(message.clone()),
        _ => None,
    }
}

// ============================================================================
// Encounters
// ============================================================================

#[test]
fn test_search_then_load() {
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);

    harness.dispatch_collect(Action::EncounterSearch);
    harness.assert_state(|s| s.is_searching());

    let effects = harness.drain_effects();
    effects.effects_count(1);
    effects.effects_first_matches(|e| {
        matches!(e, Effect::FetchEncounter { token } if *token == RequestToken(1))
    });

    harness.complete_action(loaded(1, wild(25, "Pikachu", false)));
    let (changed, total) = harness.process_emitted();
    assert_eq!((changed, total), (1, 1));

    harness.assert_state(|s| !s.is_searching());
    harness.assert_state(|s| s.encounter.as_ref().map(|e| e.species_id) == Some(25));
}

#[test]
fn test_late_completion_applies_by_default() {
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);

    harness.dispatch_collect(Action::EncounterSearch);
    harness.dispatch_collect(Action::EncounterSearch);

    harness.complete_action(loaded(2, wild(7, "Squirtle", false)));
    harness.complete_action(loaded(1, wild(1, "Bulbasaur", false)));
    harness.process_emitted();

    // the older response arrived last and wins
    harness.assert_state(|s| s.encounter.as_ref().map(|e| e.species_id) == Some(1));
    harness.assert_state(|s| !s.is_searching());
}

#[test]
fn test_late_completion_discarded_when_configured() {
    let state = AppState::new(Default::default(), StalePolicy::Discard);
    let mut harness = EffectStoreTestHarness::new(state, reducer);

    harness.dispatch_collect(Action::EncounterSearch);
    harness.dispatch_collect(Action::EncounterSearch);

    harness.complete_action(loaded(2, wild(7, "Squirtle", false)));
    harness.complete_action(loaded(1, wild(1, "Bulbasaur", false)));
    harness.process_emitted();

    harness.assert_state(|s| s.encounter.as_ref().map(|e| e.species_id) == Some(7));
}

#[test]
fn test_lookup_failure_keeps_previous_encounter() {
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);

    harness.dispatch_collect(Action::EncounterSearch);
    harness.complete_action(loaded(1, wild(4, "Charmander", false)));
    harness.process_emitted();

    harness.dispatch_collect(Action::EncounterSearch);
    harness.complete_action(Action::EncounterDidError {
        token: RequestToken(2),
        error: "connection reset".into(),
    });
    harness.process_emitted();

    harness.assert_state(|s| s.encounter.as_ref().map(|e| e.species_id) == Some(4));
    harness.assert_state(|s| s.last_lookup_error.as_deref() == Some("connection reset"));
    // no dialog for lookup failures
    harness.assert_state(|s| s.dialog.is_none());
}

// ============================================================================
// Capture
// ============================================================================

#[test]
fn test_capture_duplicate_bulbasaur() {
    let mut harness = EffectStoreTestHarness::new(AppState::default(), reducer);
    harness.dispatch_collect(Action::EncounterSearch);
    harness.complete_action(loaded(1, wild(1, "Bulbasaur", false)));
    harness.process_emitted();

    harness.dispatch_collect(Action::EncounterCapture);
    harness.dispatch_collect(Action::DialogClose);
    harness.drain_effects();

    harness.dispatch_collect(Action::EncounterCapture);

    harness.assert_state(|s| s.collection.len() == 1);
    harness.assert_state(|s| {
        capture_message(s).is_some_and(|m| m.contains("already have Bulbasaur"))
    });
    let effects = harness.drain_effects();
    effects.effects_count(1);
    effects.effects_all_match(|e| matches!(e, Effect::PersistCollection { .. }));
}

#[test]
fn test_capture_rare_pikachu() {
    let state = AppState {
        encounter: Some(wild(25, "Pikachu", true)),
        ..Default::default()
    };
    let mut harness = EffectStoreTestHarness::new(state, reducer);

    harness.dispatch_collect(Action::EncounterCapture);

    harness.assert_state(|s| {
        let entry = &s.collection.entries()[0];
        s.collection.len() == 1
            && entry.species_id == 25
            && entry.is_rare_variant
            && entry.nickname.is_none()
    });
    harness.assert_state(|s| {
        capture_message(s).is_some_and(|m| m.contains("Pikachu") && m.contains(RARE_MARKER))
    });
    harness.assert_state(|s| s.collection.count_rare() == 1);
}

#[test]
fn test_capture_blocked_while_dialog_open() {
    let state = AppState {
        encounter: Some(wild(25, "Pikachu", false)),
        ..Default::default()
    };
    let mut harness = EffectStoreTestHarness::new(state, reducer);

    harness.dispatch_collect(Action::EncounterCapture);
    harness.drain_effects();
    let results = harness.dispatch_all([Action::EncounterCapture]);

    assert_eq!(results, vec![false]);
    harness.drain_effects().effects_empty();
}

// ============================================================================
// Rename and release
// ============================================================================

fn state_with_three() -> AppState {
    let mut state = AppState::default();
    for (id, name) in [(1, "Bulbasaur"), (4, "Charmander"), (7, "Squirtle")] {
        state.collection.capture(&wild(id, name, false));
    }
    state
}

#[test]
fn test_nickname_flow() {
    let mut harness = EffectStoreTestHarness::new(state_with_three(), reducer);

    harness.dispatch_collect(Action::CollectionSelect(1));
    harness.drain_effects();
    harness.dispatch_collect(Action::NicknameOpen);
    harness.assert_state(|s| {
        matches!(&s.dialog, Some(Dialog::Nickname { index: 1, draft }) if draft.is_empty())
    });

    harness.dispatch_collect(Action::NicknameChange("  Flamita ".into()));
    harness.dispatch_collect(Action::NicknameSave);

    harness.assert_state(|s| s.dialog.is_none());
    harness.assert_state(|s| s.collection.entries()[1].nickname.as_deref() == Some("Flamita"));
    let effects = harness.drain_effects();
    effects.effects_count(1);

    // reopening starts from the saved nickname; blank clears it
    harness.dispatch_collect(Action::NicknameOpen);
    harness.assert_state(|s| {
        matches!(&s.dialog, Some(Dialog::Nickname { draft, .. }) if draft == "Flamita")
    });
    harness.dispatch_collect(Action::NicknameChange("   ".into()));
    harness.dispatch_collect(Action::NicknameSave);
    harness.assert_state(|s| s.collection.entries()[1].nickname.is_none());
}

#[test]
fn test_nickname_cancel_keeps_old_value() {
    let mut harness = EffectStoreTestHarness::new(state_with_three(), reducer);

    harness.dispatch_collect(Action::NicknameOpen);
    harness.dispatch_collect(Action::NicknameChange("Bulby".into()));
    harness.dispatch_collect(Action::DialogClose);

    harness.assert_state(|s| s.collection.entries()[0].nickname.is_none());
    harness.drain_effects().effects_empty();
}

#[test]
fn test_release_middle() {
    let mut harness = EffectStoreTestHarness::new(state_with_three(), reducer);

    harness.dispatch_collect(Action::CollectionSelect(1));
    harness.drain_effects();
    harness.dispatch_collect(Action::ReleaseOpen);
    harness.assert_state(|s| matches!(s.dialog, Some(Dialog::Release { index: 1 })));
    harness.dispatch_collect(Action::ReleaseConfirm);

    harness.assert_state(|s| {
        let ids: Vec<u16> = s.collection.entries().iter().map(|e| e.species_id).collect();
        ids == vec![1, 7]
    });
    harness.assert_state(|s| s.selected == 1);
    let effects = harness.drain_effects();
    // persist, then the art for Squirtle which is now highlighted
    effects.effects_count(2);
    effects.effects_first_matches(
        |e| matches!(e, Effect::PersistCollection { collection } if collection.len() == 2),
    );
    effects.effects_any_matches(|e| matches!(e, Effect::LoadArtwork { url } if url == "https://img/7.png"));
}

#[test]
fn test_release_cancel() {
    let mut harness = EffectStoreTestHarness::new(state_with_three(), reducer);

    harness.dispatch_collect(Action::ReleaseOpen);
    harness.dispatch_collect(Action::DialogClose);
    let results = harness.dispatch_all([Action::ReleaseConfirm]);

    assert_eq!(results, vec![false]);
    harness.assert_state(|s| s.collection.len() == 3);
    harness.drain_effects().effects_empty();
}

// ============================================================================
// Persistence effect carries exactly what restore reads back
// ============================================================================

#[test]
fn test_persist_effect_restores_equal() {
    let mut store = EffectStore::new(state_with_three(), reducer);
    store.dispatch(Action::NicknameOpen);
    store.dispatch(Action::NicknameChange("Bulby".into()));
    let result = store.dispatch(Action::NicknameSave);

    let Some(Effect::PersistCollection { collection }) = result.effects.into_iter().next() else {
        panic!("expected a persist effect");
    };
    let slot = MemoryStorage::new();
    pokecatch::effect::persist_collection(&slot, &collection);

    assert_eq!(storage::restore(&slot), store.state().collection);
}
