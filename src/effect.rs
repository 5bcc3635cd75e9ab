//! Effects - side effects declared by the reducer, and how they run

use crate::action::Action;
use crate::api::{ImageSource, SpeciesLookup};
use crate::artwork::Artwork;
use crate::collection::Collection;
use crate::encounter::{self, EncounterRoll, RequestToken};
use crate::storage::{self, Storage};

#[derive(Debug, Clone)]
pub enum Effect {
    /// Roll a species and look it up
    FetchEncounter { token: RequestToken },
    /// Write the collection to the storage slot
    PersistCollection { collection: Collection },
    /// Download and decode the image at `url`
    LoadArtwork { url: String },
}

/// Look up a rolled encounter and turn the outcome into an action.
pub async fn lookup_encounter(
    lookup: &dyn SpeciesLookup,
    token: RequestToken,
    roll: EncounterRoll,
) -> Action {
    tracing::debug!(%token, species_id = roll.species_id, rare = roll.rare, "looking up encounter");
    match encounter::fetch_encounter(lookup, roll).await {
        Ok(encounter) => Action::EncounterDidLoad { token, encounter },
        Err(e) => {
            tracing::warn!(%token, species_id = roll.species_id, error = %e, "encounter lookup failed");
            Action::EncounterDidError {
                token,
                error: e.to_string(),
            }
        }
    }
}

/// Fetch artwork through the response cache and decode it off the UI loop.
pub async fn load_artwork(source: &dyn ImageSource, url: String) -> Action {
    let result = match source.fetch_image(&url).await {
        Ok(bytes) => Artwork::decode(&bytes).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    match result {
        Ok(artwork) => Action::ArtworkDidLoad { url, artwork },
        Err(error) => {
            tracing::warn!(%url, %error, "artwork unavailable");
            Action::ArtworkDidError { url, error }
        }
    }
}

/// Synchronous write; failures are logged and dropped.
pub fn persist_collection(storage: &dyn Storage, collection: &Collection) {
    match storage::persist(storage, collection) {
        Ok(()) => tracing::debug!(total = collection.count_total(), "pokebank saved"),
        Err(e) => tracing::error!(error = %e, "failed to save pokebank"),
    }
}
