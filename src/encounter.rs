//! Wild encounters: random species selection and request tokens

use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::api::{SpeciesLookup, SpeciesRecord};
use crate::error::LookupError;

pub const FIRST_SPECIES_ID: u16 = 1;
pub const LAST_SPECIES_ID: u16 = 151;

/// One in `RARE_ODDS` encounters is a rare variant.
pub const RARE_ODDS: u32 = 5;

pub fn is_known_species(species_id: u16) -> bool {
    (FIRST_SPECIES_ID..=LAST_SPECIES_ID).contains(&species_id)
}

/// The creature currently on display, not yet captured.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Encounter {
    pub species_id: u16,
    pub canonical_name: String,
    pub display_name: String,
    pub standard_image_url: String,
    pub image_url: String,
    pub is_rare_variant: bool,
}

impl Encounter {
    /// Rare encounters show the alternate artwork when the species has one.
    pub fn from_record(record: SpeciesRecord, rare: bool) -> Self {
        let image_url = if rare {
            record
                .alternate_image_url
                .unwrap_or_else(|| record.standard_image_url.clone())
        } else {
            record.standard_image_url.clone()
        };
        Self {
            species_id: record.species_id,
            canonical_name: record.canonical_name,
            display_name: record.display_name,
            standard_image_url: record.standard_image_url,
            image_url,
            is_rare_variant: rare,
        }
    }
}

/// The random part of an encounter, decided before the lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EncounterRoll {
    pub species_id: u16,
    pub rare: bool,
}

pub struct EncounterGenerator<R: Rng> {
    rng: R,
}

impl<R: Rng> EncounterGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn roll(&mut self) -> EncounterRoll {
        EncounterRoll {
            species_id: self.rng.gen_range(FIRST_SPECIES_ID..=LAST_SPECIES_ID),
            rare: self.rng.gen_ratio(1, RARE_ODDS),
        }
    }
}

/// Resolve a roll into a displayable encounter.
pub async fn fetch_encounter(
    lookup: &dyn SpeciesLookup,
    roll: EncounterRoll,
) -> Result<Encounter, LookupError> {
    if !is_known_species(roll.species_id) {
        return Err(LookupError::OutOfRange(roll.species_id));
    }
    let record = lookup.lookup(roll.species_id).await?;
    Ok(Encounter::from_record(record, roll.rare))
}

/// Identifies one search request.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub struct RequestToken(pub u64);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What to do with a lookup that completes after a newer one was issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum StalePolicy {
    /// Late completions still replace the current encounter.
    #[default]
    Apply,
    Discard,
}

/// Issues tokens and judges completions against the latest one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EncounterTracker {
    latest: Option<RequestToken>,
    pending: bool,
    pub policy: StalePolicy,
}

impl EncounterTracker {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn issue(&mut self) -> RequestToken {
        let next = self.latest.map_or(1, |t| t.0 + 1);
        let token = RequestToken(next);
        self.latest = Some(token);
        self.pending = true;
        token
    }

    pub fn latest(&self) -> Option<RequestToken> {
        self.latest
    }

    /// True until the latest request completes.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn is_stale(&self, token: RequestToken) -> bool {
        self.latest.is_some_and(|latest| token < latest)
    }

    /// Record a completion; returns whether its result should be applied.
    pub fn complete(&mut self, token: RequestToken) -> bool {
        if self.latest == Some(token) {
            self.pending = false;
            return true;
        }
        match self.policy {
            StalePolicy::Apply => true,
            StalePolicy::Discard => !self.is_stale(token),
        }
    }
}
