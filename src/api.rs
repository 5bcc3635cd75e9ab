//! PokeAPI species lookup

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::error::LookupError;

pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Display data for one species.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SpeciesRecord {
    pub species_id: u16,
    pub canonical_name: String,
    pub display_name: String,
    pub standard_image_url: String,
    pub alternate_image_url: Option<String>,
}

#[async_trait]
pub trait SpeciesLookup: Send + Sync {
    async fn lookup(&self, species_id: u16) -> Result<SpeciesRecord, LookupError>;
}

/// Downloads image bytes for artwork URLs.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, LookupError>;
}

#[derive(Clone, Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Clone, Debug, Deserialize)]
struct PokemonResponse {
    id: u16,
    name: String,
    sprites: serde_json::Value,
}

#[derive(Clone, Debug, Deserialize)]
struct LocalizedName {
    name: String,
    language: NamedResource,
}

#[derive(Clone, Debug, Deserialize)]
struct SpeciesResponse {
    #[serde(default)]
    names: Vec<LocalizedName>,
}

/// HTTP client for PokeAPI with an optional on-disk response cache.
#[derive(Clone, Debug)]
pub struct PokeApiClient {
    base: String,
    language: String,
    cache_root: Option<PathBuf>,
    timeout: Duration,
    client: reqwest::Client,
}

impl PokeApiClient {
    pub fn new(base: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            language: language.into(),
            cache_root: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_cache(mut self, cache_root: Option<PathBuf>) -> Self {
        self.cache_root = cache_root;
        self
    }

    /// Upper bound for each request, connect through body.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch_json_cached<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, LookupError> {
        let bytes = self.fetch_bytes_cached(url).await?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(path) = self.cache_path(url) {
                    let _ = fs::remove_file(&path).await;
                }
                Err(LookupError::Parse(err.to_string()))
            }
        }
    }

    async fn fetch_bytes_cached(&self, url: &str) -> Result<Vec<u8>, LookupError> {
        let cache_path = self.cache_path(url);
        if let Some(path) = &cache_path {
            if let Some(bytes) = read_cache(path).await {
                tracing::debug!(url, "cache hit");
                return Ok(bytes);
            }
        }

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;
        let response = response.error_for_status()?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.request_error(e))?
            .to_vec();
        if let Some(path) = &cache_path {
            write_cache(path, &bytes).await;
        }
        Ok(bytes)
    }

    fn request_error(&self, err: reqwest::Error) -> LookupError {
        if err.is_timeout() {
            LookupError::Timeout(self.timeout.as_millis() as u64)
        } else {
            err.into()
        }
    }

    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        let root = self.cache_root.as_ref()?;
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Some(root.join("http").join(digest))
    }
}

#[async_trait]
impl SpeciesLookup for PokeApiClient {
    async fn lookup(&self, species_id: u16) -> Result<SpeciesRecord, LookupError> {
        let pokemon_url = format!("{}/pokemon/{species_id}", self.base);
        let species_url = format!("{}/pokemon-species/{species_id}", self.base);
        let (pokemon, species) = tokio::try_join!(
            self.fetch_json_cached::<PokemonResponse>(&pokemon_url),
            self.fetch_json_cached::<SpeciesResponse>(&species_url),
        )?;
        build_record(pokemon, species, &self.language)
    }
}

#[async_trait]
impl ImageSource for PokeApiClient {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, LookupError> {
        self.fetch_bytes_cached(url).await
    }
}

fn build_record(
    pokemon: PokemonResponse,
    species: SpeciesResponse,
    language: &str,
) -> Result<SpeciesRecord, LookupError> {
    let display_name = species
        .names
        .into_iter()
        .find(|n| n.language.name == language)
        .map(|n| n.name)
        .unwrap_or_else(|| capitalize(&pokemon.name));

    let standard_image_url = pointer_string(&pokemon.sprites, "/other/official-artwork/front_default")
        .or_else(|| pointer_string(&pokemon.sprites, "/front_default"))
        .ok_or(LookupError::MissingSprite(pokemon.id))?;
    let alternate_image_url = pointer_string(&pokemon.sprites, "/other/official-artwork/front_shiny")
        .or_else(|| pointer_string(&pokemon.sprites, "/front_shiny"));

    Ok(SpeciesRecord {
        species_id: pokemon.id,
        canonical_name: pokemon.name,
        display_name,
        standard_image_url,
        alternate_image_url,
    })
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn pointer_string(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|val| val.as_str())
        .map(|s| s.to_string())
}

async fn read_cache(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).await.ok()
}

async fn write_cache(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent).await;
    }
    let _ = fs::write(path, bytes).await;
}
