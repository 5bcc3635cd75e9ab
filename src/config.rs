//! Command-line configuration

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use crate::api::{PokeApiClient, DEFAULT_API_BASE, DEFAULT_TIMEOUT_MS};
use crate::encounter::StalePolicy;
use crate::storage::FileStorage;

const APP_DIR: &str = "pokecatch";
const SAVE_FILE: &str = "pokebanco_gen1.json";
const LOG_FILE: &str = "pokecatch.log";

#[derive(Args, Clone, Debug)]
pub struct Config {
    /// Pokebank file (defaults to the user data directory)
    #[arg(long, value_name = "PATH")]
    pub save_file: Option<PathBuf>,

    /// Language code used for Pokemon names
    #[arg(long, default_value = "es")]
    pub language: String,

    /// PokeAPI base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Directory for cached API responses
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Do not cache API responses on disk
    #[arg(long)]
    pub no_cache: bool,

    /// Give up on a PokeAPI request after this many milliseconds
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Do not draw Pokemon images (for terminals without kitty graphics)
    #[arg(long)]
    pub no_artwork: bool,

    /// Ignore encounters that arrive after a newer search was started
    #[arg(long)]
    pub discard_stale: bool,

    /// Log file (defaults to a file next to the Pokebank)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

fn data_dir() -> PathBuf {
    dirs_next::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    pub fn save_path(&self) -> PathBuf {
        self.save_file
            .clone()
            .unwrap_or_else(|| data_dir().join(SAVE_FILE))
    }

    pub fn log_path(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        match self.save_path().parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.join(LOG_FILE),
            _ => PathBuf::from(LOG_FILE),
        }
    }

    pub fn cache_root(&self) -> Option<PathBuf> {
        if self.no_cache {
            return None;
        }
        let root = self.cache_dir.clone().unwrap_or_else(|| {
            dirs_next::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
        });
        Some(root)
    }

    pub fn show_artwork(&self) -> bool {
        !self.no_artwork
    }

    pub fn stale_policy(&self) -> StalePolicy {
        if self.discard_stale {
            StalePolicy::Discard
        } else {
            StalePolicy::Apply
        }
    }

    pub fn storage(&self) -> FileStorage {
        FileStorage::new(self.save_path())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn lookup_client(&self) -> PokeApiClient {
        PokeApiClient::new(&self.api_base, &self.language)
            .with_cache(self.cache_root())
            .with_timeout(self.request_timeout())
    }
}
