//! Error types for lookups and the storage slot

use thiserror::Error;

/// Failure while resolving a species from the remote provider.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("species id {0} is outside the Gen 1 range")]
    OutOfRange(u16),
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timed out after {0}ms")]
    Timeout(u64),
    #[error("response parse error: {0}")]
    Parse(String),
    #[error("species {0} has no usable sprite")]
    MissingSprite(u16),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::Request(err.to_string())
    }
}

/// Failure while reading or writing the persisted collection.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage slot is poisoned")]
    Poisoned,
}

/// Failure while turning downloaded bytes into displayable artwork.
#[derive(Error, Debug)]
pub enum ArtworkError {
    #[error("artwork could not be decoded: {0}")]
    Image(#[from] image::ImageError),
}
