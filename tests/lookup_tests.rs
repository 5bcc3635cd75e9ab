//! Encounter lookups against a fake species provider

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use pokecatch::action::Action;
use pokecatch::api::{ImageSource, PokeApiClient, SpeciesLookup, SpeciesRecord};
use pokecatch::effect::{load_artwork, lookup_encounter};
use pokecatch::encounter::{fetch_encounter, EncounterRoll, RequestToken};
use pokecatch::reducer::reducer;
use pokecatch::state::AppState;
use pokecatch::error::LookupError;

#[derive(Default)]
struct FakeDex {
    records: HashMap<u16, SpeciesRecord>,
    images: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl FakeDex {
    fn with(mut self, record: SpeciesRecord) -> Self {
        self.records.insert(record.species_id, record);
        self
    }

    fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }
}

#[async_trait]
impl SpeciesLookup for FakeDex {
    async fn lookup(&self, species_id: u16) -> Result<SpeciesRecord, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.records
            .get(&species_id)
            .cloned()
            .ok_or_else(|| LookupError::Request(format!("404 for {species_id}")))
    }
}

#[async_trait]
impl ImageSource for FakeDex {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, LookupError> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| LookupError::Request(format!("404 for {url}")))
    }
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let image = image::DynamicImage::ImageRgba8(image::RgbaImage::new(width, height));
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn pikachu() -> SpeciesRecord {
    SpeciesRecord {
        species_id: 25,
        canonical_name: "pikachu".into(),
        display_name: "Pikachu".into(),
        standard_image_url: "https://img/25.png".into(),
        alternate_image_url: Some("https://img/shiny/25.png".into()),
    }
}

#[tokio::test]
async fn test_rare_roll_uses_alternate_art() {
    let dex = FakeDex::default().with(pikachu());

    let encounter = fetch_encounter(
        &dex,
        EncounterRoll {
            species_id: 25,
            rare: true,
        },
    )
    .await
    .unwrap();

    assert_eq!(encounter.image_url, "https://img/shiny/25.png");
    assert_eq!(encounter.standard_image_url, "https://img/25.png");
    assert!(encounter.is_rare_variant);
}

#[tokio::test]
async fn test_out_of_range_roll_skips_provider() {
    let dex = FakeDex::default().with(pikachu());

    let result = fetch_encounter(
        &dex,
        EncounterRoll {
            species_id: 152,
            rare: false,
        },
    )
    .await;

    assert!(matches!(result, Err(LookupError::OutOfRange(152))));
    assert_eq!(dex.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_lookup_action_carries_token() {
    let dex = FakeDex::default().with(pikachu());
    let roll = EncounterRoll {
        species_id: 25,
        rare: false,
    };

    let action = lookup_encounter(&dex, RequestToken(9), roll).await;

    match action {
        Action::EncounterDidLoad { token, encounter } => {
            assert_eq!(token, RequestToken(9));
            assert_eq!(encounter.display_name, "Pikachu");
            assert_eq!(encounter.image_url, "https://img/25.png");
        }
        other => panic!("unexpected action: {other:?}"),
    }
}

#[tokio::test]
async fn test_lookup_failure_becomes_error_action() {
    let dex = FakeDex::default();
    let roll = EncounterRoll {
        species_id: 1,
        rare: false,
    };

    let action = lookup_encounter(&dex, RequestToken(3), roll).await;

    assert_eq!(
        action,
        Action::EncounterDidError {
            token: RequestToken(3),
            error: "request failed: 404 for 1".into(),
        }
    );
}

/// Provider whose every request runs out of time.
struct StalledDex;

#[async_trait]
impl SpeciesLookup for StalledDex {
    async fn lookup(&self, _species_id: u16) -> Result<SpeciesRecord, LookupError> {
        Err(LookupError::Timeout(250))
    }
}

#[tokio::test]
async fn test_timeout_ends_the_search() {
    let mut state = AppState::default();
    let result = reducer(&mut state, Action::EncounterSearch);
    assert!(!result.effects.is_empty());
    assert!(state.is_searching());

    let roll = EncounterRoll {
        species_id: 25,
        rare: false,
    };
    let action = lookup_encounter(&StalledDex, RequestToken(1), roll).await;
    assert_eq!(
        action,
        Action::EncounterDidError {
            token: RequestToken(1),
            error: "request timed out after 250ms".into(),
        }
    );

    reducer(&mut state, action);
    assert!(!state.is_searching());
    assert_eq!(
        state.last_lookup_error.as_deref(),
        Some("request timed out after 250ms")
    );
}

fn behind_proxy() -> bool {
    ["http_proxy", "HTTP_PROXY", "all_proxy", "ALL_PROXY"]
        .iter()
        .any(|name| std::env::var_os(name).is_some())
}

#[tokio::test]
async fn test_silent_server_times_out() {
    if behind_proxy() {
        return;
    }
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // accept connections and never answer
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    let client = PokeApiClient::new(format!("http://{addr}"), "es")
        .with_timeout(Duration::from_millis(100));

    let result = tokio::time::timeout(Duration::from_secs(5), client.lookup(25))
        .await
        .expect("lookup should give up on its own");

    assert!(
        matches!(result, Err(LookupError::Timeout(100))),
        "unexpected result: {result:?}"
    );
    server.abort();
}

#[tokio::test]
async fn test_artwork_loads_and_shrinks() {
    let dex = FakeDex::default().with_image("https://img/25.png", png(475, 475));

    let action = load_artwork(&dex, "https://img/25.png".into()).await;

    match action {
        Action::ArtworkDidLoad { url, artwork } => {
            assert_eq!(url, "https://img/25.png");
            assert_eq!((artwork.width, artwork.height), (192, 192));
        }
        other => panic!("unexpected action: {other:?}"),
    }
}

#[tokio::test]
async fn test_artwork_errors_become_actions() {
    let dex = FakeDex::default().with_image("https://img/bad.png", b"not an image".to_vec());

    let missing = load_artwork(&dex, "https://img/1.png".into()).await;
    assert_eq!(
        missing,
        Action::ArtworkDidError {
            url: "https://img/1.png".into(),
            error: "request failed: 404 for https://img/1.png".into(),
        }
    );

    let garbage = load_artwork(&dex, "https://img/bad.png".into()).await;
    assert!(matches!(
        garbage,
        Action::ArtworkDidError { ref error, .. } if error.starts_with("artwork could not be decoded")
    ));
}
