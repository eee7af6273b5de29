//! Catalog/search API client
//!
//! Searches the remote music catalog for tracks. Responses carry a preview
//! asset URL per track; a track without one cannot become a clip
//! ([`crate::error::Error::MissingPreview`] at clip-creation time).

use crate::error::{Error, Result};
use crate::services::auth::AccessToken;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};
use tracing::debug;

/// Minimum interval between catalog requests
const REQUEST_PACING_MS: u64 = 250;

/// Track record as the core consumes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album_art_url: Option<String>,
    /// Playable preview asset; None means the track cannot be clipped
    pub preview_url: Option<String>,
    pub duration_seconds: f64,
    /// Track identifier used when publishing playlists
    pub uri: String,
}

impl TrackRecord {
    /// Display string for the artist line
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

// ============================================================================
// Wire types (catalog API response shape)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    items: Vec<WireTrack>,
}

#[derive(Debug, Deserialize)]
struct WireTrack {
    id: String,
    name: String,
    uri: String,
    preview_url: Option<String>,
    duration_ms: u64,
    artists: Vec<WireArtist>,
    album: WireAlbum,
}

#[derive(Debug, Deserialize)]
struct WireArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WireAlbum {
    #[serde(default)]
    images: Vec<WireImage>,
}

#[derive(Debug, Deserialize)]
struct WireImage {
    url: String,
}

impl From<WireTrack> for TrackRecord {
    fn from(track: WireTrack) -> Self {
        TrackRecord {
            id: track.id,
            title: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album_art_url: track.album.images.into_iter().next().map(|i| i.url),
            preview_url: track.preview_url,
            duration_seconds: track.duration_ms as f64 / 1000.0,
            uri: track.uri,
        }
    }
}

/// Paces requests so repeated searches (e.g. type-ahead) don't hammer the
/// remote service
struct RequestPacer {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RequestPacer {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                debug!("pacing catalog request: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Catalog API client
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    pacer: RequestPacer,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            pacer: RequestPacer::new(REQUEST_PACING_MS),
        }
    }

    /// Search the catalog for tracks matching `query`.
    pub async fn search(
        &self,
        token: &AccessToken,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TrackRecord>> {
        self.pacer.wait().await;

        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let limit = limit.to_string();
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, token.bearer())
            .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::NetworkFailure(format!(
                "catalog search returned {}: {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::NetworkFailure(format!("malformed search response: {}", e)))?;

        debug!("search '{}' returned {} tracks", query, parsed.tracks.items.len());
        Ok(parsed.tracks.items.into_iter().map(TrackRecord::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_track_maps_to_record() {
        let json = r#"{
            "tracks": {
                "items": [{
                    "id": "3cfOd4",
                    "name": "Train",
                    "uri": "catalog:track:3cfOd4",
                    "preview_url": "https://cdn.example.com/p/3cfOd4.mp3",
                    "duration_ms": 242000,
                    "artists": [{"name": "4 Non Blondes"}],
                    "album": {"images": [{"url": "https://cdn.example.com/a/1.jpg"},
                                          {"url": "https://cdn.example.com/a/2.jpg"}]}
                }]
            }
        }"#;

        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let record: TrackRecord = parsed.tracks.items.into_iter().next().unwrap().into();

        assert_eq!(record.id, "3cfOd4");
        assert_eq!(record.title, "Train");
        assert_eq!(record.artists, vec!["4 Non Blondes"]);
        assert_eq!(record.artist_line(), "4 Non Blondes");
        // First (largest) image wins
        assert_eq!(
            record.album_art_url.as_deref(),
            Some("https://cdn.example.com/a/1.jpg")
        );
        assert!((record.duration_seconds - 242.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_preview_and_art_survive_parsing() {
        let json = r#"{
            "tracks": {
                "items": [{
                    "id": "x",
                    "name": "No Preview",
                    "uri": "catalog:track:x",
                    "preview_url": null,
                    "duration_ms": 1000,
                    "artists": [],
                    "album": {}
                }]
            }
        }"#;

        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        let record: TrackRecord = parsed.tracks.items.into_iter().next().unwrap().into();
        assert!(record.preview_url.is_none());
        assert!(record.album_art_url.is_none());
    }

    #[tokio::test]
    async fn test_request_pacer_enforces_interval() {
        tokio::time::pause();
        let pacer = RequestPacer::new(100);

        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
