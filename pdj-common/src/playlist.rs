//! Playlist document model
//!
//! The shape written to the local store and to exported files. Field naming
//! is stable and camelCase on the wire; round-tripping a document through
//! JSON must preserve every field exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One track in a persisted playlist: catalog metadata plus the clip window
/// and fade lengths the user committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistTrack {
    pub title: String,
    pub artist: String,
    /// Track identifier on the remote service
    pub uri: String,
    /// Playable preview asset; the clip's asset reference
    pub preview_url: String,
    /// Clip window start, seconds into the asset
    pub start_time: f64,
    /// Clip window end, seconds into the asset
    pub end_time: f64,
    /// Fade-in length in seconds
    pub fade_in: f64,
    /// Fade-out length in seconds
    pub fade_out: f64,
    pub album_art: Option<String>,
}

/// Persisted/exported playlist document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDocument {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub tracks: Vec<PlaylistTrack>,
}

impl PlaylistDocument {
    /// File name for an exported document: whitespace in the playlist name
    /// collapses to underscores, suffixed `_playlist.json`.
    pub fn export_file_name(&self) -> String {
        let safe: String = self
            .name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        format!("{}_playlist.json", safe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_track() -> PlaylistTrack {
        PlaylistTrack {
            title: "Train".to_string(),
            artist: "4 Non Blondes".to_string(),
            uri: "catalog:track:3cfOd4CMv2snFaKAnMdnvK".to_string(),
            preview_url: "https://cdn.example.com/preview/3cfOd4.mp3".to_string(),
            start_time: 12.5,
            end_time: 41.0,
            fade_in: 2.0,
            fade_out: 3.5,
            album_art: Some("https://cdn.example.com/art/3cfOd4.jpg".to_string()),
        }
    }

    #[test]
    fn test_wire_field_names_are_camel_case() {
        let doc = PlaylistDocument {
            name: "Road Trip".to_string(),
            created_at: Utc::now(),
            tracks: vec![sample_track()],
        };

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("createdAt").is_some());

        let track = &json["tracks"][0];
        for key in [
            "title", "artist", "uri", "previewUrl", "startTime", "endTime", "fadeIn", "fadeOut",
            "albumArt",
        ] {
            assert!(track.get(key).is_some(), "missing wire field {}", key);
        }
    }

    #[test]
    fn test_document_round_trip() {
        let doc = PlaylistDocument {
            name: "Road Trip".to_string(),
            created_at: "2026-08-07T12:00:00Z".parse().unwrap(),
            tracks: vec![sample_track()],
        };

        let json = serde_json::to_string(&doc).unwrap();
        let back: PlaylistDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_export_file_name_collapses_whitespace() {
        let doc = PlaylistDocument {
            name: "My  Custom Playlist".to_string(),
            created_at: Utc::now(),
            tracks: vec![],
        };
        assert_eq!(doc.export_file_name(), "My_Custom_Playlist_playlist.json");
    }
}
