//! Event types for the PDJ event system
//!
//! Events are broadcast on a tokio channel by the player and streamed to
//! clients over SSE. The transport and the playback engine communicate
//! through these named events rather than ad hoc callback wiring, so the
//! legal transitions are testable without any UI attached.

use serde::{Deserialize, Serialize};

/// Transport states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    /// No session, nothing scheduled
    Stopped,
    /// A playback session is active
    Playing,
    /// Session torn down, position in the sequence retained
    Paused,
}

/// PDJ event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// Transport state changed (stopped/playing/paused)
    TransportStateChanged {
        state: TransportState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A clip's playback session started
    ClipStarted {
        index: usize,
        asset_ref: String,
        duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A clip's playback session ended
    ///
    /// `completed` is true when the clip reached its end offset, false when
    /// the session was stopped explicitly (pause, skip, shutdown). Fired
    /// exactly once per session.
    ClipCompleted {
        index: usize,
        completed: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playback progress tick (fixed cadence while a session plays)
    PlaybackProgress {
        index: usize,
        /// min(elapsed / duration, 1.0)
        elapsed_fraction: f64,
        position_ms: u64,
        duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playlist contents changed (append/remove/replace/clear)
    PlaylistChanged {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Master volume changed
    VolumeChanged {
        volume: f32,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Playlist published to the remote service and persisted locally
    PlaylistPublished {
        playlist_id: String,
        name: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayerEvent {
    /// Event type name, used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayerEvent::TransportStateChanged { .. } => "TransportStateChanged",
            PlayerEvent::ClipStarted { .. } => "ClipStarted",
            PlayerEvent::ClipCompleted { .. } => "ClipCompleted",
            PlayerEvent::PlaybackProgress { .. } => "PlaybackProgress",
            PlayerEvent::PlaylistChanged { .. } => "PlaylistChanged",
            PlayerEvent::VolumeChanged { .. } => "VolumeChanged",
            PlayerEvent::PlaylistPublished { .. } => "PlaylistPublished",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = PlayerEvent::ClipCompleted {
            index: 3,
            completed: true,
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ClipCompleted");
        assert_eq!(json["index"], 3);
        assert_eq!(json["completed"], true);
    }

    #[test]
    fn test_event_type_matches_variant() {
        let event = PlayerEvent::PlaybackProgress {
            index: 0,
            elapsed_fraction: 0.5,
            position_ms: 5000,
            duration_ms: 10000,
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(event.event_type(), "PlaybackProgress");
    }
}
