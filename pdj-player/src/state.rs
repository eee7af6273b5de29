//! Shared player state
//!
//! Thread-safe state shared between the transport, the playback engine and
//! the HTTP handlers, owned by the top-level controller and passed by
//! reference rather than read from ambient scope.

use pdj_common::events::{PlayerEvent, TransportState};
use pdj_common::playlist::PlaylistTrack;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, RwLock};

use crate::services::auth::AccessToken;

/// Information about the clip a session is currently rendering
#[derive(Debug, Clone)]
pub struct CurrentClip {
    /// Index into the sequencer
    pub index: usize,
    /// Asset reference of the playing clip
    pub asset_ref: String,
    /// Current position in milliseconds
    pub position_ms: u64,
    /// Clip duration in milliseconds
    pub duration_ms: u64,
}

/// Editable playlist draft: catalog metadata alongside the clip windows.
/// Entry `i` always describes the sequencer's clip `i`.
#[derive(Debug, Clone, Default)]
pub struct PlaylistDraft {
    pub name: String,
    pub tracks: Vec<PlaylistTrack>,
}

/// Shared state accessible by all components
pub struct SharedState {
    /// Current transport state
    pub transport_state: RwLock<TransportState>,

    /// Clip being rendered (None when no session)
    pub current_clip: RwLock<Option<CurrentClip>>,

    /// Editable playlist draft mirrored by the sequencer
    pub playlist: RwLock<PlaylistDraft>,

    /// Master volume (0.0-1.0); std mutex so the audio callback can read it
    pub volume: Arc<Mutex<f32>>,

    /// Bearer token for the remote service (handed in by the integrator
    /// after the external redirect flow)
    pub access_token: RwLock<Option<AccessToken>>,

    /// Event broadcaster for SSE and the transport's completion listener
    pub event_tx: broadcast::Sender<PlayerEvent>,
}

impl SharedState {
    /// Create new shared state with default values
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            transport_state: RwLock::new(TransportState::Stopped),
            current_clip: RwLock::new(None),
            playlist: RwLock::new(PlaylistDraft::default()),
            volume: Arc::new(Mutex::new(0.75)),
            access_token: RwLock::new(None),
            event_tx,
        }
    }

    /// Broadcast an event to all listeners (no receivers is fine)
    pub fn broadcast_event(&self, event: PlayerEvent) {
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to the event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.event_tx.subscribe()
    }

    pub async fn get_transport_state(&self) -> TransportState {
        *self.transport_state.read().await
    }

    /// Set transport state, broadcasting the change when it differs
    pub async fn set_transport_state(&self, state: TransportState) {
        let mut guard = self.transport_state.write().await;
        if *guard != state {
            *guard = state;
            self.broadcast_event(PlayerEvent::TransportStateChanged {
                state,
                timestamp: chrono::Utc::now(),
            });
        }
    }

    pub async fn get_current_clip(&self) -> Option<CurrentClip> {
        self.current_clip.read().await.clone()
    }

    pub async fn set_current_clip(&self, clip: Option<CurrentClip>) {
        *self.current_clip.write().await = clip;
    }

    /// Get master volume (0.0-1.0)
    pub fn get_volume(&self) -> f32 {
        self.volume.lock().map(|v| *v).unwrap_or(1.0)
    }

    /// Set master volume, clamped to 0.0-1.0, broadcasting the change
    pub fn set_volume(&self, volume: f32) {
        let clamped = volume.clamp(0.0, 1.0);
        if let Ok(mut guard) = self.volume.lock() {
            *guard = clamped;
        }
        self.broadcast_event(PlayerEvent::VolumeChanged {
            volume: clamped,
            timestamp: chrono::Utc::now(),
        });
    }

    pub async fn get_access_token(&self) -> Option<AccessToken> {
        self.access_token.read().await.clone()
    }

    pub async fn set_access_token(&self, token: Option<AccessToken>) {
        *self.access_token.write().await = token;
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
