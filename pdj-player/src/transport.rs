//! Transport controller
//!
//! Binds the sequencer and the playback engine into the play/pause/next/
//! previous control surface. Transitions are explicit: operations check the
//! transport state up front and invalid transitions are errors, so the
//! state machine is testable without any UI attached.
//!
//! On natural clip completion the transport behaves as if `next()` was
//! called (continuous playlist playback). Whether a full pass wraps back to
//! the first clip or stops is the integrator's `loop_playlist` policy.

use crate::clip::ClipSpec;
use crate::error::{Error, Result};
use crate::playback::PlaybackEngine;
use crate::sequencer::{Direction, PlaylistSequencer};
use crate::services::assets::AssetProvider;
use crate::state::SharedState;
use pdj_common::events::{PlayerEvent, TransportState};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Transport state machine over one sequencer and one engine.
pub struct TransportController<P: AssetProvider> {
    state: Arc<SharedState>,
    engine: PlaybackEngine,
    sequencer: RwLock<PlaylistSequencer>,
    provider: P,
    loop_playlist: bool,
}

impl<P: AssetProvider> TransportController<P> {
    pub fn new(
        state: Arc<SharedState>,
        engine: PlaybackEngine,
        provider: P,
        loop_playlist: bool,
    ) -> Self {
        Self {
            state,
            engine,
            sequencer: RwLock::new(PlaylistSequencer::new()),
            provider,
            loop_playlist,
        }
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Start playback.
    ///
    /// With `index`, selects and plays that clip. Without it: from Stopped,
    /// plays the current selection (or clip 0 when nothing is selected);
    /// from Paused, resumes; while Playing it is a no-op.
    pub async fn play(&self, index: Option<usize>) -> Result<()> {
        let transport = self.state.get_transport_state().await;
        if index.is_none() {
            match transport {
                TransportState::Playing => return Ok(()),
                TransportState::Paused => return self.resume().await,
                TransportState::Stopped => {}
            }
        }

        let (clip_index, clip) = {
            let mut seq = self.sequencer.write().await;
            if seq.is_empty() {
                self.state.set_transport_state(TransportState::Stopped).await;
                return Err(Error::EmptyPlaylist);
            }
            let i = index.or(seq.current_index()).unwrap_or(0);
            let clip = seq.select(i)?.clone();
            (i, clip)
        };

        self.start_session(clip_index, clip).await
    }

    /// Pause playback. Valid only while Playing; tears the session down
    /// without advancing the sequencer.
    pub async fn pause(&self) -> Result<()> {
        if self.state.get_transport_state().await != TransportState::Playing {
            return Err(Error::InvalidState("pause is only valid while playing".to_string()));
        }

        self.engine.pause().await;
        self.state.set_transport_state(TransportState::Paused).await;
        info!("paused");
        Ok(())
    }

    /// Resume from pause. Replays the current clip from its own start
    /// offset; there is no mid-clip resume.
    pub async fn resume(&self) -> Result<()> {
        if self.state.get_transport_state().await != TransportState::Paused {
            return Err(Error::InvalidState("resume is only valid while paused".to_string()));
        }

        let (index, clip) = {
            let seq = self.sequencer.read().await;
            let current = seq
                .current_index()
                .zip(seq.current().cloned())
                .ok_or_else(|| Error::InvalidState("paused with no selected clip".to_string()))?;
            current
        };

        self.start_session(index, clip).await
    }

    /// Stop playback, keeping the sequencer selection. Idempotent.
    pub async fn stop(&self) -> Result<()> {
        self.engine.stop().await;
        self.state.set_transport_state(TransportState::Stopped).await;
        Ok(())
    }

    /// Skip to the next clip (wraps past the end)
    pub async fn next(&self) -> Result<()> {
        self.skip(Direction::Next).await
    }

    /// Skip to the previous clip (wraps past the beginning)
    pub async fn previous(&self) -> Result<()> {
        self.skip(Direction::Previous).await
    }

    async fn skip(&self, direction: Direction) -> Result<()> {
        self.engine.stop().await;

        let advanced = {
            let mut seq = self.sequencer.write().await;
            let clip = seq.advance(direction).cloned();
            clip.zip(seq.current_index()).map(|(c, i)| (i, c))
        };

        match advanced {
            Some((index, clip)) => self.start_session(index, clip).await,
            None => {
                self.state.set_transport_state(TransportState::Stopped).await;
                Err(Error::EmptyPlaylist)
            }
        }
    }

    /// Fetch, decode and play one clip; Stopped on any failure
    async fn start_session(&self, index: usize, clip: ClipSpec) -> Result<()> {
        let result = async {
            let asset = self.provider.fetch(clip.asset_ref()).await?;
            self.engine.play(index, clip, &asset).await
        }
        .await;

        match result {
            Ok(()) => {
                self.state.set_transport_state(TransportState::Playing).await;
                Ok(())
            }
            Err(e) => {
                warn!("failed to start clip {}: {}", index, e);
                self.engine.stop().await;
                self.state.set_transport_state(TransportState::Stopped).await;
                Err(e)
            }
        }
    }

    // ========================================================================
    // Auto-advance
    // ========================================================================

    /// Spawn the completion listener: natural completions while Playing
    /// advance the sequencer exactly as `next()` would.
    pub fn spawn_auto_advance(self: &Arc<Self>) -> JoinHandle<()> {
        let transport = Arc::clone(self);
        let mut rx = transport.state.subscribe_events();

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(PlayerEvent::ClipCompleted {
                        index,
                        completed: true,
                        ..
                    }) => {
                        transport.on_clip_completed(index).await;
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("completion listener lagged, skipped {} events", skipped);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn on_clip_completed(&self, index: usize) {
        if self.state.get_transport_state().await != TransportState::Playing {
            return;
        }

        let (len, current) = {
            let seq = self.sequencer.read().await;
            (seq.len(), seq.current_index())
        };

        if len == 0 {
            let _ = self.stop().await;
            return;
        }

        // End-of-pass policy: stop after the last clip unless looping
        if !self.loop_playlist && current == Some(len - 1) {
            info!("end of playlist reached");
            let _ = self.stop().await;
            return;
        }

        debug!("clip {} completed, auto-advancing", index);
        if let Err(e) = self.next().await {
            warn!("auto-advance failed: {}", e);
        }
    }

    // ========================================================================
    // Sequencer access
    // ========================================================================

    /// Append a clip to the end of the sequence
    pub async fn append_clip(&self, clip: ClipSpec) {
        self.sequencer.write().await.append(clip);
        self.notify_playlist_changed();
    }

    /// Remove the clip at `index`
    pub async fn remove_clip(&self, index: usize) -> Result<ClipSpec> {
        let removed = self.sequencer.write().await.remove_at(index)?;
        self.notify_playlist_changed();
        Ok(removed)
    }

    /// Replace the clip at `index` (re-edit commits a fresh clip)
    pub async fn replace_clip(&self, index: usize, clip: ClipSpec) -> Result<()> {
        self.sequencer.write().await.replace_at(index, clip)?;
        self.notify_playlist_changed();
        Ok(())
    }

    /// Stop playback and remove every clip
    pub async fn clear(&self) -> Result<()> {
        self.stop().await?;
        self.sequencer.write().await.clear();
        self.notify_playlist_changed();
        Ok(())
    }

    pub async fn clip_count(&self) -> usize {
        self.sequencer.read().await.len()
    }

    pub async fn current_index(&self) -> Option<usize> {
        self.sequencer.read().await.current_index()
    }

    fn notify_playlist_changed(&self) {
        self.state.broadcast_event(PlayerEvent::PlaylistChanged {
            timestamp: chrono::Utc::now(),
        });
    }
}
