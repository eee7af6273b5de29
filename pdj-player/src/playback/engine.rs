//! Playback engine
//!
//! Renders one clip per session: source window → gain envelope → sample
//! sink. Progress is reported on the shared event channel at a fixed
//! cadence; the concrete sink and tick interval are chosen by the
//! integrator, so the engine has no hardware or timer coupling of its own.

use crate::audio::{DecodedAsset, Resampler, SampleSink};
use crate::clip::ClipSpec;
use crate::error::{Error, Result};
use crate::playback::session::{PlaybackSession, SessionState};
use crate::state::{CurrentClip, SharedState};
use pdj_common::events::PlayerEvent;
use pdj_common::time::seconds_to_millis;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tokio::time::{interval, sleep, Duration, Instant};
use tracing::{debug, info};

/// Samples pushed to the sink per write
const RENDER_CHUNK: usize = 4096;

/// Backoff while the sink is full
const SINK_FULL_BACKOFF: Duration = Duration::from_millis(5);

/// Playback engine: holds at most one session at a time.
///
/// `play` is stop-then-start: any in-flight session is torn down inside the
/// session lock before the new one is created, so no two sessions' tasks
/// ever overlap.
pub struct PlaybackEngine {
    state: Arc<SharedState>,
    sink: Arc<dyn SampleSink>,
    tick_interval: Duration,
    session: Mutex<Option<PlaybackSession>>,
}

impl PlaybackEngine {
    /// Create an engine rendering into `sink`, ticking progress every
    /// `tick_interval` (100 ms is the reference cadence).
    pub fn new(state: Arc<SharedState>, sink: Arc<dyn SampleSink>, tick_interval: Duration) -> Self {
        Self {
            state,
            sink,
            tick_interval,
            session: Mutex::new(None),
        }
    }

    /// Start a session for `clip` rendered from `asset`.
    ///
    /// Fails with [`Error::AssetTooShort`] (starting nothing) when the asset
    /// does not cover the clip window.
    pub async fn play(&self, index: usize, clip: ClipSpec, asset: &DecodedAsset) -> Result<()> {
        let asset_seconds = asset.duration_seconds();
        if clip.end_offset() > asset_seconds + 1e-9 {
            return Err(Error::AssetTooShort {
                clip_end_seconds: clip.end_offset(),
                asset_seconds,
            });
        }

        let mut slot = self.session.lock().await;
        self.teardown(&mut slot, SessionState::Idle).await;

        let rendered = self.render_clip(&clip, asset)?;

        let duration = clip.duration();
        let duration_ms = seconds_to_millis(duration);
        let asset_ref = clip.asset_ref().to_string();

        info!(
            "playing clip {} ({}, {:.1}s)",
            index,
            pdj_common::time::format_window(clip.start_offset(), clip.end_offset()),
            duration
        );

        let stop_flag = Arc::new(AtomicBool::new(false));
        let completion_sent = Arc::new(AtomicBool::new(false));
        let session_state = Arc::new(StdMutex::new(SessionState::Playing));
        let started_at = Instant::now();

        self.state
            .set_current_clip(Some(CurrentClip {
                index,
                asset_ref: asset_ref.clone(),
                position_ms: 0,
                duration_ms,
            }))
            .await;
        self.state.broadcast_event(PlayerEvent::ClipStarted {
            index,
            asset_ref: asset_ref.clone(),
            duration_ms,
            timestamp: chrono::Utc::now(),
        });

        let render_task = tokio::spawn(Self::render_loop(
            Arc::clone(&self.sink),
            rendered,
            Arc::clone(&stop_flag),
        ));

        let progress_task = tokio::spawn(Self::progress_loop(
            Arc::clone(&self.state),
            index,
            asset_ref,
            duration,
            started_at,
            self.tick_interval,
            Arc::clone(&stop_flag),
            Arc::clone(&completion_sent),
            Arc::clone(&session_state),
        ));

        *slot = Some(PlaybackSession {
            clip,
            index,
            state: session_state,
            stop_flag,
            completion_sent,
            render_task,
            progress_task,
        });

        Ok(())
    }

    /// Stop the current session, if any. Idempotent: stopping with no
    /// session is a no-op, never an error.
    pub async fn stop(&self) {
        let mut slot = self.session.lock().await;
        self.teardown(&mut slot, SessionState::Idle).await;
    }

    /// Tear down the current session marking it paused (identical to stop
    /// except for the recorded final state)
    pub async fn pause(&self) {
        let mut slot = self.session.lock().await;
        self.teardown(&mut slot, SessionState::Paused).await;
    }

    /// State of the session slot, if one exists
    pub async fn session_state(&self) -> Option<SessionState> {
        self.session.lock().await.as_ref().map(|s| s.state())
    }

    /// Index of the clip in the session slot, if one exists
    pub async fn session_index(&self) -> Option<usize> {
        self.session.lock().await.as_ref().map(|s| s.index())
    }

    /// Window the asset to the clip bounds, apply the fade envelope, and
    /// convert to the sink's rate
    fn render_clip(&self, clip: &ClipSpec, asset: &DecodedAsset) -> Result<Vec<f32>> {
        let rate = asset.sample_rate;
        let start_frame = (clip.start_offset() * rate as f64).round() as usize;
        let end_frame = (clip.end_offset() * rate as f64).round() as usize;

        let mut rendered = asset.window(start_frame, end_frame).to_vec();

        let envelope = clip.envelope();
        for (frame_idx, frame) in rendered.chunks_exact_mut(2).enumerate() {
            let gain = envelope.gain_at(frame_idx as f64 / rate as f64);
            frame[0] *= gain;
            frame[1] *= gain;
        }

        let sink_rate = self.sink.sample_rate();
        if sink_rate != rate {
            return Resampler::resample(&rendered, rate, sink_rate, 2);
        }
        Ok(rendered)
    }

    /// Push the rendered buffer into the sink, backing off while it is full
    async fn render_loop(sink: Arc<dyn SampleSink>, rendered: Vec<f32>, stop_flag: Arc<AtomicBool>) {
        let mut position = 0;
        while position < rendered.len() {
            if stop_flag.load(Ordering::Acquire) {
                return;
            }
            let end = (position + RENDER_CHUNK).min(rendered.len());
            let pushed = sink.push(&rendered[position..end]);
            if pushed == 0 {
                sleep(SINK_FULL_BACKOFF).await;
            } else {
                position += pushed;
            }
        }
        debug!("render complete: {} samples", rendered.len());
    }

    /// Emit progress ticks and the single natural-completion notification
    async fn progress_loop(
        state: Arc<SharedState>,
        index: usize,
        asset_ref: String,
        duration: f64,
        started_at: Instant,
        tick_interval: Duration,
        stop_flag: Arc<AtomicBool>,
        completion_sent: Arc<AtomicBool>,
        session_state: Arc<StdMutex<SessionState>>,
    ) {
        let duration_ms = seconds_to_millis(duration);
        let mut ticker = interval(tick_interval);

        loop {
            ticker.tick().await;

            if stop_flag.load(Ordering::Acquire) {
                return;
            }

            let elapsed = started_at.elapsed().as_secs_f64();
            let elapsed_fraction = (elapsed / duration).min(1.0);
            let position_ms = seconds_to_millis(elapsed.min(duration));

            state
                .set_current_clip(Some(CurrentClip {
                    index,
                    asset_ref: asset_ref.clone(),
                    position_ms,
                    duration_ms,
                }))
                .await;
            state.broadcast_event(PlayerEvent::PlaybackProgress {
                index,
                elapsed_fraction,
                position_ms,
                duration_ms,
                timestamp: chrono::Utc::now(),
            });

            if elapsed_fraction >= 1.0 {
                stop_flag.store(true, Ordering::Release);
                if !completion_sent.swap(true, Ordering::AcqRel) {
                    if let Ok(mut s) = session_state.lock() {
                        *s = SessionState::Completed;
                    }
                    state.broadcast_event(PlayerEvent::ClipCompleted {
                        index,
                        completed: true,
                        timestamp: chrono::Utc::now(),
                    });
                }
                return;
            }
        }
    }

    /// Cancel and drop the session in `slot`, firing the completion
    /// notification iff it has not fired yet
    async fn teardown(&self, slot: &mut Option<PlaybackSession>, final_state: SessionState) {
        let Some(session) = slot.take() else {
            return;
        };

        session.cancel();

        if !session.completion_sent.swap(true, Ordering::AcqRel) {
            if let Ok(mut s) = session.state.lock() {
                *s = final_state;
            }
            self.state.broadcast_event(PlayerEvent::ClipCompleted {
                index: session.index,
                completed: false,
                timestamp: chrono::Utc::now(),
            });
        }

        self.sink.clear();
        self.state.set_current_clip(None).await;
        debug!("session for clip {} torn down", session.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullSink;
    use pdj_common::events::PlayerEvent;

    fn engine_with_null_sink() -> (PlaybackEngine, Arc<SharedState>) {
        let state = Arc::new(SharedState::new());
        let sink = Arc::new(NullSink::new(44100));
        let engine = PlaybackEngine::new(Arc::clone(&state), sink, Duration::from_millis(100));
        (engine, state)
    }

    fn silent_asset(seconds: f64) -> DecodedAsset {
        let frames = (44100.0 * seconds) as usize;
        DecodedAsset::new(vec![0.0; frames * 2], 44100)
    }

    fn clip(start: f64, end: f64) -> ClipSpec {
        ClipSpec::new("asset:test", start, end, 0.0, 0.0).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_asset_too_short_starts_no_session() {
        let (engine, state) = engine_with_null_sink();
        let mut rx = state.subscribe_events();

        let result = engine.play(0, clip(0.0, 2.0), &silent_asset(1.0)).await;

        assert!(matches!(result, Err(Error::AssetTooShort { .. })));
        assert!(engine.session_state().await.is_none());
        assert!(rx.try_recv().is_err(), "no events should have fired");
    }

    #[tokio::test(start_paused = true)]
    async fn test_natural_completion_fires_once() {
        let (engine, state) = engine_with_null_sink();
        let mut rx = state.subscribe_events();

        engine.play(0, clip(0.0, 0.5), &silent_asset(1.0)).await.unwrap();

        let mut completions = 0;
        loop {
            match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
                Ok(Ok(PlayerEvent::ClipCompleted { completed, .. })) => {
                    assert!(completed);
                    completions += 1;
                    break;
                }
                Ok(Ok(_)) => continue,
                other => panic!("unexpected: {:?}", other),
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(engine.session_state().await, Some(SessionState::Completed));

        // A stop after natural completion must not fire a second completion
        engine.stop().await;
        while let Ok(event) = rx.try_recv() {
            assert!(!matches!(event, PlayerEvent::ClipCompleted { .. }));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_stop_is_noop() {
        let (engine, state) = engine_with_null_sink();

        engine.play(0, clip(0.0, 1.0), &silent_asset(2.0)).await.unwrap();

        let mut rx = state.subscribe_events();
        engine.stop().await;
        engine.stop().await;

        let mut completions = 0;
        while let Ok(event) = rx.try_recv() {
            if let PlayerEvent::ClipCompleted { completed, .. } = event {
                assert!(!completed, "explicit stop is not a natural completion");
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(engine.session_state().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_fractions_monotonic_and_bounded() {
        let (engine, state) = engine_with_null_sink();
        let mut rx = state.subscribe_events();

        engine.play(0, clip(0.0, 0.3), &silent_asset(1.0)).await.unwrap();

        let mut last = -1.0;
        loop {
            match tokio::time::timeout(Duration::from_secs(5), rx.recv()).await {
                Ok(Ok(PlayerEvent::PlaybackProgress {
                    elapsed_fraction, ..
                })) => {
                    assert!(elapsed_fraction >= last);
                    assert!(elapsed_fraction <= 1.0);
                    last = elapsed_fraction;
                }
                Ok(Ok(PlayerEvent::ClipCompleted { .. })) => break,
                Ok(Ok(_)) => continue,
                other => panic!("unexpected: {:?}", other),
            }
        }
        assert_eq!(last, 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_replaces_running_session() {
        let (engine, state) = engine_with_null_sink();

        engine.play(0, clip(0.0, 1.0), &silent_asset(2.0)).await.unwrap();
        let mut rx = state.subscribe_events();
        engine.play(1, clip(0.0, 0.5), &silent_asset(2.0)).await.unwrap();

        // The first session ends with completed=false before the second starts
        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event,
            PlayerEvent::ClipCompleted {
                index: 0,
                completed: false,
                ..
            }
        ));
        assert_eq!(engine.session_index().await, Some(1));
    }
}
