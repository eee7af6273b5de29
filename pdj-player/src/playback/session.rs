//! Per-play session bookkeeping

use crate::clip::ClipSpec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Torn down by an explicit stop
    Idle,
    /// Actively rendering
    Playing,
    /// Torn down by a pause (transport keeps its position)
    Paused,
    /// Reached the clip's end offset
    Completed,
}

/// One playback session: created on play, destroyed on any transition out
/// of `Playing`. The render and progress tasks hold clones of the shared
/// flags; the session owns the task handles.
pub struct PlaybackSession {
    pub(crate) clip: ClipSpec,
    pub(crate) index: usize,
    pub(crate) state: Arc<Mutex<SessionState>>,
    pub(crate) stop_flag: Arc<AtomicBool>,
    pub(crate) completion_sent: Arc<AtomicBool>,
    pub(crate) render_task: JoinHandle<()>,
    pub(crate) progress_task: JoinHandle<()>,
}

impl PlaybackSession {
    pub fn clip(&self) -> &ClipSpec {
        &self.clip
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> SessionState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(SessionState::Idle)
    }

    /// Signal the tasks to stop and abort them. Does not emit events; the
    /// engine owns notification so completion fires exactly once.
    pub(crate) fn cancel(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.render_task.abort();
        self.progress_task.abort();
    }
}
