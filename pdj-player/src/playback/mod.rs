//! Clip playback
//!
//! One ephemeral session per play action: the engine windows the decoded
//! asset to the clip bounds, applies the fade envelope, and streams the
//! result into the sample sink while a progress task reports elapsed
//! fraction and fires the single completion notification.

pub mod engine;
pub mod session;

pub use engine::PlaybackEngine;
pub use session::SessionState;
