//! # PDJ Player Library (pdj-player)
//!
//! Playlist-clip player: trims preview tracks to start/end windows, applies
//! linear fade envelopes, sequences the clips with wraparound navigation,
//! and plays them through the audio device. Catalog search, playlist
//! publishing, local persistence and JSON export sit around that core
//! behind an HTTP/SSE control interface.
//!
//! **Architecture:** decode (symphonia) → window + fade envelope → sample
//! sink (cpal behind a ring buffer); axum control API with SSE events.

pub mod api;
pub mod audio;
pub mod clip;
pub mod error;
pub mod playback;
pub mod sequencer;
pub mod services;
pub mod state;
pub mod store;
pub mod transport;

pub use clip::ClipSpec;
pub use error::{Error, Result};
pub use sequencer::{Direction, PlaylistSequencer};
pub use state::SharedState;
pub use transport::TransportController;
