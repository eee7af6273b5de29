//! Error types for pdj-player
//!
//! Module-specific error types using thiserror for clear error propagation.
//! Collaborator failures (network, decode) are caught at the API boundary
//! and surfaced as notifications; they never take down the running service.

use thiserror::Error;

/// Main error type for the player
#[derive(Error, Debug)]
pub enum Error {
    /// Search/auth/publish call to the remote service failed
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Malformed or undecodable audio data
    #[error("Audio decode error: {0}")]
    DecodeError(String),

    /// Clip window extends past the end of the decoded asset
    #[error("Asset too short: clip ends at {clip_end_seconds:.3}s but asset is {asset_seconds:.3}s")]
    AssetTooShort {
        clip_end_seconds: f64,
        asset_seconds: f64,
    },

    /// Sequencer mutation with an out-of-bounds index
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Transport operation on an empty sequence
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Track has no playable preview asset
    #[error("No preview available for track: {0}")]
    MissingPreview(String),

    /// Invalid clip timing parameters
    #[error("Invalid timing: {0}")]
    InvalidTiming(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Not authenticated against the remote service
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::NetworkFailure(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Internal(format!("serialization: {}", e))
    }
}

/// Convenience Result type using the player Error
pub type Result<T> = std::result::Result<T, Error>;
