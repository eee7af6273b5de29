//! Configuration loading
//!
//! Configuration comes from a TOML file; the binary layers CLI/env overrides
//! on top (highest priority first): command-line argument, environment
//! variable, TOML file, compiled default.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level PDJ configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP control API port
    pub port: u16,

    /// Path to the local playlist store (sqlite)
    pub database_path: PathBuf,

    /// Directory playlist exports are written to
    pub export_dir: PathBuf,

    /// Remote catalog/playlist service endpoints and app identity
    pub catalog: CatalogConfig,

    /// Playback behavior
    pub playback: PlaybackConfig,
}

/// Remote service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the catalog/playlist API
    pub api_base_url: String,

    /// Base URL of the account service hosting the authorize redirect
    pub accounts_base_url: String,

    /// Application client id registered with the service
    pub client_id: String,

    /// Redirect URI registered with the service; must match exactly
    pub redirect_uri: String,

    /// Scopes requested in the authorize redirect
    pub scopes: Vec<String>,
}

/// Playback configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Progress tick cadence in milliseconds
    pub progress_tick_ms: u64,

    /// Wrap back to the first clip after the last one completes
    pub loop_playlist: bool,

    /// Master volume, 0.0-1.0
    pub volume: f32,

    /// Audio output device name (None = system default)
    pub device: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5870,
            database_path: PathBuf::from("pdj.sqlite"),
            export_dir: PathBuf::from("."),
            catalog: CatalogConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.musicservice.example/v1".to_string(),
            accounts_base_url: "https://accounts.musicservice.example".to_string(),
            client_id: String::new(),
            redirect_uri: "http://127.0.0.1:5870/auth/callback".to_string(),
            scopes: vec![
                "playlist-modify-public".to_string(),
                "playlist-modify-private".to_string(),
                "streaming".to_string(),
            ],
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            progress_tick_ms: 100,
            loop_playlist: true,
            volume: 0.75,
            device: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, or defaults when no path is
    /// given. A missing file at an explicit path is an error; a malformed
    /// file is always an error.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let Some(path) = path else {
            return Ok(Config::default());
        };

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        tracing::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.port, 5870);
        assert_eq!(config.playback.progress_tick_ms, 100);
        assert!(config.playback.loop_playlist);
        assert_eq!(config.playback.volume, 0.75);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            port = 6000

            [playback]
            loop_playlist = false
            "#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.port, 6000);
        assert!(!config.playback.loop_playlist);
        // Untouched sections keep their defaults
        assert_eq!(config.playback.progress_tick_ms, 100);
        assert_eq!(config.database_path, PathBuf::from("pdj.sqlite"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = Config::load(Some(Path::new("/nonexistent/pdj.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }
}
