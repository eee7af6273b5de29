//! Playlist-publish API client
//!
//! Creates a playlist on the remote service and adds the clipped tracks to
//! it. The remote service only stores whole tracks; clip windows and fades
//! are persisted locally, keyed by the playlist id the service returns.

use crate::error::{Error, Result};
use crate::services::auth::AccessToken;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Remote user profile (playlists are created under the user's account)
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatePlaylistRequest<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatePlaylistResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct AddTracksRequest<'a> {
    uris: &'a [String],
}

/// Playlist-publish API client
pub struct PublishClient {
    http: reqwest::Client,
    base_url: String,
}

impl PublishClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Fetch the authenticated user's profile
    pub async fn current_user(&self, token: &AccessToken) -> Result<UserProfile> {
        let url = format!("{}/me", self.base_url.trim_end_matches('/'));
        let response = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, token.bearer())
            .send()
            .await?;

        Self::check_status(&url, response.status())?;
        response
            .json()
            .await
            .map_err(|e| Error::NetworkFailure(format!("malformed profile response: {}", e)))
    }

    /// Create an empty playlist under the user's account, returning its id
    pub async fn create_playlist(
        &self,
        token: &AccessToken,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<String> {
        let url = format!(
            "{}/users/{}/playlists",
            self.base_url.trim_end_matches('/'),
            user_id
        );
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, token.bearer())
            .json(&CreatePlaylistRequest { name, description })
            .send()
            .await?;

        Self::check_status(&url, response.status())?;
        let created: CreatePlaylistResponse = response
            .json()
            .await
            .map_err(|e| Error::NetworkFailure(format!("malformed create response: {}", e)))?;

        debug!("created remote playlist {}", created.id);
        Ok(created.id)
    }

    /// Add tracks (by uri, in order) to an existing playlist
    pub async fn add_tracks(
        &self,
        token: &AccessToken,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<()> {
        let url = format!(
            "{}/playlists/{}/tracks",
            self.base_url.trim_end_matches('/'),
            playlist_id
        );
        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, token.bearer())
            .json(&AddTracksRequest { uris })
            .send()
            .await?;

        Self::check_status(&url, response.status())
    }

    /// Create a playlist and add the given tracks in one step.
    pub async fn publish(
        &self,
        token: &AccessToken,
        name: &str,
        description: &str,
        uris: &[String],
    ) -> Result<String> {
        let user = self.current_user(token).await?;
        let playlist_id = self.create_playlist(token, &user.id, name, description).await?;
        self.add_tracks(token, &playlist_id, uris).await?;
        info!("published playlist '{}' ({} tracks)", name, uris.len());
        Ok(playlist_id)
    }

    fn check_status(url: &str, status: reqwest::StatusCode) -> Result<()> {
        if status.is_success() {
            Ok(())
        } else {
            Err(Error::NetworkFailure(format!(
                "{} returned {}",
                url, status
            )))
        }
    }
}
