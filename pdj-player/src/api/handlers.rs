//! HTTP request handlers
//!
//! Every collaborator failure is caught here and surfaced as an error
//! response; nothing propagates far enough to take the service down.

use crate::api::AppContext;
use crate::clip::ClipSpec;
use crate::error::Error;
use crate::services::auth::{authorize_url, AccessToken};
use crate::services::catalog::TrackRecord;
use crate::store::export_to_file;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use pdj_common::events::PlayerEvent;
use pdj_common::playlist::{PlaylistDocument, PlaylistTrack};
use pdj_common::time::format_window;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    pub index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TransportStateResponse {
    state: String,
    current: Option<CurrentClipInfo>,
    volume: f32,
}

#[derive(Debug, Serialize)]
pub struct CurrentClipInfo {
    index: usize,
    asset_ref: String,
    position_ms: u64,
    duration_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    volume: f32,
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    volume: f32,
}

#[derive(Debug, Deserialize)]
pub struct AddClipRequest {
    pub track: TrackRecord,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub fade_in: f64,
    #[serde(default)]
    pub fade_out: f64,
}

#[derive(Debug, Serialize)]
pub struct ClipAddedResponse {
    status: String,
    index: usize,
}

#[derive(Debug, Serialize)]
pub struct PlaylistResponse {
    name: String,
    clips: Vec<ClipInfo>,
}

#[derive(Debug, Serialize)]
pub struct ClipInfo {
    index: usize,
    /// Display string for the clip window ("0:45 - 1:10")
    window: String,
    track: PlaylistTrack,
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct PublishRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    status: String,
    playlist_id: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExportRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    status: String,
    path: String,
}

#[derive(Debug, Serialize)]
pub struct SavedPlaylistInfo {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: String,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    tracks: Vec<TrackRecord>,
}

#[derive(Debug, Serialize)]
pub struct AuthUrlResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    access_token: String,
}

type ApiError = (StatusCode, Json<StatusResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

/// Map player errors onto HTTP status codes
fn error_response(e: Error) -> ApiError {
    let status = match &e {
        Error::EmptyPlaylist | Error::InvalidState(_) => StatusCode::CONFLICT,
        Error::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
        Error::InvalidTiming(_) => StatusCode::BAD_REQUEST,
        Error::MissingPreview(_) | Error::AssetTooShort { .. } | Error::DecodeError(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::NetworkFailure(_) => StatusCode::BAD_GATEWAY,
        Error::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("request failed: {}", e);
    }
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

fn ok() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "pdj-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Playback control
// ============================================================================

/// POST /playback/play - start playback (optionally of a specific clip)
pub async fn play(
    State(ctx): State<AppContext>,
    body: Option<Json<PlayRequest>>,
) -> ApiResult<StatusResponse> {
    let index = body.and_then(|Json(req)| req.index);
    ctx.transport.play(index).await.map_err(error_response)?;
    Ok(ok())
}

/// POST /playback/pause
pub async fn pause(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.transport.pause().await.map_err(error_response)?;
    Ok(ok())
}

/// POST /playback/resume
pub async fn resume(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.transport.resume().await.map_err(error_response)?;
    Ok(ok())
}

/// POST /playback/stop
pub async fn stop(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.transport.stop().await.map_err(error_response)?;
    Ok(ok())
}

/// POST /playback/next
pub async fn next(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.transport.next().await.map_err(error_response)?;
    Ok(ok())
}

/// POST /playback/previous
pub async fn previous(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    ctx.transport.previous().await.map_err(error_response)?;
    Ok(ok())
}

/// GET /playback/state
pub async fn get_state(State(ctx): State<AppContext>) -> Json<TransportStateResponse> {
    let state = ctx.state.get_transport_state().await;
    let current = ctx.state.get_current_clip().await.map(|c| CurrentClipInfo {
        index: c.index,
        asset_ref: c.asset_ref,
        position_ms: c.position_ms,
        duration_ms: c.duration_ms,
    });

    Json(TransportStateResponse {
        state: format!("{:?}", state),
        current,
        volume: ctx.state.get_volume(),
    })
}

// ============================================================================
// Volume
// ============================================================================

/// GET /audio/volume
pub async fn get_volume(State(ctx): State<AppContext>) -> Json<VolumeResponse> {
    Json(VolumeResponse {
        volume: ctx.state.get_volume(),
    })
}

/// POST /audio/volume
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(req): Json<VolumeRequest>,
) -> Json<VolumeResponse> {
    ctx.state.set_volume(req.volume);
    Json(VolumeResponse {
        volume: ctx.state.get_volume(),
    })
}

// ============================================================================
// Playlist editing
// ============================================================================

/// GET /playlist
pub async fn get_playlist(State(ctx): State<AppContext>) -> Json<PlaylistResponse> {
    let draft = ctx.state.playlist.read().await;

    let clips = draft
        .tracks
        .iter()
        .enumerate()
        .map(|(index, track)| ClipInfo {
            index,
            window: format_window(track.start_time, track.end_time),
            track: track.clone(),
        })
        .collect();

    Json(PlaylistResponse {
        name: draft.name.clone(),
        clips,
    })
}

/// POST /playlist/name
pub async fn set_playlist_name(
    State(ctx): State<AppContext>,
    Json(req): Json<NameRequest>,
) -> Json<StatusResponse> {
    ctx.state.playlist.write().await.name = req.name;
    ok()
}

/// POST /playlist/clips - commit a track edit as a new clip
///
/// A track without a preview asset is terminal here: it cannot become a
/// clip.
pub async fn add_clip(
    State(ctx): State<AppContext>,
    Json(req): Json<AddClipRequest>,
) -> ApiResult<ClipAddedResponse> {
    let (clip, entry) = clip_from_request(&req).map_err(error_response)?;

    // Draft lock held across both mutations keeps entry i describing clip i
    let mut draft = ctx.state.playlist.write().await;
    ctx.transport.append_clip(clip).await;
    draft.tracks.push(entry);
    let index = draft.tracks.len() - 1;

    info!("added clip {} ({})", index, req.track.title);
    Ok(Json(ClipAddedResponse {
        status: "ok".to_string(),
        index,
    }))
}

/// PUT /playlist/clips/:index - replace a clip with a re-edit
pub async fn replace_clip(
    State(ctx): State<AppContext>,
    Path(index): Path<usize>,
    Json(req): Json<AddClipRequest>,
) -> ApiResult<StatusResponse> {
    let (clip, entry) = clip_from_request(&req).map_err(error_response)?;

    let mut draft = ctx.state.playlist.write().await;
    ctx.transport
        .replace_clip(index, clip)
        .await
        .map_err(error_response)?;
    if let Some(slot) = draft.tracks.get_mut(index) {
        *slot = entry;
    }

    Ok(ok())
}

/// DELETE /playlist/clips/:index
pub async fn remove_clip(
    State(ctx): State<AppContext>,
    Path(index): Path<usize>,
) -> ApiResult<StatusResponse> {
    let mut draft = ctx.state.playlist.write().await;
    ctx.transport
        .remove_clip(index)
        .await
        .map_err(error_response)?;
    if index < draft.tracks.len() {
        draft.tracks.remove(index);
    }

    Ok(ok())
}

/// DELETE /playlist - stop playback and clear everything
pub async fn clear_playlist(State(ctx): State<AppContext>) -> ApiResult<StatusResponse> {
    let mut draft = ctx.state.playlist.write().await;
    ctx.transport.clear().await.map_err(error_response)?;
    draft.tracks.clear();
    draft.name.clear();

    Ok(ok())
}

fn clip_from_request(req: &AddClipRequest) -> Result<(ClipSpec, PlaylistTrack), Error> {
    let preview_url = req
        .track
        .preview_url
        .clone()
        .ok_or_else(|| Error::MissingPreview(req.track.title.clone()))?;

    let clip = ClipSpec::new(
        preview_url.clone(),
        req.start_time,
        req.end_time,
        req.fade_in,
        req.fade_out,
    )?;

    let entry = PlaylistTrack {
        title: req.track.title.clone(),
        artist: req.track.artist_line(),
        uri: req.track.uri.clone(),
        preview_url,
        start_time: req.start_time,
        end_time: req.end_time,
        fade_in: req.fade_in,
        fade_out: req.fade_out,
        album_art: req.track.album_art_url.clone(),
    };

    Ok((clip, entry))
}

// ============================================================================
// Publish / persistence
// ============================================================================

/// POST /playlist/publish - create the playlist remotely, then persist the
/// clip windows locally under the returned id
pub async fn publish_playlist(
    State(ctx): State<AppContext>,
    body: Option<Json<PublishRequest>>,
) -> ApiResult<PublishResponse> {
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let token = require_token(&ctx).await.map_err(error_response)?;
    let document = build_document(&ctx, req.name).await.map_err(error_response)?;

    let description = req
        .description
        .unwrap_or_else(|| "Created with PDJ - custom clip windows and fades".to_string());
    let uris: Vec<String> = document.tracks.iter().map(|t| t.uri.clone()).collect();

    let playlist_id = ctx
        .publisher
        .publish(&token, &document.name, &description, &uris)
        .await
        .map_err(error_response)?;

    ctx.store
        .save(&playlist_id, &document)
        .await
        .map_err(error_response)?;

    ctx.state.broadcast_event(PlayerEvent::PlaylistPublished {
        playlist_id: playlist_id.clone(),
        name: document.name.clone(),
        timestamp: chrono::Utc::now(),
    });

    Ok(Json(PublishResponse {
        status: "ok".to_string(),
        playlist_id,
    }))
}

/// POST /playlist/save - persist the draft locally without publishing,
/// under a locally generated id
pub async fn save_playlist_local(
    State(ctx): State<AppContext>,
    body: Option<Json<ExportRequest>>,
) -> ApiResult<PublishResponse> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let document = build_document(&ctx, req.name).await.map_err(error_response)?;

    let playlist_id = format!("local-{}", Uuid::new_v4());
    ctx.store
        .save(&playlist_id, &document)
        .await
        .map_err(error_response)?;

    info!("saved playlist '{}' locally as {}", document.name, playlist_id);
    Ok(Json(PublishResponse {
        status: "ok".to_string(),
        playlist_id,
    }))
}

/// POST /playlist/export - write the document to a local JSON file
pub async fn export_playlist(
    State(ctx): State<AppContext>,
    body: Option<Json<ExportRequest>>,
) -> ApiResult<ExportResponse> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let document = build_document(&ctx, req.name).await.map_err(error_response)?;

    let path =
        export_to_file(&document, &ctx.config.export_dir).map_err(error_response)?;

    Ok(Json(ExportResponse {
        status: "ok".to_string(),
        path: path.display().to_string(),
    }))
}

/// GET /playlist/saved
pub async fn list_saved(State(ctx): State<AppContext>) -> ApiResult<Vec<SavedPlaylistInfo>> {
    let entries = ctx.store.list().await.map_err(error_response)?;
    Ok(Json(
        entries
            .into_iter()
            .map(|(id, name)| SavedPlaylistInfo { id, name })
            .collect(),
    ))
}

/// GET /playlist/saved/:id
pub async fn load_saved(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> ApiResult<PlaylistDocument> {
    match ctx.store.load(&id).await.map_err(error_response)? {
        Some(document) => Ok(Json(document)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(StatusResponse {
                status: format!("error: playlist {} not found", id),
            }),
        )),
    }
}

async fn require_token(ctx: &AppContext) -> Result<AccessToken, Error> {
    ctx.state
        .get_access_token()
        .await
        .ok_or_else(|| Error::Unauthenticated("no access token; complete the login flow".to_string()))
}

/// Snapshot the draft as a persistable document
async fn build_document(ctx: &AppContext, name: Option<String>) -> Result<PlaylistDocument, Error> {
    let draft = ctx.state.playlist.read().await;
    if draft.tracks.is_empty() {
        return Err(Error::EmptyPlaylist);
    }

    let name = name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| (!draft.name.trim().is_empty()).then(|| draft.name.clone()))
        .unwrap_or_else(|| "My Custom Playlist".to_string());

    Ok(PlaylistDocument {
        name,
        created_at: chrono::Utc::now(),
        tracks: draft.tracks.clone(),
    })
}

// ============================================================================
// Catalog search
// ============================================================================

/// GET /search?q=...&limit=...
pub async fn search(
    State(ctx): State<AppContext>,
    Query(params): Query<SearchParams>,
) -> ApiResult<SearchResponse> {
    if params.q.trim().is_empty() {
        return Ok(Json(SearchResponse { tracks: Vec::new() }));
    }

    let token = require_token(&ctx).await.map_err(error_response)?;
    let tracks = ctx
        .catalog
        .search(&token, &params.q, params.limit.unwrap_or(10))
        .await
        .map_err(error_response)?;

    Ok(Json(SearchResponse { tracks }))
}

// ============================================================================
// Auth hand-off
// ============================================================================

/// GET /auth/url - the external authorize redirect URL
pub async fn auth_url(State(ctx): State<AppContext>) -> Json<AuthUrlResponse> {
    Json(AuthUrlResponse {
        url: authorize_url(&ctx.config.catalog),
    })
}

/// POST /auth/token - hand back the token from the completed redirect flow
pub async fn set_token(
    State(ctx): State<AppContext>,
    Json(req): Json<TokenRequest>,
) -> Json<StatusResponse> {
    ctx.state
        .set_access_token(Some(AccessToken::new(req.access_token)))
        .await;
    info!("access token installed");
    ok()
}
