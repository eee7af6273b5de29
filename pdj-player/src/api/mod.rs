//! REST API for the player
//!
//! The control surface an external UI consumes: playback control, playlist
//! editing, catalog search, publishing/export, and an SSE event stream.

pub mod handlers;
pub mod sse;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::services::{CatalogClient, HttpAssetProvider, PublishClient};
use crate::state::SharedState;
use crate::store::PlaylistStore;
use crate::transport::TransportController;
use pdj_common::config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub transport: Arc<TransportController<HttpAssetProvider>>,
    pub catalog: Arc<CatalogClient>,
    pub publisher: Arc<PublishClient>,
    pub store: Arc<PlaylistStore>,
    pub config: Arc<Config>,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest(
            "/api/v1",
            Router::new()
                // Playback control
                .route("/playback/play", post(handlers::play))
                .route("/playback/pause", post(handlers::pause))
                .route("/playback/resume", post(handlers::resume))
                .route("/playback/stop", post(handlers::stop))
                .route("/playback/next", post(handlers::next))
                .route("/playback/previous", post(handlers::previous))
                .route("/playback/state", get(handlers::get_state))
                // Volume
                .route("/audio/volume", get(handlers::get_volume))
                .route("/audio/volume", post(handlers::set_volume))
                // Playlist editing
                .route("/playlist", get(handlers::get_playlist))
                .route("/playlist", delete(handlers::clear_playlist))
                .route("/playlist/name", post(handlers::set_playlist_name))
                .route("/playlist/clips", post(handlers::add_clip))
                .route("/playlist/clips/:index", put(handlers::replace_clip))
                .route("/playlist/clips/:index", delete(handlers::remove_clip))
                // Publish / persistence
                .route("/playlist/publish", post(handlers::publish_playlist))
                .route("/playlist/save", post(handlers::save_playlist_local))
                .route("/playlist/export", post(handlers::export_playlist))
                .route("/playlist/saved", get(handlers::list_saved))
                .route("/playlist/saved/:id", get(handlers::load_saved))
                // Catalog
                .route("/search", get(handlers::search))
                // Auth hand-off
                .route("/auth/url", get(handlers::auth_url))
                .route("/auth/token", post(handlers::set_token))
                // SSE events
                .route("/events", get(sse::event_stream)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
