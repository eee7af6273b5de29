//! Local playlist store
//!
//! The remote service only stores whole tracks, so clip windows and fades
//! are persisted locally: one JSON document per playlist, keyed by the
//! playlist id the publish call returned. The same document can be exported
//! to a file.

use crate::error::Result;
use pdj_common::playlist::PlaylistDocument;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Sqlite-backed playlist document store
pub struct PlaylistStore {
    pool: SqlitePool,
}

impl PlaylistStore {
    /// Open (creating if missing) the store at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self { pool };
        store.init_schema().await?;

        info!("playlist store ready at {}", path.display());
        Ok(store)
    }

    /// In-memory store (tests)
    pub async fn open_in_memory() -> Result<Self> {
        // One connection: every sqlite :memory: connection is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS playlists (
                playlist_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at TEXT NOT NULL,
                document TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Save (upsert) a playlist document under `playlist_id`
    pub async fn save(&self, playlist_id: &str, document: &PlaylistDocument) -> Result<()> {
        let json = serde_json::to_string(document)?;

        sqlx::query(
            r#"
            INSERT INTO playlists (playlist_id, name, created_at, document)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(playlist_id) DO UPDATE SET
                name = excluded.name,
                created_at = excluded.created_at,
                document = excluded.document
            "#,
        )
        .bind(playlist_id)
        .bind(&document.name)
        .bind(document.created_at.to_rfc3339())
        .bind(&json)
        .execute(&self.pool)
        .await?;

        debug!("saved playlist {} ({})", playlist_id, document.name);
        Ok(())
    }

    /// Load the document stored under `playlist_id`
    pub async fn load(&self, playlist_id: &str) -> Result<Option<PlaylistDocument>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT document FROM playlists WHERE playlist_id = ?")
                .bind(playlist_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some((json,)) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// List stored playlists as (id, name) pairs, newest first
    pub async fn list(&self) -> Result<Vec<(String, String)>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT playlist_id, name FROM playlists ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    /// Delete the document stored under `playlist_id`
    pub async fn delete(&self, playlist_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM playlists WHERE playlist_id = ?")
            .bind(playlist_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Write a playlist document to `<export_dir>/<name>_playlist.json`,
/// returning the written path
pub fn export_to_file(document: &PlaylistDocument, export_dir: &Path) -> Result<PathBuf> {
    let path = export_dir.join(document.export_file_name());
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(&path, json)?;
    info!("exported playlist '{}' to {}", document.name, path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pdj_common::playlist::PlaylistTrack;

    fn sample_document(name: &str) -> PlaylistDocument {
        PlaylistDocument {
            name: name.to_string(),
            created_at: Utc::now(),
            tracks: vec![PlaylistTrack {
                title: "Train".to_string(),
                artist: "4 Non Blondes".to_string(),
                uri: "catalog:track:3cfOd4".to_string(),
                preview_url: "https://cdn.example.com/p/3cfOd4.mp3".to_string(),
                start_time: 12.5,
                end_time: 41.0,
                fade_in: 2.0,
                fade_out: 3.5,
                album_art: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let store = PlaylistStore::open_in_memory().await.unwrap();
        let doc = sample_document("Road Trip");

        store.save("pl-1", &doc).await.unwrap();
        let loaded = store.load("pl-1").await.unwrap().unwrap();

        assert_eq!(loaded.name, doc.name);
        assert_eq!(loaded.tracks, doc.tracks);
    }

    #[tokio::test]
    async fn test_load_missing_returns_none() {
        let store = PlaylistStore::open_in_memory().await.unwrap();
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let store = PlaylistStore::open_in_memory().await.unwrap();

        store.save("pl-1", &sample_document("First")).await.unwrap();
        store.save("pl-1", &sample_document("Second")).await.unwrap();

        let loaded = store.load("pl-1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Second");
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = PlaylistStore::open_in_memory().await.unwrap();
        store.save("pl-1", &sample_document("Gone")).await.unwrap();

        assert!(store.delete("pl-1").await.unwrap());
        assert!(!store.delete("pl-1").await.unwrap());
        assert!(store.load("pl-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_open_on_disk_and_export() {
        let dir = tempfile::tempdir().unwrap();
        let store = PlaylistStore::open(&dir.path().join("pdj.sqlite"))
            .await
            .unwrap();
        store.save("pl-1", &sample_document("On Disk")).await.unwrap();
        assert!(store.load("pl-1").await.unwrap().is_some());

        let doc = sample_document("My Mix");
        let path = export_to_file(&doc, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "My_Mix_playlist.json");

        let back: PlaylistDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.tracks, doc.tracks);
    }
}
