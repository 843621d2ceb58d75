//! Database repository - main entry point
//! Delegates to ops modules for actual operations

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
};

use super::{models::*, ops, schema};

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database at `url` and run migrations
    pub async fn connect(url: &str) -> sqlx::Result<Self> {
        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // WAL keeps API reads from blocking on a running sync
        if !url.contains(":memory:") {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        schema::run_migrations(&pool).await?;
        tracing::debug!(url, "database ready");

        Ok(Self { pool })
    }

    /// Private in-memory database. Every handle shares one connection.
    pub async fn in_memory() -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        schema::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ============ Users ============

    pub async fn create_user(&self, user: NewUser) -> sqlx::Result<i64> {
        ops::create_user(&self.pool, user).await
    }

    pub async fn get_user(&self, id: i64) -> sqlx::Result<Option<User>> {
        ops::get_user(&self.pool, id).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> sqlx::Result<Option<User>> {
        ops::find_user_by_email(&self.pool, email).await
    }

    pub async fn username_exists(&self, username: &str) -> sqlx::Result<bool> {
        ops::username_exists(&self.pool, username).await
    }

    // ============ Tokens ============

    pub async fn get_token_for_user(&self, user_id: i64) -> sqlx::Result<Option<SpotifyToken>> {
        ops::get_token_for_user(&self.pool, user_id).await
    }

    pub async fn find_token_by_spotify_user(
        &self,
        spotify_user_id: &str,
    ) -> sqlx::Result<Option<SpotifyToken>> {
        ops::find_token_by_spotify_user(&self.pool, spotify_user_id).await
    }

    pub async fn save_token(&self, user_id: i64, token: &TokenRecord) -> sqlx::Result<()> {
        ops::save_token(&self.pool, user_id, token).await
    }

    pub async fn update_refreshed_token(
        &self,
        token_id: i64,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: DateTime<Utc>,
        scope: Option<&str>,
    ) -> sqlx::Result<()> {
        ops::update_refreshed_token(&self.pool, token_id, access_token, refresh_token, expires_at, scope)
            .await
    }

    pub async fn delete_token(&self, user_id: i64) -> sqlx::Result<bool> {
        ops::delete_token(&self.pool, user_id).await
    }

    // ============ Catalog ============

    pub async fn upsert_artist(&self, artist: &UpsertArtist) -> sqlx::Result<i64> {
        ops::upsert_artist(&self.pool, artist).await
    }

    pub async fn upsert_album(&self, album: &UpsertAlbum) -> sqlx::Result<i64> {
        ops::upsert_album(&self.pool, album).await
    }

    pub async fn upsert_song(&self, song: &UpsertSong) -> sqlx::Result<i64> {
        ops::upsert_song(&self.pool, song).await
    }

    pub async fn upsert_genre(&self, name: &str) -> sqlx::Result<i64> {
        ops::upsert_genre(&self.pool, name).await
    }

    pub async fn tag_artist_songs(&self, artist_id: i64, genre_id: i64) -> sqlx::Result<u64> {
        ops::tag_artist_songs(&self.pool, artist_id, genre_id).await
    }

    pub async fn list_artists(&self, query: &ListQuery) -> sqlx::Result<Vec<Artist>> {
        ops::list_artists(&self.pool, query).await
    }

    pub async fn get_artist(&self, id: i64) -> sqlx::Result<Option<Artist>> {
        ops::get_artist(&self.pool, id).await
    }

    pub async fn get_artist_by_spotify_id(&self, spotify_id: &str) -> sqlx::Result<Option<Artist>> {
        ops::get_artist_by_spotify_id(&self.pool, spotify_id).await
    }

    pub async fn find_artist_by_name(&self, name: &str) -> sqlx::Result<Option<Artist>> {
        ops::find_artist_by_name(&self.pool, name).await
    }

    pub async fn list_albums(&self, query: &ListQuery) -> sqlx::Result<Vec<AlbumWithArtist>> {
        ops::list_albums(&self.pool, query).await
    }

    pub async fn get_album(&self, id: i64) -> sqlx::Result<Option<AlbumWithArtist>> {
        ops::get_album(&self.pool, id).await
    }

    pub async fn albums_for_artist(&self, artist_id: i64) -> sqlx::Result<Vec<AlbumWithArtist>> {
        ops::albums_for_artist(&self.pool, artist_id).await
    }

    pub async fn list_songs(&self, query: &ListQuery) -> sqlx::Result<Vec<SongSummary>> {
        ops::list_songs(&self.pool, query).await
    }

    pub async fn get_song(&self, id: i64) -> sqlx::Result<Option<SongDetail>> {
        ops::get_song(&self.pool, id).await
    }

    pub async fn songs_for_album(&self, album_id: i64) -> sqlx::Result<Vec<SongDetail>> {
        ops::songs_for_album(&self.pool, album_id).await
    }

    pub async fn genres_for_song(&self, song_id: i64) -> sqlx::Result<Vec<Genre>> {
        ops::genres_for_song(&self.pool, song_id).await
    }

    pub async fn list_genres(&self, search: Option<&str>) -> sqlx::Result<Vec<Genre>> {
        ops::list_genres(&self.pool, search).await
    }

    pub async fn get_genre(&self, id: i64) -> sqlx::Result<Option<Genre>> {
        ops::get_genre(&self.pool, id).await
    }

    pub async fn catalog_stats(&self, user_id: i64) -> sqlx::Result<CatalogStats> {
        ops::catalog_stats(&self.pool, user_id).await
    }

    // ============ Playlists ============

    pub async fn list_playlists(&self, user_id: i64) -> sqlx::Result<Vec<PlaylistWithCount>> {
        ops::list_playlists(&self.pool, user_id).await
    }

    pub async fn create_playlist(&self, user_id: i64, playlist: &NewPlaylist) -> sqlx::Result<i64> {
        ops::create_playlist(&self.pool, user_id, playlist).await
    }

    pub async fn get_playlist(&self, user_id: i64, id: i64) -> sqlx::Result<Option<Playlist>> {
        ops::get_playlist(&self.pool, user_id, id).await
    }

    pub async fn playlist_entries(&self, playlist_id: i64) -> sqlx::Result<Vec<PlaylistEntry>> {
        ops::playlist_entries(&self.pool, playlist_id).await
    }

    pub async fn update_playlist(&self, id: i64, changes: &PlaylistChanges) -> sqlx::Result<()> {
        ops::update_playlist(&self.pool, id, changes).await
    }

    pub async fn delete_playlist(&self, id: i64) -> sqlx::Result<()> {
        ops::delete_playlist(&self.pool, id).await
    }

    pub async fn playlist_contains(&self, playlist_id: i64, song_id: i64) -> sqlx::Result<bool> {
        ops::playlist_contains(&self.pool, playlist_id, song_id).await
    }

    pub async fn add_song_to_playlist(
        &self,
        playlist_id: i64,
        song_id: i64,
        position: Option<i64>,
        added_by: i64,
    ) -> sqlx::Result<i64> {
        ops::add_song_to_playlist(&self.pool, playlist_id, song_id, position, added_by).await
    }

    pub async fn remove_song_from_playlist(&self, playlist_id: i64, song_id: i64) -> sqlx::Result<bool> {
        ops::remove_song_from_playlist(&self.pool, playlist_id, song_id).await
    }

    pub async fn upsert_synced_playlist(&self, playlist: &UpsertPlaylist) -> sqlx::Result<i64> {
        ops::upsert_synced_playlist(&self.pool, playlist).await
    }

    pub async fn replace_playlist_entries(
        &self,
        playlist_id: i64,
        entries: &[NewPlaylistEntry],
    ) -> sqlx::Result<u64> {
        ops::replace_playlist_entries(&self.pool, playlist_id, entries).await
    }

    // ============ Favorites ============

    pub async fn list_favorite_songs(&self, user_id: i64) -> sqlx::Result<Vec<FavoriteSong>> {
        ops::list_favorite_songs(&self.pool, user_id).await
    }

    pub async fn add_favorite_song(&self, user_id: i64, song_id: i64) -> sqlx::Result<bool> {
        ops::add_favorite_song(&self.pool, user_id, song_id).await
    }

    pub async fn remove_favorite_song(&self, user_id: i64, song_id: i64) -> sqlx::Result<bool> {
        ops::remove_favorite_song(&self.pool, user_id, song_id).await
    }

    pub async fn list_favorite_artists(&self, user_id: i64) -> sqlx::Result<Vec<FavoriteArtist>> {
        ops::list_favorite_artists(&self.pool, user_id).await
    }

    pub async fn add_favorite_artist(&self, user_id: i64, artist_id: i64) -> sqlx::Result<bool> {
        ops::add_favorite_artist(&self.pool, user_id, artist_id).await
    }

    pub async fn remove_favorite_artist(&self, user_id: i64, artist_id: i64) -> sqlx::Result<bool> {
        ops::remove_favorite_artist(&self.pool, user_id, artist_id).await
    }

    // ============ History ============

    pub async fn find_or_create_device(&self, device: &NewDevice) -> sqlx::Result<i64> {
        ops::find_or_create_device(&self.pool, device).await
    }

    pub async fn record_playback(&self, playback: &NewPlayback) -> sqlx::Result<i64> {
        ops::record_playback(&self.pool, playback).await
    }

    pub async fn list_playback_history(&self, user_id: i64, limit: i64) -> sqlx::Result<Vec<PlaybackRecord>> {
        ops::list_playback_history(&self.pool, user_id, limit).await
    }

    // ============ Sync log ============

    pub async fn start_sync_log(&self, user_id: i64, sync_type: &str) -> sqlx::Result<i64> {
        ops::start_sync_log(&self.pool, user_id, sync_type).await
    }

    pub async fn finish_sync_log(
        &self,
        sync_id: i64,
        status: &str,
        items_processed: i64,
        error_message: Option<&str>,
    ) -> sqlx::Result<()> {
        ops::finish_sync_log(&self.pool, sync_id, status, items_processed, error_message).await
    }

    pub async fn last_sync_log(&self, user_id: i64) -> sqlx::Result<Option<SyncLog>> {
        ops::last_sync_log(&self.pool, user_id).await
    }

    pub async fn is_syncing(&self, user_id: i64) -> sqlx::Result<bool> {
        ops::is_syncing(&self.pool, user_id).await
    }
}
