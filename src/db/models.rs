//! Database models for persistent storage
//! These models map directly to SQLite tables

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// OAuth tokens of a linked Spotify account
#[derive(Debug, Clone, FromRow)]
pub struct SpotifyToken {
    pub token_id: i64,
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub scope: Option<String>,
    pub spotify_user_id: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Artist {
    pub artist_id: i64,
    pub name: String,
    pub country: Option<String>,
    pub biography: Option<String>,
    pub spotify_id: Option<String>,
    pub image_url: Option<String>,
    pub popularity: Option<i64>,
    pub followers: Option<i64>,
    pub data_source: String,
    pub formation_year: Option<i64>,
    pub artist_type: Option<String>,
    pub spotify_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Artist fields embedded in other listings
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ArtistSummary {
    pub artist_id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub spotify_id: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Album {
    pub album_id: i64,
    pub artist_id: i64,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub spotify_id: Option<String>,
    pub spotify_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub total_tracks: Option<i64>,
    pub data_source: String,
    pub release_year: Option<i64>,
    pub record_label: Option<String>,
    pub album_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Album joined with its artist
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AlbumWithArtist {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub album: Album,
    pub artist_name: String,
    pub artist_image_url: Option<String>,
    pub artist_spotify_id: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Genre {
    pub genre_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub spotify_id: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Song {
    pub song_id: i64,
    pub album_id: i64,
    pub title: String,
    /// Duration in milliseconds
    pub duration: i64,
    pub spotify_id: Option<String>,
    pub spotify_url: Option<String>,
    pub preview_url: Option<String>,
    pub isrc: Option<String>,
    pub popularity: Option<i64>,
    pub data_source: String,
    pub track_number: Option<i64>,
    pub disc_number: i64,
    pub composer: Option<String>,
    pub lyrics: Option<String>,
    pub explicit_content: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Song joined with album and artist
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SongDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub song: Song,
    pub album_title: String,
    pub album_cover: Option<String>,
    pub album_spotify_id: Option<String>,
    pub artist_id: i64,
    pub artist_name: String,
}

/// Compact song row used in listings, playlists and favorites
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SongSummary {
    pub song_id: i64,
    pub title: String,
    pub artist_name: String,
    pub album_title: String,
    pub album_cover: Option<String>,
    pub duration: i64,
    pub spotify_id: Option<String>,
    pub preview_url: Option<String>,
    pub explicit_content: bool,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Playlist {
    pub playlist_id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub cover_image_url: Option<String>,
    pub spotify_id: Option<String>,
    pub spotify_snapshot_id: Option<String>,
    pub is_synced_with_spotify: bool,
    pub last_sync_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PlaylistWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub playlist: Playlist,
    pub songs_count: i64,
}

/// One ordered playlist entry
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PlaylistEntry {
    #[sqlx(flatten)]
    pub song: SongSummary,
    pub position: i64,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FavoriteSong {
    #[sqlx(flatten)]
    pub song: SongSummary,
    pub favorited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FavoriteArtist {
    #[sqlx(flatten)]
    pub artist: ArtistSummary,
    pub favorited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PlaybackRecord {
    pub playback_id: i64,
    pub song_id: i64,
    pub song_title: String,
    pub device_id: i64,
    pub device_name: Option<String>,
    pub device_type: String,
    pub playback_date: DateTime<Utc>,
    pub completed: bool,
    pub playback_duration: Option<i64>,
    pub rating: Option<i64>,
    pub skipped: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SyncLog {
    pub sync_id: i64,
    pub user_id: i64,
    pub sync_type: String,
    pub status: String,
    pub items_processed: Option<i64>,
    pub items_total: Option<i64>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogStats {
    pub playlists_count: i64,
    pub songs_count: i64,
    pub artists_count: i64,
}

/// `?search=` and `?ordering=` parameters of catalog listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub ordering: Option<String>,
}

// ============ Write models ============

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub scope: Option<String>,
    pub spotify_user_id: Option<String>,
}

/// Artist fields written by the sync job. `None` fields keep what is stored.
#[derive(Debug, Clone, Default)]
pub struct UpsertArtist {
    pub spotify_id: String,
    pub name: String,
    pub spotify_url: Option<String>,
    pub image_url: Option<String>,
    pub popularity: Option<i64>,
    pub followers: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct UpsertAlbum {
    pub spotify_id: String,
    pub artist_id: i64,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub release_year: Option<i64>,
    pub album_type: Option<String>,
    pub cover_image_url: Option<String>,
    pub total_tracks: Option<i64>,
    pub spotify_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpsertSong {
    pub spotify_id: String,
    pub album_id: i64,
    pub title: String,
    pub duration: i64,
    pub track_number: Option<i64>,
    pub disc_number: Option<i64>,
    pub explicit_content: bool,
    pub preview_url: Option<String>,
    pub spotify_url: Option<String>,
    pub popularity: Option<i64>,
    pub isrc: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpsertPlaylist {
    pub user_id: i64,
    pub spotify_id: String,
    pub name: String,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
    pub snapshot_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlaylist {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistChanges {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

/// Entry written when a playlist is mirrored from Spotify
#[derive(Debug, Clone)]
pub struct NewPlaylistEntry {
    pub song_id: i64,
    /// 1-based position in the remote playlist
    pub position: i64,
    pub date_added: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDevice {
    #[serde(default)]
    pub device_name: Option<String>,
    pub device_type: String,
    #[serde(default)]
    pub operating_system: Option<String>,
    #[serde(default)]
    pub browser: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPlayback {
    pub user_id: i64,
    pub song_id: i64,
    pub device_id: i64,
    pub completed: bool,
    pub playback_duration: Option<i64>,
    pub rating: Option<i64>,
    pub skipped: Option<bool>,
}
