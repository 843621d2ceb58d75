//! Playlist CRUD operations

use chrono::Utc;
use sqlx::SqlitePool;

use super::SONG_SUMMARY_SELECT;
use crate::db::{
    NewPlaylist, NewPlaylistEntry, Playlist, PlaylistChanges, PlaylistEntry, PlaylistWithCount,
    UpsertPlaylist,
};

/// Playlists of a user, newest first
pub async fn list_playlists(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<PlaylistWithCount>> {
    sqlx::query_as::<_, PlaylistWithCount>(
        r#"
        SELECT p.*, (SELECT COUNT(*) FROM playlist_songs ps WHERE ps.playlist_id = p.playlist_id) AS songs_count
        FROM playlists p
        WHERE p.user_id = ?
        ORDER BY p.created_at DESC, p.playlist_id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn create_playlist(pool: &SqlitePool, user_id: i64, playlist: &NewPlaylist) -> sqlx::Result<i64> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO playlists (user_id, name, description, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(&playlist.name)
    .bind(&playlist.description)
    .bind(playlist.status.as_deref().unwrap_or("private"))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Get a playlist owned by `user_id`
pub async fn get_playlist(pool: &SqlitePool, user_id: i64, id: i64) -> sqlx::Result<Option<Playlist>> {
    sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE playlist_id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Songs of a playlist ordered by position
pub async fn playlist_entries(pool: &SqlitePool, playlist_id: i64) -> sqlx::Result<Vec<PlaylistEntry>> {
    let sql = SONG_SUMMARY_SELECT.replacen(
        "SELECT s.song_id",
        "SELECT ps.position, ps.date_added, s.song_id",
        1,
    );
    let sql = format!(
        "{sql} INNER JOIN playlist_songs ps ON ps.song_id = s.song_id WHERE ps.playlist_id = ? ORDER BY ps.position, ps.id"
    );
    sqlx::query_as::<_, PlaylistEntry>(&sql)
        .bind(playlist_id)
        .fetch_all(pool)
        .await
}

pub async fn update_playlist(pool: &SqlitePool, id: i64, changes: &PlaylistChanges) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE playlists SET
            name = COALESCE(?, name),
            description = COALESCE(?, description),
            status = COALESCE(?, status),
            cover_image_url = COALESCE(?, cover_image_url),
            updated_at = ?
        WHERE playlist_id = ?
        "#,
    )
    .bind(&changes.name)
    .bind(&changes.description)
    .bind(&changes.status)
    .bind(&changes.cover_image_url)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_playlist(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM playlists WHERE playlist_id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn playlist_contains(pool: &SqlitePool, playlist_id: i64, song_id: i64) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM playlist_songs WHERE playlist_id = ? AND song_id = ?",
    )
    .bind(playlist_id)
    .bind(song_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Add a song at `position`, or after the last entry when `None`.
///
/// Entries at or after an explicit position move down by one. Returns the
/// position used.
pub async fn add_song_to_playlist(
    pool: &SqlitePool,
    playlist_id: i64,
    song_id: i64,
    position: Option<i64>,
    added_by: i64,
) -> sqlx::Result<i64> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let max_pos: Option<i64> =
        sqlx::query_scalar("SELECT MAX(position) FROM playlist_songs WHERE playlist_id = ?")
            .bind(playlist_id)
            .fetch_one(&mut *tx)
            .await?;
    let next = max_pos.unwrap_or(0) + 1;

    let position = match position {
        Some(p) if p >= 1 && p < next => {
            sqlx::query(
                "UPDATE playlist_songs SET position = position + 1 WHERE playlist_id = ? AND position >= ?",
            )
            .bind(playlist_id)
            .bind(p)
            .execute(&mut *tx)
            .await?;
            p
        }
        _ => next,
    };

    sqlx::query(
        "INSERT INTO playlist_songs (playlist_id, song_id, position, date_added, added_by_user_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(playlist_id)
    .bind(song_id)
    .bind(position)
    .bind(now)
    .bind(added_by)
    .execute(&mut *tx)
    .await?;

    sqlx::query("UPDATE playlists SET updated_at = ? WHERE playlist_id = ?")
        .bind(now)
        .bind(playlist_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(position)
}

/// Returns whether the song was in the playlist
pub async fn remove_song_from_playlist(
    pool: &SqlitePool,
    playlist_id: i64,
    song_id: i64,
) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = ? AND song_id = ?")
        .bind(playlist_id)
        .bind(song_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Insert or update a playlist mirrored from Spotify.
///
/// A row already carrying the Spotify ID is updated in place, which follows
/// remote renames. A rename onto the name of another playlist of the same
/// user keeps the stored name. Otherwise the row is matched on (user, name).
pub async fn upsert_synced_playlist(pool: &SqlitePool, playlist: &UpsertPlaylist) -> sqlx::Result<i64> {
    let now = Utc::now();

    let existing: Option<(i64, String)> = sqlx::query_as(
        r#"
        UPDATE playlists SET
            name = CASE
                WHEN EXISTS (
                    SELECT 1 FROM playlists other
                    WHERE other.user_id = ?6 AND other.name = ?1 AND other.playlist_id != playlists.playlist_id
                ) THEN name
                ELSE ?1
            END,
            description = ?2, cover_image_url = ?3, spotify_snapshot_id = ?4,
            is_synced_with_spotify = 1, last_sync_date = ?5, updated_at = ?5
        WHERE spotify_id = ?7 AND user_id = ?6
        RETURNING playlist_id, name
        "#,
    )
    .bind(&playlist.name)
    .bind(&playlist.description)
    .bind(&playlist.cover_image_url)
    .bind(&playlist.snapshot_id)
    .bind(now)
    .bind(playlist.user_id)
    .bind(&playlist.spotify_id)
    .fetch_optional(pool)
    .await?;

    if let Some((id, name)) = existing {
        if name != playlist.name {
            tracing::warn!(
                playlist_id = id,
                kept = %name,
                remote = %playlist.name,
                "remote playlist name is taken by another playlist, keeping the stored name"
            );
        }
        return Ok(id);
    }

    sqlx::query_scalar(
        r#"
        INSERT INTO playlists (user_id, name, description, cover_image_url, spotify_id, spotify_snapshot_id,
                               is_synced_with_spotify, last_sync_date, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
        ON CONFLICT(user_id, name) DO UPDATE SET
            spotify_id = excluded.spotify_id,
            description = excluded.description,
            cover_image_url = excluded.cover_image_url,
            spotify_snapshot_id = excluded.spotify_snapshot_id,
            is_synced_with_spotify = 1,
            last_sync_date = excluded.last_sync_date,
            updated_at = excluded.updated_at
        RETURNING playlist_id
        "#,
    )
    .bind(playlist.user_id)
    .bind(&playlist.name)
    .bind(&playlist.description)
    .bind(&playlist.cover_image_url)
    .bind(&playlist.spotify_id)
    .bind(&playlist.snapshot_id)
    .bind(now)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

/// Replace all entries of a playlist in one transaction.
///
/// A song listed twice keeps its first position. Returns the number of rows
/// written.
pub async fn replace_playlist_entries(
    pool: &SqlitePool,
    playlist_id: i64,
    entries: &[NewPlaylistEntry],
) -> sqlx::Result<u64> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM playlist_songs WHERE playlist_id = ?")
        .bind(playlist_id)
        .execute(&mut *tx)
        .await?;

    let mut written = 0;
    for entry in entries {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO playlist_songs (playlist_id, song_id, position, date_added) VALUES (?, ?, ?, ?)",
        )
        .bind(playlist_id)
        .bind(entry.song_id)
        .bind(entry.position)
        .bind(entry.date_added)
        .execute(&mut *tx)
        .await?;
        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}
