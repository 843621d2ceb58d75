//! Favorite songs and artists

use chrono::Utc;
use sqlx::SqlitePool;

use super::SONG_SUMMARY_SELECT;
use crate::db::{FavoriteArtist, FavoriteSong};

pub async fn list_favorite_songs(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<FavoriteSong>> {
    let sql = SONG_SUMMARY_SELECT.replacen("SELECT s.song_id", "SELECT f.favorited_at, s.song_id", 1);
    let sql = format!(
        "{sql} INNER JOIN user_favorite_songs f ON f.song_id = s.song_id WHERE f.user_id = ? ORDER BY f.favorited_at DESC, f.id DESC"
    );
    sqlx::query_as::<_, FavoriteSong>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Returns `false` when the song was already a favorite
pub async fn add_favorite_song(pool: &SqlitePool, user_id: i64, song_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO user_favorite_songs (user_id, song_id, favorited_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(song_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns `false` when the song was not a favorite
pub async fn remove_favorite_song(pool: &SqlitePool, user_id: i64, song_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM user_favorite_songs WHERE user_id = ? AND song_id = ?")
        .bind(user_id)
        .bind(song_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn list_favorite_artists(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<FavoriteArtist>> {
    sqlx::query_as::<_, FavoriteArtist>(
        r#"
        SELECT a.artist_id, a.name, a.image_url, a.spotify_id, f.favorited_at
        FROM user_favorite_artists f
        INNER JOIN artists a ON a.artist_id = f.artist_id
        WHERE f.user_id = ?
        ORDER BY f.favorited_at DESC, f.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn add_favorite_artist(pool: &SqlitePool, user_id: i64, artist_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO user_favorite_artists (user_id, artist_id, favorited_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(artist_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove_favorite_artist(pool: &SqlitePool, user_id: i64, artist_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM user_favorite_artists WHERE user_id = ? AND artist_id = ?")
        .bind(user_id)
        .bind(artist_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
