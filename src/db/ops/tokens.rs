//! Stored Spotify OAuth tokens, one row per user

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::db::{SpotifyToken, TokenRecord};

pub async fn get_token_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> sqlx::Result<Option<SpotifyToken>> {
    sqlx::query_as::<_, SpotifyToken>("SELECT * FROM spotify_user_tokens WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_token_by_spotify_user(
    pool: &SqlitePool,
    spotify_user_id: &str,
) -> sqlx::Result<Option<SpotifyToken>> {
    sqlx::query_as::<_, SpotifyToken>(
        "SELECT * FROM spotify_user_tokens WHERE spotify_user_id = ?",
    )
    .bind(spotify_user_id)
    .fetch_optional(pool)
    .await
}

/// Insert or replace the token row of a user
pub async fn save_token(pool: &SqlitePool, user_id: i64, token: &TokenRecord) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO spotify_user_tokens (user_id, access_token, refresh_token, expires_at, scope, spotify_user_id)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            access_token = excluded.access_token,
            refresh_token = COALESCE(excluded.refresh_token, spotify_user_tokens.refresh_token),
            expires_at = excluded.expires_at,
            scope = excluded.scope,
            spotify_user_id = COALESCE(excluded.spotify_user_id, spotify_user_tokens.spotify_user_id)
        "#,
    )
    .bind(user_id)
    .bind(&token.access_token)
    .bind(&token.refresh_token)
    .bind(token.expires_at)
    .bind(&token.scope)
    .bind(&token.spotify_user_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Store the result of a refresh-token exchange
pub async fn update_refreshed_token(
    pool: &SqlitePool,
    token_id: i64,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: DateTime<Utc>,
    scope: Option<&str>,
) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE spotify_user_tokens SET access_token = ?, refresh_token = ?, expires_at = ?, scope = ? WHERE token_id = ?",
    )
    .bind(access_token)
    .bind(refresh_token)
    .bind(expires_at)
    .bind(scope)
    .bind(token_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Returns whether a token was removed
pub async fn delete_token(pool: &SqlitePool, user_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM spotify_user_tokens WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
