//! Devices and playback history

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::{NewDevice, NewPlayback, PlaybackRecord};

/// Reuse a device with the same name and type, or register a new one
pub async fn find_or_create_device(pool: &SqlitePool, device: &NewDevice) -> sqlx::Result<i64> {
    let existing: Option<i64> = sqlx::query_scalar(
        "SELECT device_id FROM devices WHERE device_name IS ? AND device_type = ? ORDER BY device_id LIMIT 1",
    )
    .bind(&device.device_name)
    .bind(&device.device_type)
    .fetch_optional(pool)
    .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let result = sqlx::query(
        "INSERT INTO devices (device_name, device_type, operating_system, browser, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&device.device_name)
    .bind(&device.device_type)
    .bind(&device.operating_system)
    .bind(&device.browser)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn record_playback(pool: &SqlitePool, playback: &NewPlayback) -> sqlx::Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO playback_history (user_id, song_id, device_id, playback_date, completed,
                                      playback_duration, rating, skipped)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(playback.user_id)
    .bind(playback.song_id)
    .bind(playback.device_id)
    .bind(Utc::now())
    .bind(playback.completed)
    .bind(playback.playback_duration)
    .bind(playback.rating)
    .bind(playback.skipped)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Most recent plays of a user first
pub async fn list_playback_history(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> sqlx::Result<Vec<PlaybackRecord>> {
    sqlx::query_as::<_, PlaybackRecord>(
        r#"
        SELECT h.playback_id, h.song_id, s.title AS song_title, h.device_id, d.device_name,
               d.device_type, h.playback_date, h.completed, h.playback_duration, h.rating, h.skipped
        FROM playback_history h
        INNER JOIN songs s ON s.song_id = h.song_id
        INNER JOIN devices d ON d.device_id = h.device_id
        WHERE h.user_id = ?
        ORDER BY h.playback_date DESC, h.playback_id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}
