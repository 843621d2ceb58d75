//! Sync run bookkeeping

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::SyncLog;

pub const SYNC_RUNNING: &str = "running";
pub const SYNC_COMPLETED: &str = "completed";
pub const SYNC_FAILED: &str = "failed";

pub async fn start_sync_log(pool: &SqlitePool, user_id: i64, sync_type: &str) -> sqlx::Result<i64> {
    let result = sqlx::query(
        "INSERT INTO spotify_sync_log (user_id, sync_type, status, items_processed, started_at) VALUES (?, ?, ?, 0, ?)",
    )
    .bind(user_id)
    .bind(sync_type)
    .bind(SYNC_RUNNING)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn finish_sync_log(
    pool: &SqlitePool,
    sync_id: i64,
    status: &str,
    items_processed: i64,
    error_message: Option<&str>,
) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE spotify_sync_log SET status = ?, items_processed = ?, error_message = ?, completed_at = ? WHERE sync_id = ?",
    )
    .bind(status)
    .bind(items_processed)
    .bind(error_message)
    .bind(Utc::now())
    .bind(sync_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Latest finished sync of a user
pub async fn last_sync_log(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Option<SyncLog>> {
    sqlx::query_as::<_, SyncLog>(
        "SELECT * FROM spotify_sync_log WHERE user_id = ? AND status != ? ORDER BY sync_id DESC LIMIT 1",
    )
    .bind(user_id)
    .bind(SYNC_RUNNING)
    .fetch_optional(pool)
    .await
}

pub async fn is_syncing(pool: &SqlitePool, user_id: i64) -> sqlx::Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM spotify_sync_log WHERE user_id = ? AND status = ?",
    )
    .bind(user_id)
    .bind(SYNC_RUNNING)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}
