use axum::{Json, body::Bytes, extract::State};
use serde_json::{Value, json};

use super::{AppState, CurrentUser, json_or_default};
use crate::{
    error::ApiResult,
    management::{SyncOptions, SyncService},
};

/// Link state and the latest finished sync of the caller
pub async fn status(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Value>> {
    let linked = state.db.get_token_for_user(user.id).await?.is_some();
    let last_sync = state.db.last_sync_log(user.id).await?;
    let is_syncing = state.db.is_syncing(user.id).await?;

    Ok(Json(json!({
        "user": user.username,
        "spotify_linked": linked,
        "last_sync": last_sync,
        "last_sync_date": last_sync.as_ref().and_then(|s| s.completed_at),
        "is_syncing": is_syncing,
    })))
}

/// Runs a sync in the request. An empty body syncs everything.
pub async fn run(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let options: SyncOptions = json_or_default(&body)?;
    let client = state.spotify(user.id).await?;

    let results = SyncService::new(state.db.clone(), client, user.id)
        .full_sync(&options)
        .await?;

    Ok(Json(json!({
        "message": "Sync completed",
        "results": results,
    })))
}
