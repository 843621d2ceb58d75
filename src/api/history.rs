use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiJson, ApiQuery, AppState, CurrentUser};
use crate::{
    db::{NewDevice, NewPlayback, PlaybackRecord},
    error::{ApiResult, AppError},
};

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct RecordPlayback {
    pub song_id: i64,
    pub device: NewDevice,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub playback_duration: Option<i64>,
    #[serde(default)]
    pub rating: Option<i64>,
    #[serde(default)]
    pub skipped: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(default)]
    pub limit: Option<i64>,
}

pub async fn record(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<RecordPlayback>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if let Some(rating) = req.rating {
        if !(1..=5).contains(&rating) {
            return Err(AppError::bad_request("rating must be between 1 and 5"));
        }
    }
    if req.device.device_type.trim().is_empty() {
        return Err(AppError::bad_request("device_type is required"));
    }
    if state.db.get_song(req.song_id).await?.is_none() {
        return Err(AppError::not_found("Song not found"));
    }

    let device_id = state.db.find_or_create_device(&req.device).await?;
    let playback_id = state
        .db
        .record_playback(&NewPlayback {
            user_id: user.id,
            song_id: req.song_id,
            device_id,
            completed: req.completed,
            playback_duration: req.playback_duration,
            rating: req.rating,
            skipped: req.skipped,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "playback_id": playback_id, "device_id": device_id })),
    ))
}

/// The caller's plays, newest first
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<HistoryParams>,
) -> ApiResult<Json<Vec<PlaybackRecord>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    Ok(Json(state.db.list_playback_history(user.id, limit).await?))
}
