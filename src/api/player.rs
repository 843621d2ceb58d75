//! Playback state and remote control.
//!
//! Reading the state of an unlinked account is a 401. Commands report the
//! same condition as 503, since the player itself is unavailable.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiJson, AppState, CurrentUser, json_or_default};
use crate::{
    error::{ApiResult, AppError},
    spotify::player::{REPEAT_STATES, resolve_play_request},
};

#[derive(Debug, Default, Deserialize)]
pub struct DeviceRequest {
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayRequest {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub context_uri: Option<String>,
    #[serde(default)]
    pub uris: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub position_ms: i64,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShuffleRequest {
    pub state: bool,
    #[serde(default)]
    pub device_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RepeatRequest {
    pub state: String,
    #[serde(default)]
    pub device_id: Option<String>,
}

fn done(message: impl Into<String>) -> Json<Value> {
    Json(json!({ "status": "success", "message": message.into() }))
}

/// Current playback, or 204 when nothing is playing
pub async fn current(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Response> {
    let client = state.spotify(user.id).await?;

    let Some(playback) = client.current_playback().await? else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    let Some(item) = playback.item else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let album = item.album.as_ref();
    Ok(Json(json!({
        "is_playing": playback.is_playing,
        "progress_ms": playback.progress_ms,
        "shuffle_state": playback.shuffle_state,
        "repeat_state": playback.repeat_state,
        "device": playback.device,
        "item": {
            "id": item.id,
            "name": item.name,
            "uri": item.uri,
            "duration_ms": item.duration_ms,
            "album": {
                "name": album.map(|a| a.name.clone()),
                "images": album.map(|a| a.images.clone()).unwrap_or_default(),
            },
            "artists": item
                .artists
                .iter()
                .map(|a| json!({ "id": a.id, "name": a.name }))
                .collect::<Vec<_>>(),
        },
    }))
    .into_response())
}

pub async fn devices(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Value>> {
    let client = state.spotify(user.id).await?;
    let devices = client.devices().await?;
    Ok(Json(json!({ "devices": devices })))
}

pub async fn play(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let req: PlayRequest = json_or_default(&body)?;
    let client = state.spotify_for_command(user.id).await?;
    let request = resolve_play_request(
        req.uri.as_deref(),
        req.context_uri.as_deref(),
        req.uris.as_deref(),
    );
    client
        .start_playback(req.device_id.as_deref(), request.as_ref())
        .await?;
    Ok(done("Playback started"))
}

pub async fn pause(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let req: DeviceRequest = json_or_default(&body)?;
    let client = state.spotify_for_command(user.id).await?;
    client.pause_playback(req.device_id.as_deref()).await?;
    Ok(done("Playback paused"))
}

pub async fn next(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let req: DeviceRequest = json_or_default(&body)?;
    let client = state.spotify_for_command(user.id).await?;
    client.next_track(req.device_id.as_deref()).await?;
    Ok(done("Skipped to next track"))
}

pub async fn previous(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let req: DeviceRequest = json_or_default(&body)?;
    let client = state.spotify_for_command(user.id).await?;
    client.previous_track(req.device_id.as_deref()).await?;
    Ok(done("Back to previous track"))
}

pub async fn seek(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<SeekRequest>,
) -> ApiResult<Json<Value>> {
    if req.position_ms < 0 {
        return Err(AppError::bad_request("position_ms must not be negative"));
    }
    let client = state.spotify_for_command(user.id).await?;
    client
        .seek_track(req.position_ms as u64, req.device_id.as_deref())
        .await?;
    Ok(done(format!("Position set to {}ms", req.position_ms)))
}

pub async fn shuffle(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ShuffleRequest>,
) -> ApiResult<Json<Value>> {
    let client = state.spotify_for_command(user.id).await?;
    client.shuffle(req.state, req.device_id.as_deref()).await?;
    Ok(done(if req.state {
        "Shuffle enabled"
    } else {
        "Shuffle disabled"
    }))
}

pub async fn repeat(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<RepeatRequest>,
) -> ApiResult<Json<Value>> {
    if !REPEAT_STATES.contains(&req.state.as_str()) {
        return Err(AppError::bad_request(format!(
            "state must be one of {}",
            REPEAT_STATES.join(", ")
        )));
    }
    let client = state.spotify_for_command(user.id).await?;
    client.repeat(&req.state, req.device_id.as_deref()).await?;
    Ok(done(format!("Repeat mode: {}", req.state)))
}
