//! Playlists owned by the caller.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiJson, ApiPath, AppState, CurrentUser};
use crate::{
    db::{NewPlaylist, Playlist, PlaylistChanges, PlaylistWithCount},
    error::{ApiResult, AppError},
};

/// Accepted values of a playlist's `status`
pub const PLAYLIST_STATUSES: [&str; 2] = ["private", "public"];

#[derive(Debug, Deserialize)]
pub struct AddSongRequest {
    pub song_id: i64,
    #[serde(default)]
    pub position: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveSongRequest {
    pub song_id: i64,
}

async fn owned_playlist(state: &AppState, user_id: i64, id: i64) -> ApiResult<Playlist> {
    state
        .db
        .get_playlist(user_id, id)
        .await?
        .ok_or_else(|| AppError::not_found("Playlist not found"))
}

fn check_status(status: Option<&str>) -> ApiResult<()> {
    match status {
        Some(s) if !PLAYLIST_STATUSES.contains(&s) => Err(AppError::bad_request(format!(
            "status must be one of {}",
            PLAYLIST_STATUSES.join(", ")
        ))),
        _ => Ok(()),
    }
}

async fn name_taken(state: &AppState, user_id: i64, name: &str, except: Option<i64>) -> ApiResult<bool> {
    let playlists = state.db.list_playlists(user_id).await?;
    Ok(playlists
        .iter()
        .any(|p| p.playlist.name == name && Some(p.playlist.playlist_id) != except))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<PlaylistWithCount>>> {
    Ok(Json(state.db.list_playlists(user.id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<NewPlaylist>,
) -> ApiResult<(StatusCode, Json<Playlist>)> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::bad_request("name must not be empty"));
    }
    check_status(req.status.as_deref())?;
    if name_taken(&state, user.id, &name, None).await? {
        return Err(AppError::bad_request("You already have a playlist with this name"));
    }

    let new = NewPlaylist {
        name,
        description: req.description,
        status: req.status,
    };
    let id = state.db.create_playlist(user.id, &new).await?;
    let playlist = owned_playlist(&state, user.id, id).await?;
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// Playlist with its songs ordered by position
pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    let playlist = owned_playlist(&state, user.id, id).await?;
    let songs = state.db.playlist_entries(id).await?;

    let mut body = serde_json::to_value(&playlist).map_err(|e| AppError::Internal(e.to_string()))?;
    body["songs_count"] = json!(songs.len());
    body["songs"] = json!(songs);
    Ok(Json(body))
}

/// Partial update, used for both PUT and PATCH
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<PlaylistChanges>,
) -> ApiResult<Json<Playlist>> {
    owned_playlist(&state, user.id, id).await?;
    check_status(changes.status.as_deref())?;

    if let Some(name) = changes.name.as_deref() {
        if name.trim().is_empty() {
            return Err(AppError::bad_request("name must not be empty"));
        }
        if name_taken(&state, user.id, name.trim(), Some(id)).await? {
            return Err(AppError::bad_request("You already have a playlist with this name"));
        }
    }

    let changes = PlaylistChanges {
        name: changes.name.map(|n| n.trim().to_string()),
        description: changes.description,
        status: changes.status,
        cover_image_url: changes.cover_image_url,
    };
    state.db.update_playlist(id, &changes).await?;
    Ok(Json(owned_playlist(&state, user.id, id).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    owned_playlist(&state, user.id, id).await?;
    state.db.delete_playlist(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<AddSongRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    owned_playlist(&state, user.id, id).await?;
    let song = state
        .db
        .get_song(req.song_id)
        .await?
        .ok_or_else(|| AppError::not_found("Song not found"))?;

    if state.db.playlist_contains(id, req.song_id).await? {
        return Err(AppError::bad_request("Song is already in the playlist"));
    }

    let position = state
        .db
        .add_song_to_playlist(id, req.song_id, req.position, user.id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": format!("\"{}\" added to the playlist", song.song.title),
            "position": position,
        })),
    ))
}

pub async fn remove_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<RemoveSongRequest>,
) -> ApiResult<Json<Value>> {
    owned_playlist(&state, user.id, id).await?;
    if !state.db.remove_song_from_playlist(id, req.song_id).await? {
        return Err(AppError::not_found("Song is not in the playlist"));
    }
    Ok(Json(json!({ "message": "Song removed from the playlist" })))
}
