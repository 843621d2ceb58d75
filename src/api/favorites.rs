//! Favorite songs and artists of the caller, newest first.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiJson, AppState, CurrentUser};
use crate::{
    db::{FavoriteArtist, FavoriteSong},
    error::{ApiResult, AppError},
};

#[derive(Debug, Deserialize)]
pub struct SongRef {
    pub song_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ArtistRef {
    pub artist_id: i64,
}

pub async fn list_songs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<FavoriteSong>>> {
    Ok(Json(state.db.list_favorite_songs(user.id).await?))
}

pub async fn add_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<SongRef>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if state.db.get_song(req.song_id).await?.is_none() {
        return Err(AppError::not_found("Song not found"));
    }
    if !state.db.add_favorite_song(user.id, req.song_id).await? {
        return Err(AppError::bad_request("Song is already a favorite"));
    }
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Song added to favorites" })),
    ))
}

pub async fn remove_song(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<SongRef>,
) -> ApiResult<Json<Value>> {
    if !state.db.remove_favorite_song(user.id, req.song_id).await? {
        return Err(AppError::not_found("Song is not a favorite"));
    }
    Ok(Json(json!({ "message": "Song removed from favorites" })))
}

pub async fn list_artists(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<FavoriteArtist>>> {
    Ok(Json(state.db.list_favorite_artists(user.id).await?))
}

pub async fn add_artist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ArtistRef>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if state.db.get_artist(req.artist_id).await?.is_none() {
        return Err(AppError::not_found("Artist not found"));
    }
    if !state.db.add_favorite_artist(user.id, req.artist_id).await? {
        return Err(AppError::bad_request("Artist is already a favorite"));
    }
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Artist added to favorites" })),
    ))
}

pub async fn remove_artist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(req): ApiJson<ArtistRef>,
) -> ApiResult<Json<Value>> {
    if !state.db.remove_favorite_artist(user.id, req.artist_id).await? {
        return Err(AppError::not_found("Artist is not a favorite"));
    }
    Ok(Json(json!({ "message": "Artist removed from favorites" })))
}
