//! Read-only catalog endpoints over the local database.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiPath, ApiQuery, AppState, CurrentUser};
use crate::{
    db::{AlbumWithArtist, Artist, Genre, ListQuery, SongDetail, SongSummary},
    error::{ApiResult, AppError},
    utils,
};

const TOP_TRACKS_MARKET: &str = "US";

pub async fn list_artists(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<Artist>>> {
    Ok(Json(state.db.list_artists(&query).await?))
}

async fn artist_or_404(state: &AppState, id: i64) -> ApiResult<Artist> {
    state
        .db
        .get_artist(id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist not found"))
}

pub async fn get_artist(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Artist>> {
    Ok(Json(artist_or_404(&state, id).await?))
}

pub async fn artist_albums(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Vec<AlbumWithArtist>>> {
    let artist = artist_or_404(&state, id).await?;
    Ok(Json(state.db.albums_for_artist(artist.artist_id).await?))
}

/// Top tracks of a stored artist, fetched live from Spotify
pub async fn artist_top_tracks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Value>> {
    let artist = artist_or_404(&state, id).await?;
    let spotify_id = artist
        .spotify_id
        .ok_or_else(|| AppError::bad_request("Artist has no Spotify ID"))?;

    let client = state.spotify(user.id).await?;
    let tracks = client
        .artist_top_tracks(&spotify_id, TOP_TRACKS_MARKET)
        .await?;

    let tracks = tracks
        .iter()
        .map(|t| {
            json!({
                "id": t.id,
                "name": t.name,
                "uri": t.uri,
                "popularity": t.popularity,
                "preview_url": t.preview_url,
                "album": t.album.as_ref().map(|a| a.name.clone()),
                "image": t.album.as_ref().and_then(|a| utils::first_image_url(&a.images)),
                "duration_ms": t.duration_ms,
                "duration_formatted": utils::format_duration(t.duration_ms),
            })
        })
        .collect::<Vec<_>>();

    Ok(Json(json!({ "artist": artist.name, "tracks": tracks })))
}

pub async fn list_albums(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<AlbumWithArtist>>> {
    Ok(Json(state.db.list_albums(&query).await?))
}

pub async fn get_album(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<AlbumWithArtist>> {
    state
        .db
        .get_album(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Album not found"))
}

pub async fn album_tracks(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Vec<SongDetail>>> {
    if state.db.get_album(id).await?.is_none() {
        return Err(AppError::not_found("Album not found"));
    }
    Ok(Json(state.db.songs_for_album(id).await?))
}

pub async fn list_songs(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Vec<SongSummary>>> {
    Ok(Json(state.db.list_songs(&query).await?))
}

/// Full song with album, artist and genres
pub async fn get_song(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Value>> {
    let song = state
        .db
        .get_song(id)
        .await?
        .ok_or_else(|| AppError::not_found("Song not found"))?;
    let genres = state.db.genres_for_song(id).await?;

    let mut body = serde_json::to_value(&song).map_err(|e| AppError::Internal(e.to_string()))?;
    body["genres"] = json!(genres);
    Ok(Json(body))
}

#[derive(Debug, Default, Deserialize)]
pub struct GenreQuery {
    #[serde(default)]
    pub search: Option<String>,
}

pub async fn list_genres(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<GenreQuery>,
) -> ApiResult<Json<Vec<Genre>>> {
    Ok(Json(state.db.list_genres(query.search.as_deref()).await?))
}

pub async fn get_genre(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Json<Genre>> {
    state
        .db
        .get_genre(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Genre not found"))
}
