use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiQuery, AppState, CurrentUser};
use crate::{
    error::{ApiResult, AppError},
    utils,
};

pub const SEARCH_TYPES: [&str; 4] = ["track", "artist", "album", "playlist"];
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
pub const MAX_SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, rename = "type")]
    pub search_type: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// `limit` clamped to 1..=50, 20 when absent
pub fn clamp_limit(limit: Option<i64>) -> u32 {
    limit
        .map(|l| l.clamp(1, i64::from(MAX_SEARCH_LIMIT)) as u32)
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
}

/// Searches the Spotify catalog on behalf of the caller
pub async fn search(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> ApiResult<Json<Value>> {
    let q = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::bad_request("Query parameter q is required"))?;

    let types = params.search_type.as_deref().unwrap_or("track");
    if types.split(',').any(|t| !SEARCH_TYPES.contains(&t.trim())) {
        return Err(AppError::bad_request(format!(
            "type must be one of {}",
            SEARCH_TYPES.join(", ")
        )));
    }
    let limit = clamp_limit(params.limit);

    let client = state.spotify(user.id).await?;
    let res = client.search(q, types, limit).await?;

    let mut body = json!({ "query": q, "type": types });
    if let Some(tracks) = res.tracks {
        body["tracks"] = tracks
            .items
            .iter()
            .map(|t| {
                json!({
                    "id": t.id,
                    "name": t.name,
                    "uri": t.uri,
                    "artist": utils::join_artist_names(&t.artists),
                    "album": t.album.as_ref().map(|a| a.name.clone()),
                    "image": t.album.as_ref().and_then(|a| utils::first_image_url(&a.images)),
                    "duration_ms": t.duration_ms,
                    "duration_formatted": utils::format_duration(t.duration_ms),
                    "preview_url": t.preview_url,
                })
            })
            .collect();
    }
    if let Some(artists) = res.artists {
        body["artists"] = artists
            .items
            .iter()
            .map(|a| {
                json!({
                    "id": a.id,
                    "name": a.name,
                    "uri": a.uri,
                    "image": utils::first_image_url(&a.images),
                    "genres": a.genres,
                    "popularity": a.popularity,
                    "followers": a.followers.as_ref().map(|f| f.total),
                })
            })
            .collect();
    }
    if let Some(albums) = res.albums {
        body["albums"] = albums
            .items
            .iter()
            .map(|a| {
                json!({
                    "id": a.id,
                    "name": a.name,
                    "uri": a.uri,
                    "artist": utils::join_artist_names(&a.artists),
                    "image": utils::first_image_url(&a.images),
                    "release_date": a.release_date,
                    "type": a.album_type,
                })
            })
            .collect();
    }
    if let Some(playlists) = res.playlists {
        body["playlists"] = playlists
            .items
            .iter()
            .flatten()
            .map(|p| {
                json!({
                    "id": p.id,
                    "name": p.name,
                    "uri": p.uri,
                    "owner": p.owner.display_name,
                    "image": utils::first_image_url(&p.images),
                    "tracks_total": p.tracks.total,
                })
            })
            .collect();
    }

    Ok(Json(body))
}
