//! Spotify account linking, status, dashboard and remote browsing.

use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiJson, ApiPath, ApiQuery, AppState, CurrentUser, MaybeUser, PENDING_AUTH_TTL};
use crate::{
    db::{NewUser, TokenRecord, User},
    error::{ApiResult, AppError, SpotifyError},
    spotify::{SpotifyClient, auth},
    types::{FullTrack, PkceState, PrivateUser, SimplifiedPlaylist, SimplifiedTrack, TokenResponse},
    utils,
};

const DASHBOARD_PLAYLISTS: u32 = 20;
const DASHBOARD_TOP_TRACKS: u32 = 6;
const DASHBOARD_RECENT: u32 = 6;
const DASHBOARD_TOP_ARTISTS: u32 = 5;
const BROWSE_TOP_TRACKS: usize = 10;
const BROWSE_ALBUMS: u32 = 20;
const MARKET: &str = "US";

// ============ Authorization ============

/// Starts an authorization request and returns the consent URL.
pub async fn auth_url(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let oauth_state = utils::generate_state();

    let url = auth::authorize_url(&state.settings, &oauth_state, &code_challenge)?;

    {
        let mut pending = state.pending_auth.lock().await;
        pending.retain(|_, p| p.created_at.elapsed() < PENDING_AUTH_TTL);
        pending.insert(
            oauth_state.clone(),
            PkceState {
                code_verifier,
                created_at: Instant::now(),
            },
        );
    }

    Ok(Json(json!({ "auth_url": url, "state": oauth_state })))
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Redirect target of the consent page
pub async fn callback_get(
    State(state): State<AppState>,
    user: MaybeUser,
    ApiQuery(params): ApiQuery<CallbackParams>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    complete_callback(&state, user.0, params).await
}

/// Same as [`callback_get`] for clients that forward the code themselves
pub async fn callback_post(
    State(state): State<AppState>,
    user: MaybeUser,
    ApiJson(params): ApiJson<CallbackParams>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    complete_callback(&state, user.0, params).await
}

async fn complete_callback(
    state: &AppState,
    caller: Option<User>,
    params: CallbackParams,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if let Some(error) = params.error {
        return Err(AppError::bad_request(format!("Spotify authorization failed: {error}")));
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing authorization code"))?;

    let code_verifier = match params.state {
        Some(oauth_state) => {
            let pending = state.pending_auth.lock().await.remove(&oauth_state);
            match pending {
                Some(p) if p.created_at.elapsed() < PENDING_AUTH_TTL => Some(p.code_verifier),
                _ => return Err(AppError::bad_request("Invalid or expired state")),
            }
        }
        None => None,
    };

    let tokens = auth::exchange_code(&state.http, &state.settings, &code, code_verifier.as_deref())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "authorization code exchange failed");
            AppError::bad_request("Failed to obtain tokens from Spotify")
        })?;

    let profile = SpotifyClient::with_http(
        state.http.clone(),
        &state.settings.api_url,
        &tokens.access_token,
    )
    .current_user()
    .await
    .map_err(|e| {
        tracing::warn!(error = %e, "fetching Spotify profile failed");
        AppError::bad_request("Could not fetch your Spotify profile")
    })?;

    let existing = state.db.find_token_by_spotify_user(&profile.id).await?;

    // Link mode: attach the account to the calling user
    if let Some(user) = caller {
        if let Some(token) = existing.filter(|t| t.user_id != user.id) {
            let owner = state.db.get_user(token.user_id).await?;
            let owner = owner.map(|u| u.username).unwrap_or_default();
            return Err(AppError::bad_request(format!(
                "This Spotify account is already linked to user \"{owner}\""
            )));
        }
        save_tokens(state, user.id, &tokens, &profile.id).await?;
        tracing::info!(user_id = user.id, spotify_user_id = %profile.id, "Spotify account linked");
        return Ok((
            StatusCode::OK,
            Json(json!({
                "message": "Your Spotify account has been linked",
                "spotify_linked": true,
            })),
        ));
    }

    // Login mode: known link, known email, or a new user
    let (user, created) = match existing {
        Some(token) => {
            let user = state
                .db
                .get_user(token.user_id)
                .await?
                .ok_or_else(|| AppError::Internal("linked user disappeared".to_string()))?;
            (user, false)
        }
        None => find_or_create_user(state, &profile).await?,
    };

    save_tokens(state, user.id, &tokens, &profile.id).await?;
    tracing::info!(user_id = user.id, created, "signed in with Spotify");

    let message = login_message(created);
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(json!({
            "message": message,
            "user": user,
            "spotify_linked": true,
        })),
    ))
}

fn login_message(created: bool) -> &'static str {
    if created {
        "Account created with Spotify"
    } else {
        "Welcome back"
    }
}

async fn save_tokens(
    state: &AppState,
    user_id: i64,
    tokens: &TokenResponse,
    spotify_user_id: &str,
) -> ApiResult<()> {
    let record = TokenRecord {
        access_token: tokens.access_token.clone(),
        refresh_token: tokens.refresh_token.clone(),
        expires_at: Utc::now() + Duration::seconds(tokens.expires_in as i64),
        scope: tokens.scope.clone(),
        spotify_user_id: Some(spotify_user_id.to_string()),
    };
    state.db.save_token(user_id, &record).await?;
    Ok(())
}

/// Finds a user by the profile email or creates one.
///
/// The username is the email, or `<local-part>_<n>` when that is taken.
async fn find_or_create_user(state: &AppState, profile: &PrivateUser) -> ApiResult<(User, bool)> {
    let email = profile
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::bad_request("Spotify profile has no email"))?;

    if let Some(user) = state.db.find_user_by_email(email).await? {
        return Ok((user, false));
    }

    let mut attempt = 0;
    let username = loop {
        let candidate = utils::username_candidate(email, attempt);
        if !state.db.username_exists(&candidate).await? {
            break candidate;
        }
        attempt += 1;
    };

    let (first_name, last_name) =
        utils::split_display_name(profile.display_name.as_deref().unwrap_or_default());
    let id = state
        .db
        .create_user(NewUser {
            username,
            email: Some(email.to_string()),
            first_name,
            last_name,
        })
        .await?;

    let user = state
        .db
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::Internal("created user not found".to_string()))?;
    Ok((user, true))
}

// ============ Account ============

pub async fn status(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Value>> {
    let body = match state.db.get_token_for_user(user.id).await? {
        Some(token) => json!({
            "spotify_linked": true,
            "spotify_user_id": token.spotify_user_id,
            "expires_at": token.expires_at,
        }),
        None => json!({ "spotify_linked": false }),
    };
    Ok(Json(body))
}

pub async fn disconnect(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Value>> {
    let removed = state.db.delete_token(user.id).await?;
    if removed {
        tracing::info!(user_id = user.id, "Spotify account disconnected");
    }
    Ok(Json(json!({
        "message": "Spotify account disconnected",
        "spotify_linked": false,
    })))
}

/// Logs a failed remote call and substitutes an empty value.
fn or_empty<T: Default>(result: Result<T, SpotifyError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "dashboard: failed to load {what}");
        T::default()
    })
}

fn profile_json(profile: &PrivateUser) -> Value {
    json!({
        "id": profile.id,
        "display_name": profile.display_name,
        "email": profile.email,
        "country": profile.country,
        "followers": profile.followers.as_ref().map(|f| f.total).unwrap_or(0),
        "image": utils::first_image_url(&profile.images),
        "product": profile.product,
        "uri": profile.uri,
    })
}

fn playlist_json(playlist: &SimplifiedPlaylist) -> Value {
    json!({
        "id": playlist.id,
        "name": playlist.name,
        "description": playlist.description,
        "image": utils::first_image_url(&playlist.images),
        "tracks_total": playlist.tracks.total,
        "owner": playlist.owner.display_name,
        "uri": playlist.uri,
    })
}

fn track_json(track: &FullTrack) -> Value {
    json!({
        "id": track.id,
        "name": track.name,
        "artist": utils::join_artist_names(&track.artists),
        "album": track.album.as_ref().map(|a| a.name.clone()),
        "image": track.album.as_ref().and_then(|a| utils::first_image_url(&a.images)),
        "uri": track.uri,
        "duration_ms": track.duration_ms,
        "duration_formatted": utils::format_duration(track.duration_ms),
    })
}

fn album_track_json(track: &SimplifiedTrack) -> Value {
    json!({
        "id": track.id,
        "name": track.name,
        "uri": track.uri,
        "track_number": track.track_number,
        "duration_ms": track.duration_ms,
        "duration_formatted": utils::format_duration(track.duration_ms),
    })
}

/// Profile, library highlights and local catalog counts in one call
pub async fn dashboard(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<Json<Value>> {
    let client = state.spotify(user.id).await?;
    let db_stats = state.db.catalog_stats(user.id).await?;

    let profile = match client.current_user().await {
        Ok(p) => Some(profile_json(&p)),
        Err(e) => {
            tracing::warn!(error = %e, "dashboard: failed to load profile");
            None
        }
    };
    let playlists = or_empty(
        client
            .current_user_playlists(DASHBOARD_PLAYLISTS)
            .await
            .map(|p| p.items),
        "playlists",
    );
    let top_tracks = or_empty(
        client
            .current_user_top_tracks(DASHBOARD_TOP_TRACKS, "short_term")
            .await
            .map(|p| p.items),
        "top tracks",
    );
    let recently_played = or_empty(
        client
            .current_user_recently_played(DASHBOARD_RECENT)
            .await
            .map(|p| p.items),
        "recently played",
    );
    let top_artists = or_empty(
        client
            .current_user_top_artists(DASHBOARD_TOP_ARTISTS, "short_term")
            .await
            .map(|p| p.items),
        "top artists",
    );

    Ok(Json(json!({
        "spotify_connected": true,
        "user_profile": profile,
        "user_playlists": playlists.iter().map(playlist_json).collect::<Vec<_>>(),
        "top_tracks": top_tracks.iter().map(track_json).collect::<Vec<_>>(),
        "recently_played": recently_played
            .iter()
            .map(|h| {
                let mut track = track_json(&h.track);
                track["played_at"] = json!(h.played_at);
                track
            })
            .collect::<Vec<_>>(),
        "top_artists": top_artists
            .iter()
            .map(|a| json!({
                "id": a.id,
                "name": a.name,
                "image": utils::first_image_url(&a.images),
                "genres": a.genres,
                "popularity": a.popularity,
            }))
            .collect::<Vec<_>>(),
        "db_stats": db_stats,
    })))
}

// ============ Remote browsing ============

/// Artist profile with top tracks and deduplicated releases
pub async fn browse_artist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(spotify_id): ApiPath<String>,
) -> ApiResult<Json<Value>> {
    let client = state.spotify(user.id).await?;

    let artist = client.artist(&spotify_id).await?;
    let top_tracks = client.artist_top_tracks(&spotify_id, MARKET).await?;
    let mut albums = client
        .artist_albums(&spotify_id, "album,single", BROWSE_ALBUMS)
        .await?;
    utils::remove_duplicate_albums(&mut albums);

    Ok(Json(json!({
        "artist": {
            "id": artist.id,
            "name": artist.name,
            "image": utils::first_image_url(&artist.images),
            "followers": artist.followers.as_ref().map(|f| f.total).unwrap_or(0),
        },
        "top_tracks": top_tracks
            .iter()
            .take(BROWSE_TOP_TRACKS)
            .map(track_json)
            .collect::<Vec<_>>(),
        "albums": albums
            .iter()
            .map(|a| json!({
                "id": a.id,
                "name": a.name,
                "image": utils::first_image_url(&a.images),
                "release_year": a.release_date.as_deref().and_then(|d| d.get(..4)),
                "type": a.album_type,
            }))
            .collect::<Vec<_>>(),
    })))
}

/// Album details with its track listing
pub async fn browse_album(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(spotify_id): ApiPath<String>,
) -> ApiResult<Json<Value>> {
    let client = state.spotify(user.id).await?;
    let album = client.album(&spotify_id).await?;

    Ok(Json(json!({
        "album": {
            "id": album.id,
            "name": album.name,
            "artist_name": utils::join_artist_names(&album.artists),
            "image": utils::first_image_url(&album.images),
            "release_year": album.release_date.as_deref().and_then(|d| d.get(..4)),
            "total_tracks": album.total_tracks,
            "type": album.album_type,
        },
        "tracks": album.tracks.items.iter().map(album_track_json).collect::<Vec<_>>(),
    })))
}
