//! # API Module
//!
//! JSON handlers mounted under `/api` by [`crate::server::router`].
//!
//! ## Caller identity
//!
//! Handlers that act on behalf of a user take a [`CurrentUser`], which reads
//! the numeric `X-User-Id` header and checks that the user exists. A missing
//! or unknown id is rejected with 401 before the handler runs. The OAuth
//! callback takes a [`MaybeUser`] instead, because it also serves sign-up.
//!
//! ## Endpoints
//!
//! - [`spotify`] - account linking, status, dashboard and remote browsing
//! - [`player`] - playback state and remote control
//! - [`catalog`] - artists, albums, songs and genres from the local DB
//! - [`playlists`] - playlists owned by the caller
//! - [`favorites`] - favorite songs and artists
//! - [`search`] - Spotify catalog search
//! - [`sync`] - library sync status and trigger
//! - [`history`] - playback history
//! - [`health`] - liveness

pub mod catalog;
pub mod favorites;
mod health;
pub mod history;
pub mod player;
pub mod playlists;
pub mod search;
pub mod spotify;
pub mod sync;

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

pub use health::health;

use crate::{
    config::SpotifySettings,
    db::{Database, User},
    error::{AppError, SpotifyError},
    management::TokenManager,
    spotify::SpotifyClient,
    types::PkceState,
};

/// Header carrying the numeric id of the calling user
pub const USER_HEADER: &str = "x-user-id";

/// Pending authorization requests older than this are dropped
pub const PENDING_AUTH_TTL: Duration = Duration::from_secs(600);

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Arc<SpotifySettings>,
    pub http: Client,
    /// PKCE verifiers keyed by OAuth `state`
    pub pending_auth: Arc<Mutex<HashMap<String, PkceState>>>,
}

impl AppState {
    pub fn new(db: Database, settings: SpotifySettings) -> Self {
        Self {
            db,
            settings: Arc::new(settings),
            http: Client::new(),
            pending_auth: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn token_manager(&self, user_id: i64) -> Result<TokenManager, SpotifyError> {
        TokenManager::for_user(&self.db, &self.settings, &self.http, user_id).await
    }

    /// Client bound to the user's (refreshed if needed) access token
    pub async fn spotify(&self, user_id: i64) -> Result<SpotifyClient, SpotifyError> {
        self.token_manager(user_id).await?.client().await
    }

    /// Like [`AppState::spotify`], but an unlinked account is reported as
    /// 503 as player commands expect.
    pub async fn spotify_for_command(&self, user_id: i64) -> Result<SpotifyClient, AppError> {
        match self.spotify(user_id).await {
            Err(SpotifyError::NotLinked) => Err(AppError::ServiceUnavailable(
                "Spotify is not connected".to_string(),
            )),
            other => Ok(other?),
        }
    }
}

/// The authenticated caller
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The caller if `X-User-Id` is present
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

fn unauthorized() -> AppError {
    AppError::Unauthorized("Authentication required".to_string())
}

async fn user_from_header(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(raw) = parts.headers.get(USER_HEADER) else {
        return Ok(None);
    };

    let id = raw
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(unauthorized)?;

    match state.db.get_user(id).await? {
        Some(user) => Ok(Some(user)),
        None => Err(unauthorized()),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        user_from_header(parts, state)
            .await?
            .map(CurrentUser)
            .ok_or_else(unauthorized)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(user_from_header(parts, state).await?))
    }
}

/// Parse an optional JSON body; an empty body yields `T::default()`.
pub(crate) fn json_or_default<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::bad_request(format!("Invalid JSON body: {e}")))
}

/// `Json` body whose rejection renders as the error envelope
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// `Path` parameters whose rejection renders as the error envelope
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(ApiPath(value))
    }
}

/// `Query` string whose rejection renders as the error envelope
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ApiQuery(value))
    }
}
