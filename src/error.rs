//! Error types.
//!
//! [`SpotifyError`] covers everything that can go wrong while talking to
//! Spotify or refreshing a stored token. [`AppError`] is what HTTP handlers
//! return; it renders as one JSON envelope:
//!
//! ```json
//! { "error": true, "message": "Song not found", "status_code": 404 }
//! ```

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("cannot prepare data directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot load .env file: {0}")]
    Dotenv(String),
}

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("request to Spotify failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Spotify returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("rate limited by Spotify, retry after {0} seconds")]
    RateLimited(u64),
    #[error("no Spotify account linked")]
    NotLinked,
    #[error("token refresh failed: {0}")]
    TokenRefresh(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error(transparent)]
    Spotify(#[from] SpotifyError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, AppError>;

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Spotify(SpotifyError::NotLinked) => StatusCode::UNAUTHORIZED,
            AppError::Spotify(SpotifyError::RateLimited(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Spotify(SpotifyError::Database(e)) | AppError::Database(e) => {
                database_status(e)
            }
            AppError::Spotify(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Spotify(SpotifyError::Database(e)) | AppError::Database(e) => {
                match database_status(e) {
                    StatusCode::NOT_FOUND => "Resource not found".to_string(),
                    StatusCode::BAD_REQUEST => "Resource already exists".to_string(),
                    _ => "Internal server error".to_string(),
                }
            }
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

fn database_status(e: &sqlx::Error) -> StatusCode {
    match e {
        sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
        sqlx::Error::Database(db) if db.is_unique_violation() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = json!({
            "error": true,
            "message": self.message(),
            "status_code": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}
