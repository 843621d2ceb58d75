//! Configuration management for Reminiscence.
//!
//! Settings come from environment variables. A `.env` file in the local data
//! directory is loaded first, and variables already present in the process
//! environment win over it:
//!
//! 1. Environment variables (highest priority)
//! 2. `<data_local_dir>/reminiscence/.env`
//! 3. Built-in defaults, for everything except the Spotify client credentials

use std::{env, path::PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8000";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8000/api/spotify/auth/callback";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SCOPE: &str = "user-read-private user-read-email playlist-read-private \
     user-library-read user-top-read user-read-recently-played \
     user-read-playback-state user-modify-playback-state streaming";

/// Directory holding the `.env` file and the default SQLite database.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("reminiscence");
    path
}

/// Loads `<data_local_dir>/reminiscence/.env` into the process environment.
///
/// The data directory is created if needed. A missing `.env` file is fine;
/// a malformed one is reported.
pub async fn load_env() -> Result<(), ConfigError> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir).await?;

    let path = dir.join(".env");
    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| ConfigError::Dotenv(e.to_string()))?;
    }
    Ok(())
}

/// Spotify application credentials and endpoints.
#[derive(Debug, Clone)]
pub struct SpotifySettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub database_url: String,
    pub spotify: SpotifySettings,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server_addr: var_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| default_database_url()),
            spotify: SpotifySettings::from_env()?,
        })
    }
}

impl SpotifySettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            client_id: required("SPOTIFY_CLIENT_ID")?,
            client_secret: required("SPOTIFY_CLIENT_SECRET")?,
            redirect_uri: var_or("SPOTIFY_REDIRECT_URI", DEFAULT_REDIRECT_URI),
            scope: var_or("SPOTIFY_SCOPE", DEFAULT_SCOPE),
            auth_url: var_or("SPOTIFY_AUTH_URL", DEFAULT_AUTH_URL),
            token_url: var_or("SPOTIFY_TOKEN_URL", DEFAULT_TOKEN_URL),
            api_url: var_or("SPOTIFY_API_URL", DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

pub fn default_database_url() -> String {
    format!(
        "sqlite:{}?mode=rwc",
        data_dir().join("reminiscence.db").display()
    )
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
