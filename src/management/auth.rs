use chrono::{DateTime, Duration, Utc};
use reqwest::Client;

use crate::{
    config::SpotifySettings,
    db::{Database, SpotifyToken},
    error::SpotifyError,
    spotify::{SpotifyClient, auth},
};

/// Tokens are refreshed this many seconds before they actually expire
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// Whether a token expiring at `expires_at` must be refreshed at `now`
pub fn token_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at - Duration::seconds(EXPIRY_SKEW_SECS)
}

/// Hands out valid access tokens for one user.
///
/// The stored token is refreshed lazily and written back to the database, so
/// every request and sync run goes through the same refresh path.
pub struct TokenManager {
    db: Database,
    settings: SpotifySettings,
    http: Client,
    token: SpotifyToken,
}

impl TokenManager {
    /// Loads the stored token of `user_id`. Fails with
    /// [`SpotifyError::NotLinked`] when the user never connected Spotify.
    pub async fn for_user(
        db: &Database,
        settings: &SpotifySettings,
        http: &Client,
        user_id: i64,
    ) -> Result<Self, SpotifyError> {
        let token = db
            .get_token_for_user(user_id)
            .await?
            .ok_or(SpotifyError::NotLinked)?;

        Ok(Self {
            db: db.clone(),
            settings: settings.clone(),
            http: http.clone(),
            token,
        })
    }

    pub fn is_expired(&self) -> bool {
        token_expired(self.token.expires_at, Utc::now())
    }

    pub async fn valid_access_token(&mut self) -> Result<String, SpotifyError> {
        if self.is_expired() {
            self.refresh().await?;
        }
        Ok(self.token.access_token.clone())
    }

    /// A client bound to a valid access token
    pub async fn client(&mut self) -> Result<SpotifyClient, SpotifyError> {
        let access_token = self.valid_access_token().await?;
        Ok(SpotifyClient::with_http(
            self.http.clone(),
            &self.settings.api_url,
            access_token,
        ))
    }

    async fn refresh(&mut self) -> Result<(), SpotifyError> {
        let previous = self
            .token
            .refresh_token
            .clone()
            .ok_or_else(|| SpotifyError::TokenRefresh("no refresh token stored".to_string()))?;

        let res = auth::refresh_access_token(&self.http, &self.settings, &previous).await?;

        // Spotify only rotates the refresh token sometimes
        let refresh_token = res.refresh_token.unwrap_or(previous);
        let expires_at = Utc::now() + Duration::seconds(res.expires_in as i64);
        let scope = res.scope.or_else(|| self.token.scope.clone());

        self.db
            .update_refreshed_token(
                self.token.token_id,
                &res.access_token,
                Some(&refresh_token),
                expires_at,
                scope.as_deref(),
            )
            .await?;

        tracing::debug!(user_id = self.token.user_id, %expires_at, "refreshed Spotify access token");

        self.token.access_token = res.access_token;
        self.token.refresh_token = Some(refresh_token);
        self.token.expires_at = expires_at;
        self.token.scope = scope;
        Ok(())
    }
}
