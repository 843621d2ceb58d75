//! OAuth 2.0 authorization-code flow against the Spotify accounts service.
//!
//! The authorize URL carries a PKCE S256 challenge in addition to the client
//! secret used on the token endpoint, so a leaked code alone is useless.

use reqwest::Client;

use crate::{config::SpotifySettings, error::SpotifyError, types::TokenResponse};

use super::api_error;

/// Builds the accounts URL the user is sent to for consent.
pub fn authorize_url(
    settings: &SpotifySettings,
    state: &str,
    code_challenge: &str,
) -> Result<String, SpotifyError> {
    let request = Client::new()
        .get(&settings.auth_url)
        .query(&[
            ("client_id", settings.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", settings.redirect_uri.as_str()),
            ("scope", settings.scope.as_str()),
            ("state", state),
            ("code_challenge_method", "S256"),
            ("code_challenge", code_challenge),
            ("show_dialog", "false"),
        ])
        .build()?;
    Ok(request.url().to_string())
}

/// Exchanges an authorization code for tokens.
///
/// `code_verifier` is sent when the authorize request carried a PKCE
/// challenge.
pub async fn exchange_code(
    http: &Client,
    settings: &SpotifySettings,
    code: &str,
    code_verifier: Option<&str>,
) -> Result<TokenResponse, SpotifyError> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", settings.redirect_uri.as_str()),
    ];
    if let Some(verifier) = code_verifier {
        form.push(("code_verifier", verifier));
    }
    token_request(http, settings, &form).await
}

/// Exchanges a refresh token for a new access token.
///
/// Spotify may omit `refresh_token` in the response; the caller keeps the
/// previous one in that case.
pub async fn refresh_access_token(
    http: &Client,
    settings: &SpotifySettings,
    refresh_token: &str,
) -> Result<TokenResponse, SpotifyError> {
    let form = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ];
    token_request(http, settings, &form)
        .await
        .map_err(|e| SpotifyError::TokenRefresh(e.to_string()))
}

/// App-only token for endpoints that do not need a user.
pub async fn client_credentials_token(
    http: &Client,
    settings: &SpotifySettings,
) -> Result<TokenResponse, SpotifyError> {
    token_request(http, settings, &[("grant_type", "client_credentials")]).await
}

async fn token_request(
    http: &Client,
    settings: &SpotifySettings,
    form: &[(&str, &str)],
) -> Result<TokenResponse, SpotifyError> {
    let response = http
        .post(&settings.token_url)
        .basic_auth(&settings.client_id, Some(&settings.client_secret))
        .form(form)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(api_error(response).await);
    }
    Ok(response.json::<TokenResponse>().await?)
}
