//! # Spotify Web API client
//!
//! [`SpotifyClient`] wraps a `reqwest::Client`, the API base URL and one
//! bearer token. Endpoint wrappers live in the submodules as `impl` blocks
//! on the client:
//!
//! ```text
//! SpotifyClient
//!     ├── library  (profile, playlists, saved tracks, top items, history)
//!     ├── artists  (artist, top tracks, discography)
//!     ├── releases (full album)
//!     ├── search
//!     └── player   (playback state and commands)
//! ```
//!
//! [`auth`] talks to the accounts service instead and does not need a
//! bearer token.
//!
//! ## Transport rules
//!
//! Every request goes through one send loop:
//!
//! - `502 Bad Gateway` is retried after `retry_delay`, at most three attempts
//! - `429 Too Many Requests` waits for `Retry-After` when it is at most two
//!   minutes, otherwise [`SpotifyError::RateLimited`] is returned
//! - `204 No Content` yields `None`
//! - any other non-2xx status becomes [`SpotifyError::Api`] with the message
//!   from Spotify's error body

pub mod artists;
pub mod auth;
pub mod library;
pub mod player;
pub mod releases;
pub mod search;

use std::time::Duration;

use reqwest::{
    Client, Method, Response, StatusCode,
    header::{CONTENT_LENGTH, RETRY_AFTER},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::time::sleep;

use crate::{error::SpotifyError, types::Page};

const MAX_ATTEMPTS: u32 = 3;
const MAX_RETRY_AFTER_SECS: u64 = 120;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Query string pairs of one request
pub type Query<'a> = &'a [(&'a str, String)];

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    access_token: String,
    retry_delay: Duration,
}

impl SpotifyClient {
    pub fn new(api_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::with_http(Client::new(), api_url, access_token)
    }

    pub fn with_http(http: Client, api_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Delay between attempts after a 502
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.api_url, path)
        }
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        query: Query<'_>,
        body: Option<&B>,
    ) -> Result<Option<Response>, SpotifyError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(&self.access_token);
            if !query.is_empty() {
                request = request.query(query);
            }
            request = match body {
                Some(body) => request.json(body),
                // Spotify answers 411 to bodyless PUT/POST without a length
                None if method != Method::GET => request.header(CONTENT_LENGTH, 0),
                None => request,
            };

            let response = request.send().await?;
            match response.status() {
                StatusCode::NO_CONTENT => return Ok(None),
                status if status.is_success() => return Ok(Some(response)),
                StatusCode::BAD_GATEWAY if attempt < MAX_ATTEMPTS => {
                    tracing::warn!(%url, attempt, "Spotify returned 502, retrying");
                    sleep(self.retry_delay).await;
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = response
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse::<u64>().ok())
                        .unwrap_or(1);

                    if retry_after > MAX_RETRY_AFTER_SECS || attempt >= MAX_ATTEMPTS {
                        tracing::warn!(%url, retry_after, "giving up on rate limited request");
                        return Err(SpotifyError::RateLimited(retry_after));
                    }
                    tracing::debug!(%url, retry_after, "rate limited, waiting");
                    sleep(Duration::from_secs(retry_after)).await;
                }
                _ => return Err(api_error(response).await),
            }
        }
    }

    /// GET a JSON body; `None` on 204
    pub async fn get_json_opt<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Query<'_>,
    ) -> Result<Option<T>, SpotifyError> {
        match self.send::<()>(Method::GET, path, query, None).await? {
            Some(response) => Ok(Some(response.json::<T>().await?)),
            None => Ok(None),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Query<'_>,
    ) -> Result<T, SpotifyError> {
        self.get_json_opt(path, query)
            .await?
            .ok_or_else(|| SpotifyError::Api {
                status: StatusCode::NO_CONTENT.as_u16(),
                message: format!("empty response from {path}"),
            })
    }

    /// Follow `next` links until the last page and return every item.
    pub async fn collect_pages<T: DeserializeOwned>(
        &self,
        first: Page<T>,
    ) -> Result<Vec<T>, SpotifyError> {
        let mut items = first.items;
        let mut next = first.next;

        while let Some(url) = next {
            let page: Page<T> = self.get_json(&url, &[]).await?;
            items.extend(page.items);
            next = page.next;
        }

        Ok(items)
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: Query<'_>,
        body: Option<&B>,
    ) -> Result<(), SpotifyError> {
        self.send(Method::PUT, path, query, body).await?;
        Ok(())
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: Query<'_>,
        body: Option<&B>,
    ) -> Result<(), SpotifyError> {
        self.send(Method::POST, path, query, body).await?;
        Ok(())
    }
}

/// Build an `Api` error from a failed response.
///
/// Handles both the Web API shape `{"error": {"status", "message"}}` and the
/// accounts shape `{"error": "...", "error_description": "..."}`.
pub(crate) async fn api_error(response: Response) -> SpotifyError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    SpotifyError::Api {
        status: status.as_u16(),
        message: error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        }),
    }
}

fn error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    match &json["error"] {
        Value::Object(obj) => obj.get("message")?.as_str().map(str::to_string),
        Value::String(code) => Some(
            json["error_description"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| code.clone()),
        ),
        _ => None,
    }
}
