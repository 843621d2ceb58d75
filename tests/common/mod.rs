//! Shared fixtures: a local stand-in for the Spotify accounts and Web API
//! services, plus an in-memory database wired to it.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{Method, StatusCode, Uri, header::RETRY_AFTER},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Value, json};

use reminiscence::{
    api::AppState,
    config::{DEFAULT_SCOPE, SpotifySettings},
    db::{Database, NewUser, TokenRecord},
};

/// A request the stub received on a player command endpoint
#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub body: String,
}

#[derive(Clone, Default)]
pub struct StubState {
    pub base_url: String,
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub flaky_hits: Arc<AtomicUsize>,
    pub throttled_hits: Arc<AtomicUsize>,
    /// Lists an extra playlist `p3` whose tracks endpoint answers 500
    pub unavailable_playlist: Arc<AtomicBool>,
    pub token_requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

impl StubState {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn grant_types(&self) -> Vec<String> {
        self.token_requests
            .lock()
            .map(|r| r.iter().filter_map(|f| f.get("grant_type").cloned()).collect())
            .unwrap_or_default()
    }
}

pub struct TestContext {
    pub stub: StubState,
    pub base_url: String,
    pub settings: SpotifySettings,
    pub db: Database,
    pub state: AppState,
}

pub async fn setup() -> TestContext {
    let stub = spawn_stub().await;
    let base_url = stub.base_url.clone();
    let settings = settings(&base_url);
    let db = Database::in_memory().await.unwrap();
    let state = AppState::new(db.clone(), settings.clone());

    TestContext {
        stub,
        base_url,
        settings,
        db,
        state,
    }
}

pub fn settings(base_url: &str) -> SpotifySettings {
    SpotifySettings {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        redirect_uri: "http://127.0.0.1:8000/api/spotify/auth/callback".to_string(),
        scope: DEFAULT_SCOPE.to_string(),
        auth_url: format!("{base_url}/authorize"),
        token_url: format!("{base_url}/api/token"),
        api_url: format!("{base_url}/v1"),
    }
}

pub async fn create_user(db: &Database, username: &str) -> i64 {
    db.create_user(NewUser {
        username: username.to_string(),
        email: Some(format!("{username}@example.com")),
        first_name: username.to_string(),
        last_name: String::new(),
    })
    .await
    .unwrap()
}

/// Store a token for `user_id` that expires at `expires_at`
pub async fn link_spotify(db: &Database, user_id: i64, expires_at: DateTime<Utc>) {
    db.save_token(
        user_id,
        &TokenRecord {
            access_token: "user-access".to_string(),
            refresh_token: Some("user-refresh".to_string()),
            expires_at,
            scope: Some("user-read-private".to_string()),
            spotify_user_id: Some(format!("spotify-user-{user_id}")),
        },
    )
    .await
    .unwrap();
}

pub async fn link_spotify_fresh(db: &Database, user_id: i64) {
    link_spotify(db, user_id, Utc::now() + Duration::hours(1)).await
}

async fn spawn_stub() -> StubState {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let stub = StubState {
        base_url: format!("http://{addr}"),
        ..Default::default()
    };

    let app = Router::new()
        .route("/api/token", post(token))
        .route("/v1/me", get(profile))
        .route("/v1/me/playlists", get(playlists))
        .route("/v1/playlists/{id}/tracks", get(playlist_tracks))
        .route("/v1/me/tracks", get(saved_tracks))
        .route("/v1/me/top/artists", get(top_artists))
        .route("/v1/me/top/tracks", get(top_tracks))
        .route("/v1/me/player", get(|| async { StatusCode::NO_CONTENT }))
        .route("/v1/me/player/devices", get(devices))
        .route("/v1/me/player/recently-played", get(recently_played))
        .route(
            "/v1/me/player/{command}",
            axum::routing::put(player_command).post(player_command),
        )
        .route("/v1/search", get(search))
        .route("/v1/artists/{id}", get(artist))
        .route("/v1/artists/{id}/top-tracks", get(artist_top_tracks))
        .route("/v1/artists/{id}/albums", get(artist_albums))
        .route("/v1/albums/{id}", get(album))
        .route("/v1/flaky", get(flaky))
        .route("/v1/limited", get(limited))
        .route("/v1/throttled", get(throttled))
        .route("/v1/broken", get(broken))
        .with_state(stub.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    stub
}

// ============ Fixtures ============

pub fn simple_artist(id: &str, name: &str) -> Value {
    json!({ "id": id, "name": name, "external_urls": { "spotify": format!("https://open.spotify.com/artist/{id}") } })
}

pub fn full_artist() -> Value {
    json!({
        "id": "a1",
        "name": "Daft Punk",
        "genres": ["french house", "electronic"],
        "popularity": 80,
        "followers": { "href": null, "total": 9000000 },
        "images": [{ "url": "https://img.example/a1", "height": 640, "width": 640 }],
        "external_urls": { "spotify": "https://open.spotify.com/artist/a1" }
    })
}

pub fn simple_album(id: &str, name: &str, release_date: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "album_type": "album",
        "release_date": release_date,
        "release_date_precision": "day",
        "total_tracks": 14,
        "images": [{ "url": format!("https://img.example/{id}") }],
        "artists": [simple_artist("a1", "Daft Punk")],
        "external_urls": { "spotify": format!("https://open.spotify.com/album/{id}") }
    })
}

pub fn track(id: &str, name: &str, album: Value) -> Value {
    json!({
        "id": id,
        "name": name,
        "uri": format!("spotify:track:{id}"),
        "duration_ms": 320000,
        "track_number": 1,
        "disc_number": 1,
        "explicit": false,
        "preview_url": null,
        "popularity": 70,
        "external_urls": { "spotify": format!("https://open.spotify.com/track/{id}") },
        "external_ids": { "isrc": format!("ISRC{id}") },
        "artists": [simple_artist("a1", "Daft Punk")],
        "album": album
    })
}

pub fn discovery() -> Value {
    simple_album("al1", "Discovery", "2001-03-12")
}

pub fn ram() -> Value {
    simple_album("al2", "Random Access Memories", "2013-05")
}

pub fn one_more_time() -> Value {
    track("t1", "One More Time", discovery())
}

pub fn digital_love() -> Value {
    track("t2", "Digital Love", discovery())
}

pub fn get_lucky() -> Value {
    track("t3", "Get Lucky", ram())
}

// ============ Handlers ============

async fn token(
    State(stub): State<StubState>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if let Ok(mut requests) = stub.token_requests.lock() {
        requests.push(form.clone());
    }

    match form.get("grant_type").map(String::as_str) {
        Some("authorization_code") if form.get("code").map(String::as_str) == Some("bad-code") => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid authorization code" })),
        )
            .into_response(),
        Some("authorization_code") => Json(json!({
            "access_token": "user-access",
            "token_type": "Bearer",
            "scope": "user-read-private",
            "expires_in": 3600,
            "refresh_token": "user-refresh"
        }))
        .into_response(),
        // no refresh_token: Spotify keeps the old one valid
        Some("refresh_token") => Json(json!({
            "access_token": "refreshed-access",
            "token_type": "Bearer",
            "expires_in": 3600
        }))
        .into_response(),
        Some("client_credentials") => Json(json!({
            "access_token": "app-access",
            "token_type": "Bearer",
            "expires_in": 3600
        }))
        .into_response(),
        _ => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn profile() -> Json<Value> {
    Json(json!({
        "id": "spotify-ada",
        "display_name": "Ada Lovelace",
        "email": "ada@example.com",
        "country": "GB",
        "product": "premium",
        "followers": { "total": 12 },
        "images": [{ "url": "https://img.example/ada" }],
        "uri": "spotify:user:spotify-ada"
    }))
}

async fn playlists(State(stub): State<StubState>) -> Json<Value> {
    let mut items = vec![
        json!({
            "id": "p1",
            "name": "Road Trip",
            "description": "Songs for the road",
            "images": [{ "url": "https://img.example/p1" }],
            "owner": { "id": "spotify-ada", "display_name": "Ada" },
            "tracks": { "total": 4 },
            "snapshot_id": "snap-1"
        }),
        json!({
            "id": "p2",
            "name": "Focus",
            "description": null,
            "images": null,
            "owner": { "id": "spotify-ada" },
            "tracks": { "total": 1 },
            "snapshot_id": "snap-2"
        }),
    ];
    if stub.unavailable_playlist.load(Ordering::SeqCst) {
        items.insert(
            1,
            json!({
                "id": "p3",
                "name": "Unavailable",
                "owner": { "id": "spotify-ada" },
                "tracks": { "total": 3 },
                "snapshot_id": "snap-3"
            }),
        );
    }

    let total = items.len();
    Json(json!({ "items": items, "next": null, "total": total }))
}

/// `p1` spans two pages and contains entries that cannot be stored.
async fn playlist_tracks(
    State(stub): State<StubState>,
    Path(id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let added_at = "2024-01-01T10:00:00Z";
    match (id.as_str(), query.get("offset").map(String::as_str)) {
        ("p1", None) => Json(json!({
            "items": [
                { "added_at": added_at, "track": one_more_time() },
                { "added_at": added_at, "track": null }
            ],
            "next": format!("{}/v1/playlists/p1/tracks?offset=2", stub.base_url),
            "total": 4
        }))
        .into_response(),
        ("p1", Some(_)) => Json(json!({
            "items": [
                { "added_at": added_at, "track": { "id": null, "name": "Local file", "artists": [], "album": null } },
                { "added_at": added_at, "track": digital_love() }
            ],
            "next": null,
            "total": 4
        }))
        .into_response(),
        ("p3", _) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": { "status": 500, "message": "Server error" } })),
        )
            .into_response(),
        ("p2", _) => Json(json!({
            "items": [{ "added_at": added_at, "track": digital_love() }],
            "next": null
        }))
        .into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": { "status": 404, "message": "Not found." } })),
        )
            .into_response(),
    }
}

async fn saved_tracks() -> Json<Value> {
    Json(json!({
        "items": [{ "added_at": "2024-01-02T00:00:00Z", "track": get_lucky() }],
        "next": null
    }))
}

async fn top_artists() -> Json<Value> {
    Json(json!({ "items": [full_artist()], "next": null }))
}

async fn top_tracks() -> Json<Value> {
    Json(json!({ "items": [get_lucky()], "next": null }))
}

async fn recently_played() -> Json<Value> {
    Json(json!({
        "items": [{ "track": one_more_time(), "played_at": "2024-01-03T10:00:00Z" }],
        "cursors": { "after": "1704276000000", "before": null }
    }))
}

async fn devices() -> Json<Value> {
    Json(json!({
        "devices": [
            { "id": "dev-1", "name": "Laptop", "type": "Computer", "is_active": true, "volume_percent": 60 }
        ]
    }))
}

async fn player_command(
    State(stub): State<StubState>,
    method: Method,
    uri: Uri,
    body: String,
) -> StatusCode {
    if let Ok(mut calls) = stub.calls.lock() {
        calls.push(Call {
            method: method.to_string(),
            path: uri.path().to_string(),
            query: uri.query().map(str::to_string),
            body,
        });
    }
    StatusCode::NO_CONTENT
}

async fn search(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let types = query.get("type").cloned().unwrap_or_default();
    let mut body = json!({});
    if types.contains("artist") {
        body["artists"] = json!({ "items": [full_artist()], "next": null, "total": 1 });
    }
    if types.contains("track") {
        body["tracks"] = json!({ "items": [one_more_time()], "next": null, "total": 1 });
    }
    if types.contains("playlist") {
        body["playlists"] = json!({ "items": [null], "next": null, "total": 1 });
    }
    Json(body)
}

async fn artist() -> Json<Value> {
    Json(full_artist())
}

async fn artist_top_tracks() -> Json<Value> {
    Json(json!({ "tracks": [one_more_time(), get_lucky()] }))
}

async fn artist_albums() -> Json<Value> {
    Json(json!({
        "items": [discovery(), ram(), simple_album("al1-jp", "Discovery", "2001-03-12")],
        "next": null
    }))
}

async fn album() -> Json<Value> {
    Json(json!({
        "id": "al1",
        "name": "Discovery",
        "album_type": "album",
        "release_date": "2001-03-12",
        "total_tracks": 2,
        "images": [{ "url": "https://img.example/al1" }],
        "artists": [simple_artist("a1", "Daft Punk")],
        "tracks": {
            "items": [
                { "id": "t1", "name": "One More Time", "duration_ms": 320000, "track_number": 1, "artists": [simple_artist("a1", "Daft Punk")] },
                { "id": "t2", "name": "Digital Love", "duration_ms": 301000, "track_number": 3, "artists": [simple_artist("a1", "Daft Punk")] }
            ],
            "next": null
        }
    }))
}

/// 502 on the first hit, then success
async fn flaky(State(stub): State<StubState>) -> Response {
    if stub.flaky_hits.fetch_add(1, Ordering::SeqCst) == 0 {
        return StatusCode::BAD_GATEWAY.into_response();
    }
    Json(json!({ "ok": true })).into_response()
}

async fn limited() -> Response {
    (StatusCode::TOO_MANY_REQUESTS, [(RETRY_AFTER, "500")]).into_response()
}

/// 429 with a zero `Retry-After` on the first hit, then success
async fn throttled(State(stub): State<StubState>) -> Response {
    if stub.throttled_hits.fetch_add(1, Ordering::SeqCst) == 0 {
        return (StatusCode::TOO_MANY_REQUESTS, [(RETRY_AFTER, "0")]).into_response();
    }
    Json(json!({ "ok": true })).into_response()
}

async fn broken() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": { "status": 404, "message": "Non existing id" } })),
    )
        .into_response()
}
