mod common;

use std::{sync::atomic::Ordering, time::Duration};

use reminiscence::{
    api::search::clamp_limit,
    error::SpotifyError,
    spotify::{SpotifyClient, auth, player::resolve_play_request},
    types::{PlaybackOffset, StartPlayback},
};
use serde_json::Value;

use common::setup;

fn client(ctx: &common::TestContext) -> SpotifyClient {
    SpotifyClient::new(&ctx.settings.api_url, "user-access").with_retry_delay(Duration::from_millis(10))
}

#[tokio::test]
async fn test_bad_gateway_is_retried() {
    let ctx = setup().await;

    let body: Value = client(&ctx).get_json("/flaky", &[]).await.unwrap();

    assert_eq!(body["ok"], true);
    assert_eq!(ctx.stub.flaky_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_short_retry_after_waits_and_retries() {
    let ctx = setup().await;

    let body: Value = client(&ctx).get_json("/throttled", &[]).await.unwrap();

    assert_eq!(body["ok"], true);
    assert_eq!(ctx.stub.throttled_hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_long_retry_after_is_an_error() {
    let ctx = setup().await;

    let result = client(&ctx).get_json::<Value>("/limited", &[]).await;
    assert!(matches!(result, Err(SpotifyError::RateLimited(500))));
}

#[tokio::test]
async fn test_error_body_message_is_surfaced() {
    let ctx = setup().await;

    match client(&ctx).get_json::<Value>("/broken", &[]).await {
        Err(SpotifyError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Non existing id");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_no_content_means_nothing_playing() {
    let ctx = setup().await;

    let playback = client(&ctx).current_playback().await.unwrap();
    assert!(playback.is_none());
}

#[tokio::test]
async fn test_playlist_tracks_follow_next_links() {
    let ctx = setup().await;

    let items = client(&ctx).playlist_tracks("p1").await.unwrap();
    assert_eq!(items.len(), 4);
    assert!(items[1].track.is_none());
    assert_eq!(items[3].track.as_ref().and_then(|t| t.id.as_deref()), Some("t2"));
}

#[tokio::test]
async fn test_player_commands_send_device_and_body() {
    let ctx = setup().await;
    let client = client(&ctx);

    let request = resolve_play_request(Some("spotify:track:t1"), None, None);
    client
        .start_playback(Some("dev-1"), request.as_ref())
        .await
        .unwrap();
    client.pause_playback(None).await.unwrap();
    client.seek_track(30_000, Some("dev-1")).await.unwrap();
    client.next_track(None).await.unwrap();

    let calls = ctx.stub.calls();
    assert_eq!(calls.len(), 4);

    assert_eq!(calls[0].method, "PUT");
    assert_eq!(calls[0].path, "/v1/me/player/play");
    assert_eq!(calls[0].query.as_deref(), Some("device_id=dev-1"));
    let body: Value = serde_json::from_str(&calls[0].body).unwrap();
    assert_eq!(body["uris"][0], "spotify:track:t1");
    assert!(body.get("context_uri").is_none());

    assert_eq!(calls[1].path, "/v1/me/player/pause");
    assert!(calls[1].query.is_none());
    assert!(calls[1].body.is_empty());

    let seek_query = calls[2].query.clone().unwrap_or_default();
    assert!(seek_query.contains("position_ms=30000"));
    assert!(seek_query.contains("device_id=dev-1"));

    assert_eq!(calls[3].method, "POST");
    assert_eq!(calls[3].path, "/v1/me/player/next");
}

#[tokio::test]
async fn test_client_credentials_token() {
    let ctx = setup().await;

    let token = auth::client_credentials_token(&reqwest::Client::new(), &ctx.settings)
        .await
        .unwrap();
    assert_eq!(token.access_token, "app-access");
    assert_eq!(token.expires_in, 3600);
}

#[tokio::test]
async fn test_failed_code_exchange_reports_accounts_error() {
    let ctx = setup().await;

    let result = auth::exchange_code(&reqwest::Client::new(), &ctx.settings, "bad-code", None).await;
    match result {
        Err(SpotifyError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid authorization code");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_authorize_url_carries_pkce_challenge() {
    let settings = common::settings("http://accounts.test");
    let url = auth::authorize_url(&settings, "state-123", "challenge-abc").unwrap();

    assert!(url.starts_with("http://accounts.test/authorize?"));
    assert!(url.contains("client_id=client-id"));
    assert!(url.contains("response_type=code"));
    assert!(url.contains("state=state-123"));
    assert!(url.contains("code_challenge_method=S256"));
    assert!(url.contains("code_challenge=challenge-abc"));
    assert!(url.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8000%2Fapi%2Fspotify%2Fauth%2Fcallback"));
}

#[test]
fn test_resolve_play_request_precedence() {
    let uris = vec!["spotify:track:a".to_string(), "spotify:track:b".to_string()];

    // An explicit list wins over everything else
    let request = resolve_play_request(
        Some("spotify:track:x"),
        Some("spotify:album:al1"),
        Some(uris.as_slice()),
    );
    assert_eq!(
        request,
        Some(StartPlayback {
            uris: Some(uris.clone()),
            ..Default::default()
        })
    );

    // A context with a track offset
    let request = resolve_play_request(Some("spotify:track:x"), Some("spotify:album:al1"), None);
    assert_eq!(
        request,
        Some(StartPlayback {
            context_uri: Some("spotify:album:al1".to_string()),
            offset: Some(PlaybackOffset {
                uri: "spotify:track:x".to_string()
            }),
            ..Default::default()
        })
    );

    // A lone track uri plays that track
    let request = resolve_play_request(Some("spotify:track:x"), None, None);
    assert_eq!(
        request.and_then(|r| r.uris),
        Some(vec!["spotify:track:x".to_string()])
    );

    // A lone non-track uri is a context
    let request = resolve_play_request(Some("spotify:playlist:p1"), None, None);
    assert_eq!(
        request.and_then(|r| r.context_uri),
        Some("spotify:playlist:p1".to_string())
    );
}

#[test]
fn test_resolve_play_request_empty_values_resume() {
    assert_eq!(resolve_play_request(None, None, None), None);
    assert_eq!(resolve_play_request(Some(""), Some(""), Some(&[][..])), None);
}

#[test]
fn test_clamp_search_limit() {
    assert_eq!(clamp_limit(None), 20);
    assert_eq!(clamp_limit(Some(0)), 1);
    assert_eq!(clamp_limit(Some(-5)), 1);
    assert_eq!(clamp_limit(Some(35)), 35);
    assert_eq!(clamp_limit(Some(500)), 50);
}
