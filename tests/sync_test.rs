mod common;

use std::sync::atomic::Ordering;

use chrono::{Duration, Utc};
use reminiscence::{
    db::{ListQuery, ops::SYNC_COMPLETED},
    error::SpotifyError,
    management::{SyncOptions, SyncResults, SyncService, TokenManager, token_expired},
    spotify::SpotifyClient,
};

use common::{create_user, link_spotify, link_spotify_fresh, setup};

fn service(ctx: &common::TestContext, user_id: i64) -> SyncService {
    let client = SpotifyClient::new(&ctx.settings.api_url, "user-access");
    SyncService::new(ctx.db.clone(), client, user_id)
}

#[tokio::test]
async fn test_full_sync_mirrors_library() {
    let ctx = setup().await;
    let user_id = create_user(&ctx.db, "ada").await;

    let results = service(&ctx, user_id)
        .full_sync(&SyncOptions::default())
        .await
        .unwrap();

    assert_eq!(
        results,
        SyncResults {
            playlists_synced: 2,
            tracks_synced: 1,
            artists_synced: 1,
        }
    );

    let all = ListQuery::default();
    assert_eq!(ctx.db.list_artists(&all).await.unwrap().len(), 1);
    assert_eq!(ctx.db.list_albums(&all).await.unwrap().len(), 2);
    assert_eq!(ctx.db.list_songs(&all).await.unwrap().len(), 3);

    let artist = ctx.db.get_artist_by_spotify_id("a1").await.unwrap().unwrap();
    assert_eq!(artist.popularity, Some(80));
    assert_eq!(artist.followers, Some(9_000_000));
    assert_eq!(artist.image_url.as_deref(), Some("https://img.example/a1"));

    let album = ctx.db.list_albums(&all).await.unwrap();
    let ram = album
        .iter()
        .find(|a| a.album.spotify_id.as_deref() == Some("al2"))
        .unwrap();
    // Month precision release date
    assert_eq!(ram.album.release_year, Some(2013));

    let last = ctx.db.last_sync_log(user_id).await.unwrap().unwrap();
    assert_eq!(last.status, SYNC_COMPLETED);
    assert_eq!(last.items_processed, Some(4));
    assert!(!ctx.db.is_syncing(user_id).await.unwrap());
}

#[tokio::test]
async fn test_playlist_entries_keep_remote_positions() {
    let ctx = setup().await;
    let user_id = create_user(&ctx.db, "ada").await;

    service(&ctx, user_id).sync_playlists().await.unwrap();

    let playlists = ctx.db.list_playlists(user_id).await.unwrap();
    let road_trip = playlists
        .iter()
        .find(|p| p.playlist.spotify_id.as_deref() == Some("p1"))
        .unwrap();
    assert_eq!(road_trip.playlist.name, "Road Trip");
    assert_eq!(road_trip.playlist.cover_image_url.as_deref(), Some("https://img.example/p1"));
    assert_eq!(road_trip.songs_count, 2);

    // The null track and the local file leave gaps at 2 and 3
    let entries = ctx
        .db
        .playlist_entries(road_trip.playlist.playlist_id)
        .await
        .unwrap();
    let order: Vec<_> = entries
        .iter()
        .map(|e| (e.song.title.as_str(), e.position))
        .collect();
    assert_eq!(order, vec![("One More Time", 1), ("Digital Love", 4)]);

    let focus = playlists
        .iter()
        .find(|p| p.playlist.spotify_id.as_deref() == Some("p2"))
        .unwrap();
    assert_eq!(focus.playlist.description.as_deref(), Some(""));
    assert_eq!(focus.songs_count, 1);
}

#[tokio::test]
async fn test_failing_playlist_is_skipped() {
    let ctx = setup().await;
    let user_id = create_user(&ctx.db, "ada").await;
    ctx.stub.unavailable_playlist.store(true, Ordering::SeqCst);

    let synced = service(&ctx, user_id).sync_playlists().await.unwrap();
    assert_eq!(synced, 2);

    let playlists = ctx.db.list_playlists(user_id).await.unwrap();
    let count_of = |spotify_id: &str| {
        playlists
            .iter()
            .find(|p| p.playlist.spotify_id.as_deref() == Some(spotify_id))
            .map(|p| p.songs_count)
    };
    assert_eq!(count_of("p1"), Some(2));
    assert_eq!(count_of("p2"), Some(1));
    assert_eq!(count_of("p3").unwrap_or(0), 0);
}

#[tokio::test]
async fn test_sync_twice_is_idempotent() {
    let ctx = setup().await;
    let user_id = create_user(&ctx.db, "ada").await;
    let sync = service(&ctx, user_id);

    sync.full_sync(&SyncOptions::default()).await.unwrap();
    sync.full_sync(&SyncOptions::default()).await.unwrap();

    let all = ListQuery::default();
    assert_eq!(ctx.db.list_artists(&all).await.unwrap().len(), 1);
    assert_eq!(ctx.db.list_albums(&all).await.unwrap().len(), 2);
    assert_eq!(ctx.db.list_songs(&all).await.unwrap().len(), 3);
    assert_eq!(ctx.db.list_playlists(user_id).await.unwrap().len(), 2);
    assert_eq!(ctx.db.list_favorite_songs(user_id).await.unwrap().len(), 1);
    assert_eq!(ctx.db.list_favorite_artists(user_id).await.unwrap().len(), 1);

    for playlist in ctx.db.list_playlists(user_id).await.unwrap() {
        let entries = ctx
            .db
            .playlist_entries(playlist.playlist.playlist_id)
            .await
            .unwrap();
        assert_eq!(entries.len() as i64, playlist.songs_count);
    }
}

#[tokio::test]
async fn test_saved_tracks_and_top_artists_become_favorites() {
    let ctx = setup().await;
    let user_id = create_user(&ctx.db, "ada").await;
    let sync = service(&ctx, user_id);

    assert_eq!(sync.sync_saved_tracks().await.unwrap(), 1);
    assert_eq!(sync.sync_top_artists().await.unwrap(), 1);

    let songs = ctx.db.list_favorite_songs(user_id).await.unwrap();
    assert_eq!(songs.len(), 1);
    assert_eq!(songs[0].song.title, "Get Lucky");

    let artists = ctx.db.list_favorite_artists(user_id).await.unwrap();
    assert_eq!(artists[0].artist.name, "Daft Punk");

    // Genres of the top artist are attached to the artist's songs
    let genres = ctx.db.genres_for_song(songs[0].song.song_id).await.unwrap();
    let mut names: Vec<_> = genres.iter().map(|g| g.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["electronic", "french house"]);
}

#[tokio::test]
async fn test_sync_options_skip_parts() {
    let ctx = setup().await;
    let user_id = create_user(&ctx.db, "ada").await;

    let options = SyncOptions {
        sync_playlists: false,
        sync_saved_tracks: true,
        sync_top_artists: false,
    };
    let results = service(&ctx, user_id).full_sync(&options).await.unwrap();

    assert_eq!(results.playlists_synced, 0);
    assert_eq!(results.tracks_synced, 1);
    assert_eq!(results.artists_synced, 0);
    assert!(ctx.db.list_playlists(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_sync_is_recorded() {
    let ctx = setup().await;
    let user_id = create_user(&ctx.db, "ada").await;

    // Nothing listens on this port
    let client = SpotifyClient::new("http://127.0.0.1:9/v1", "user-access");
    let result = SyncService::new(ctx.db.clone(), client, user_id)
        .full_sync(&SyncOptions::default())
        .await;
    assert!(result.is_err());

    let last = ctx.db.last_sync_log(user_id).await.unwrap().unwrap();
    assert_eq!(last.status, "failed");
    assert!(last.error_message.is_some());
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_keeps_refresh_token() {
    let ctx = setup().await;
    let user_id = create_user(&ctx.db, "ada").await;
    link_spotify(&ctx.db, user_id, Utc::now() - Duration::minutes(5)).await;

    let mut manager = TokenManager::for_user(&ctx.db, &ctx.settings, &reqwest::Client::new(), user_id)
        .await
        .unwrap();
    assert!(manager.is_expired());

    let access = manager.valid_access_token().await.unwrap();
    assert_eq!(access, "refreshed-access");
    assert!(!manager.is_expired());
    assert_eq!(ctx.stub.grant_types(), vec!["refresh_token".to_string()]);

    let stored = ctx.db.get_token_for_user(user_id).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "refreshed-access");
    assert_eq!(stored.refresh_token.as_deref(), Some("user-refresh"));
    // Scope was not in the response, the old one stays
    assert_eq!(stored.scope.as_deref(), Some("user-read-private"));
    assert!(stored.expires_at > Utc::now() + Duration::minutes(50));
}

#[tokio::test]
async fn test_fresh_token_is_not_refreshed() {
    let ctx = setup().await;
    let user_id = create_user(&ctx.db, "ada").await;
    link_spotify_fresh(&ctx.db, user_id).await;

    let mut manager = TokenManager::for_user(&ctx.db, &ctx.settings, &reqwest::Client::new(), user_id)
        .await
        .unwrap();
    let client = manager.client().await.unwrap();

    assert_eq!(client.access_token(), "user-access");
    assert!(ctx.stub.grant_types().is_empty());
}

#[tokio::test]
async fn test_token_manager_without_link() {
    let ctx = setup().await;
    let user_id = create_user(&ctx.db, "ada").await;

    let result = TokenManager::for_user(&ctx.db, &ctx.settings, &reqwest::Client::new(), user_id).await;
    assert!(matches!(result, Err(SpotifyError::NotLinked)));
}

#[test]
fn test_token_expired_applies_skew() {
    let now = Utc::now();

    assert!(token_expired(now - Duration::seconds(1), now));
    assert!(token_expired(now, now));
    // Inside the 60 second window counts as expired
    assert!(token_expired(now + Duration::seconds(30), now));
    assert!(token_expired(now + Duration::seconds(60), now));
    assert!(!token_expired(now + Duration::seconds(61), now));
    assert!(!token_expired(now + Duration::hours(1), now));
}
