use chrono::{Duration, NaiveDate, Utc};
use reminiscence::db::{
    Database, ListQuery, NewDevice, NewPlayback, NewPlaylist, NewPlaylistEntry, NewUser,
    PlaylistChanges, TokenRecord, UpsertAlbum, UpsertArtist, UpsertPlaylist, UpsertSong,
    ops::{SYNC_COMPLETED, SYNC_FAILED},
};

async fn new_user(db: &Database, username: &str) -> i64 {
    db.create_user(NewUser {
        username: username.to_string(),
        email: Some(format!("{username}@example.com")),
        first_name: String::new(),
        last_name: String::new(),
    })
    .await
    .unwrap()
}

/// One artist with one album; returns (artist_id, album_id)
async fn seed_album(db: &Database) -> (i64, i64) {
    let artist_id = db
        .upsert_artist(&UpsertArtist {
            spotify_id: "a1".to_string(),
            name: "Daft Punk".to_string(),
            popularity: Some(80),
            ..Default::default()
        })
        .await
        .unwrap();
    let album_id = db
        .upsert_album(&UpsertAlbum {
            spotify_id: "al1".to_string(),
            artist_id,
            title: "Discovery".to_string(),
            release_date: NaiveDate::from_ymd_opt(2001, 3, 12),
            release_year: Some(2001),
            ..Default::default()
        })
        .await
        .unwrap();
    (artist_id, album_id)
}

async fn seed_song(db: &Database, album_id: i64, spotify_id: &str, title: &str) -> i64 {
    db.upsert_song(&UpsertSong {
        spotify_id: spotify_id.to_string(),
        album_id,
        title: title.to_string(),
        duration: 200_000,
        ..Default::default()
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_upsert_artist_keeps_one_row_per_spotify_id() {
    let db = Database::in_memory().await.unwrap();

    let first = db
        .upsert_artist(&UpsertArtist {
            spotify_id: "a1".to_string(),
            name: "Daft Punk".to_string(),
            image_url: Some("https://img.example/a1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    // A sparse update must not wipe the image
    let second = db
        .upsert_artist(&UpsertArtist {
            spotify_id: "a1".to_string(),
            name: "Daft Punk".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(first, second);
    let artists = db.list_artists(&ListQuery::default()).await.unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].image_url.as_deref(), Some("https://img.example/a1"));
    assert_eq!(artists[0].data_source, "spotify");
}

#[tokio::test]
async fn test_upsert_song_is_idempotent() {
    let db = Database::in_memory().await.unwrap();
    let (_, album_id) = seed_album(&db).await;

    let first = seed_song(&db, album_id, "t1", "One More Time").await;
    let second = seed_song(&db, album_id, "t1", "One More Time (Edit)").await;

    assert_eq!(first, second);
    let song = db.get_song(first).await.unwrap().unwrap();
    assert_eq!(song.song.title, "One More Time (Edit)");
    assert_eq!(song.album_title, "Discovery");
    assert_eq!(song.artist_name, "Daft Punk");
    assert_eq!(song.song.disc_number, 1);
}

#[tokio::test]
async fn test_catalog_search_and_ordering() {
    let db = Database::in_memory().await.unwrap();
    let (_, album_id) = seed_album(&db).await;
    seed_song(&db, album_id, "t1", "One More Time").await;
    seed_song(&db, album_id, "t2", "Digital Love").await;

    let by_title = db
        .list_songs(&ListQuery {
            search: None,
            ordering: Some("title".to_string()),
        })
        .await
        .unwrap();
    let titles: Vec<_> = by_title.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Digital Love", "One More Time"]);

    let found = db
        .list_songs(&ListQuery {
            search: Some("digital".to_string()),
            ordering: None,
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);

    // Searching by artist name matches every song of the artist
    let by_artist = db
        .list_songs(&ListQuery {
            search: Some("daft".to_string()),
            ordering: Some("; DROP TABLE songs".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(by_artist.len(), 2);
}

#[tokio::test]
async fn test_find_artist_by_name_ignores_case() {
    let db = Database::in_memory().await.unwrap();
    seed_album(&db).await;

    let artist = db.find_artist_by_name("daft punk").await.unwrap();
    assert!(artist.is_some());
    assert!(db.find_artist_by_name("Justice").await.unwrap().is_none());
}

#[tokio::test]
async fn test_genres_tag_songs_of_artist() {
    let db = Database::in_memory().await.unwrap();
    let (artist_id, album_id) = seed_album(&db).await;
    let song_id = seed_song(&db, album_id, "t1", "One More Time").await;

    let genre_id = db.upsert_genre("french house").await.unwrap();
    assert_eq!(db.upsert_genre("french house").await.unwrap(), genre_id);

    assert_eq!(db.tag_artist_songs(artist_id, genre_id).await.unwrap(), 1);
    // Tagging twice adds nothing
    assert_eq!(db.tag_artist_songs(artist_id, genre_id).await.unwrap(), 0);

    let genres = db.genres_for_song(song_id).await.unwrap();
    assert_eq!(genres.len(), 1);
    assert_eq!(genres[0].name, "french house");

    let searched = db.list_genres(Some("house")).await.unwrap();
    assert_eq!(searched.len(), 1);
    assert!(db.list_genres(Some("jazz")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_song_appends_and_inserts_at_position() {
    let db = Database::in_memory().await.unwrap();
    let user_id = new_user(&db, "ada").await;
    let (_, album_id) = seed_album(&db).await;
    let s1 = seed_song(&db, album_id, "t1", "One").await;
    let s2 = seed_song(&db, album_id, "t2", "Two").await;
    let s3 = seed_song(&db, album_id, "t3", "Three").await;

    let playlist_id = db
        .create_playlist(
            user_id,
            &NewPlaylist {
                name: "Mix".to_string(),
                description: None,
                status: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(db.add_song_to_playlist(playlist_id, s1, None, user_id).await.unwrap(), 1);
    assert_eq!(db.add_song_to_playlist(playlist_id, s2, None, user_id).await.unwrap(), 2);
    // Inserting at 1 moves the others down
    assert_eq!(db.add_song_to_playlist(playlist_id, s3, Some(1), user_id).await.unwrap(), 1);

    let entries = db.playlist_entries(playlist_id).await.unwrap();
    let order: Vec<_> = entries.iter().map(|e| (e.song.song_id, e.position)).collect();
    assert_eq!(order, vec![(s3, 1), (s1, 2), (s2, 3)]);

    // Same song twice violates the unique pair
    assert!(db.add_song_to_playlist(playlist_id, s1, None, user_id).await.is_err());

    assert!(db.remove_song_from_playlist(playlist_id, s1).await.unwrap());
    assert!(!db.remove_song_from_playlist(playlist_id, s1).await.unwrap());
    assert!(!db.playlist_contains(playlist_id, s1).await.unwrap());
}

#[tokio::test]
async fn test_playlist_defaults_and_update() {
    let db = Database::in_memory().await.unwrap();
    let user_id = new_user(&db, "ada").await;
    let other_id = new_user(&db, "bob").await;

    let id = db
        .create_playlist(
            user_id,
            &NewPlaylist {
                name: "Mix".to_string(),
                description: Some("old".to_string()),
                status: None,
            },
        )
        .await
        .unwrap();

    let playlist = db.get_playlist(user_id, id).await.unwrap().unwrap();
    assert_eq!(playlist.status, "private");
    assert!(!playlist.is_synced_with_spotify);

    // Not visible to another user
    assert!(db.get_playlist(other_id, id).await.unwrap().is_none());

    db.update_playlist(
        id,
        &PlaylistChanges {
            status: Some("public".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let playlist = db.get_playlist(user_id, id).await.unwrap().unwrap();
    assert_eq!(playlist.status, "public");
    assert_eq!(playlist.description.as_deref(), Some("old"));
    assert_eq!(playlist.name, "Mix");

    db.delete_playlist(id).await.unwrap();
    assert!(db.get_playlist(user_id, id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_synced_playlist_follows_remote_rename() {
    let db = Database::in_memory().await.unwrap();
    let user_id = new_user(&db, "ada").await;

    let mut remote = UpsertPlaylist {
        user_id,
        spotify_id: "p1".to_string(),
        name: "Road Trip".to_string(),
        snapshot_id: Some("snap-1".to_string()),
        ..Default::default()
    };
    let first = db.upsert_synced_playlist(&remote).await.unwrap();

    remote.name = "Road Trip 2024".to_string();
    remote.snapshot_id = Some("snap-2".to_string());
    let second = db.upsert_synced_playlist(&remote).await.unwrap();

    assert_eq!(first, second);
    let playlists = db.list_playlists(user_id).await.unwrap();
    assert_eq!(playlists.len(), 1);
    let playlist = &playlists[0].playlist;
    assert_eq!(playlist.name, "Road Trip 2024");
    assert_eq!(playlist.spotify_snapshot_id.as_deref(), Some("snap-2"));
    assert!(playlist.is_synced_with_spotify);
    assert!(playlist.last_sync_date.is_some());
}

#[tokio::test]
async fn test_remote_rename_onto_taken_name_keeps_stored_name() {
    let db = Database::in_memory().await.unwrap();
    let user_id = new_user(&db, "ada").await;

    let local = db
        .create_playlist(
            user_id,
            &NewPlaylist {
                name: "Focus".to_string(),
                description: None,
                status: None,
            },
        )
        .await
        .unwrap();

    let mut remote = UpsertPlaylist {
        user_id,
        spotify_id: "p1".to_string(),
        name: "Road Trip".to_string(),
        snapshot_id: Some("snap-1".to_string()),
        ..Default::default()
    };
    let synced = db.upsert_synced_playlist(&remote).await.unwrap();

    remote.name = "Focus".to_string();
    remote.snapshot_id = Some("snap-2".to_string());
    assert_eq!(db.upsert_synced_playlist(&remote).await.unwrap(), synced);
    // Later syncs keep working
    assert_eq!(db.upsert_synced_playlist(&remote).await.unwrap(), synced);

    let playlist = db.get_playlist(user_id, synced).await.unwrap().unwrap();
    assert_eq!(playlist.name, "Road Trip");
    assert_eq!(playlist.spotify_snapshot_id.as_deref(), Some("snap-2"));

    let untouched = db.get_playlist(user_id, local).await.unwrap().unwrap();
    assert_eq!(untouched.name, "Focus");
    assert_eq!(untouched.spotify_id, None);
}

#[tokio::test]
async fn test_synced_playlist_adopts_local_playlist_with_same_name() {
    let db = Database::in_memory().await.unwrap();
    let user_id = new_user(&db, "ada").await;

    let local = db
        .create_playlist(
            user_id,
            &NewPlaylist {
                name: "Focus".to_string(),
                description: None,
                status: None,
            },
        )
        .await
        .unwrap();

    let synced = db
        .upsert_synced_playlist(&UpsertPlaylist {
            user_id,
            spotify_id: "p2".to_string(),
            name: "Focus".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(local, synced);
    let playlist = db.get_playlist(user_id, local).await.unwrap().unwrap();
    assert_eq!(playlist.spotify_id.as_deref(), Some("p2"));
}

#[tokio::test]
async fn test_replace_playlist_entries_keeps_first_duplicate() {
    let db = Database::in_memory().await.unwrap();
    let user_id = new_user(&db, "ada").await;
    let (_, album_id) = seed_album(&db).await;
    let s1 = seed_song(&db, album_id, "t1", "One").await;
    let s2 = seed_song(&db, album_id, "t2", "Two").await;

    let playlist_id = db
        .upsert_synced_playlist(&UpsertPlaylist {
            user_id,
            spotify_id: "p1".to_string(),
            name: "Road Trip".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let now = Utc::now();
    let entry = |song_id, position| NewPlaylistEntry {
        song_id,
        position,
        date_added: now,
    };

    let written = db
        .replace_playlist_entries(playlist_id, &[entry(s1, 1), entry(s2, 3), entry(s1, 4)])
        .await
        .unwrap();
    assert_eq!(written, 2);

    let entries = db.playlist_entries(playlist_id).await.unwrap();
    let order: Vec<_> = entries.iter().map(|e| (e.song.song_id, e.position)).collect();
    assert_eq!(order, vec![(s1, 1), (s2, 3)]);

    // A second run replaces rather than appends
    db.replace_playlist_entries(playlist_id, &[entry(s2, 1)])
        .await
        .unwrap();
    let entries = db.playlist_entries(playlist_id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].song.song_id, s2);

    let listed = db.list_playlists(user_id).await.unwrap();
    assert_eq!(listed[0].songs_count, 1);
}

#[tokio::test]
async fn test_favorites_are_unique_per_user() {
    let db = Database::in_memory().await.unwrap();
    let user_id = new_user(&db, "ada").await;
    let (artist_id, album_id) = seed_album(&db).await;
    let song_id = seed_song(&db, album_id, "t1", "One").await;

    assert!(db.add_favorite_song(user_id, song_id).await.unwrap());
    assert!(!db.add_favorite_song(user_id, song_id).await.unwrap());
    assert_eq!(db.list_favorite_songs(user_id).await.unwrap().len(), 1);

    assert!(db.add_favorite_artist(user_id, artist_id).await.unwrap());
    assert!(!db.add_favorite_artist(user_id, artist_id).await.unwrap());
    let artists = db.list_favorite_artists(user_id).await.unwrap();
    assert_eq!(artists.len(), 1);
    assert_eq!(artists[0].artist.name, "Daft Punk");

    assert!(db.remove_favorite_song(user_id, song_id).await.unwrap());
    assert!(!db.remove_favorite_song(user_id, song_id).await.unwrap());
    assert!(db.remove_favorite_artist(user_id, artist_id).await.unwrap());
    assert!(db.list_favorite_artists(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_playback_history_reuses_devices() {
    let db = Database::in_memory().await.unwrap();
    let user_id = new_user(&db, "ada").await;
    let (_, album_id) = seed_album(&db).await;
    let song_id = seed_song(&db, album_id, "t1", "One").await;

    let device = NewDevice {
        device_name: None,
        device_type: "web".to_string(),
        operating_system: Some("Linux".to_string()),
        browser: Some("Firefox".to_string()),
    };
    let first = db.find_or_create_device(&device).await.unwrap();
    let second = db.find_or_create_device(&device).await.unwrap();
    assert_eq!(first, second);

    for completed in [true, false] {
        db.record_playback(&NewPlayback {
            user_id,
            song_id,
            device_id: first,
            completed,
            playback_duration: Some(120),
            rating: None,
            skipped: Some(!completed),
        })
        .await
        .unwrap();
    }

    let history = db.list_playback_history(user_id, 50).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].song_title, "One");
    assert_eq!(history[0].device_type, "web");

    assert_eq!(db.list_playback_history(user_id, 1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_sync_log_tracks_latest_finished_run() {
    let db = Database::in_memory().await.unwrap();
    let user_id = new_user(&db, "ada").await;

    assert!(db.last_sync_log(user_id).await.unwrap().is_none());

    let failed = db.start_sync_log(user_id, "full").await.unwrap();
    assert!(db.is_syncing(user_id).await.unwrap());
    db.finish_sync_log(failed, SYNC_FAILED, 0, Some("boom"))
        .await
        .unwrap();

    let done = db.start_sync_log(user_id, "full").await.unwrap();
    db.finish_sync_log(done, SYNC_COMPLETED, 12, None)
        .await
        .unwrap();

    // A run still in progress is not the last finished one
    db.start_sync_log(user_id, "full").await.unwrap();

    let last = db.last_sync_log(user_id).await.unwrap().unwrap();
    assert_eq!(last.sync_id, done);
    assert_eq!(last.status, SYNC_COMPLETED);
    assert_eq!(last.items_processed, Some(12));
    assert!(last.completed_at.is_some());
    assert!(db.is_syncing(user_id).await.unwrap());
}

#[tokio::test]
async fn test_tokens_and_stats() {
    let db = Database::in_memory().await.unwrap();
    let user_id = new_user(&db, "ada").await;

    db.save_token(
        user_id,
        &TokenRecord {
            access_token: "a".to_string(),
            refresh_token: Some("r".to_string()),
            expires_at: Utc::now() + Duration::hours(1),
            scope: None,
            spotify_user_id: Some("spotify-ada".to_string()),
        },
    )
    .await
    .unwrap();

    // Saving again without a refresh token keeps the stored one
    db.save_token(
        user_id,
        &TokenRecord {
            access_token: "b".to_string(),
            refresh_token: None,
            expires_at: Utc::now() + Duration::hours(1),
            scope: None,
            spotify_user_id: None,
        },
    )
    .await
    .unwrap();

    let token = db.get_token_for_user(user_id).await.unwrap().unwrap();
    assert_eq!(token.access_token, "b");
    assert_eq!(token.refresh_token.as_deref(), Some("r"));

    let by_spotify = db.find_token_by_spotify_user("spotify-ada").await.unwrap();
    assert_eq!(by_spotify.map(|t| t.user_id), Some(user_id));

    assert!(db.delete_token(user_id).await.unwrap());
    assert!(!db.delete_token(user_id).await.unwrap());

    let stats = db.catalog_stats(user_id).await.unwrap();
    assert_eq!(stats.playlists_count, 0);
}
