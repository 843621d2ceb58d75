//! Database schema migrations

use sqlx::SqlitePool;

/// Create every table and index if it does not exist yet.
pub async fn run_migrations(pool: &SqlitePool) -> sqlx::Result<()> {
    // Users and their linked Spotify accounts
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT UNIQUE,
            first_name TEXT NOT NULL DEFAULT '',
            last_name TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS spotify_user_tokens (
            token_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL UNIQUE,
            access_token TEXT NOT NULL,
            refresh_token TEXT,
            expires_at TEXT NOT NULL,
            scope TEXT,
            spotify_user_id TEXT UNIQUE,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Catalog mirrored from Spotify
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS artists (
            artist_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            country TEXT,
            biography TEXT,
            spotify_id TEXT UNIQUE,
            image_url TEXT,
            popularity INTEGER,
            followers INTEGER,
            data_source TEXT NOT NULL,
            formation_year INTEGER,
            artist_type TEXT,
            spotify_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_artists_name ON artists(name);

        CREATE TABLE IF NOT EXISTS albums (
            album_id INTEGER PRIMARY KEY AUTOINCREMENT,
            artist_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            release_date TEXT,
            spotify_id TEXT UNIQUE,
            spotify_url TEXT,
            cover_image_url TEXT,
            total_tracks INTEGER,
            data_source TEXT NOT NULL,
            release_year INTEGER,
            record_label TEXT,
            album_type TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (artist_id) REFERENCES artists(artist_id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_albums_artist ON albums(artist_id);

        CREATE TABLE IF NOT EXISTS genres (
            genre_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            spotify_id TEXT UNIQUE
        );

        CREATE TABLE IF NOT EXISTS songs (
            song_id INTEGER PRIMARY KEY AUTOINCREMENT,
            album_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            duration INTEGER NOT NULL,
            spotify_id TEXT UNIQUE,
            spotify_url TEXT,
            preview_url TEXT,
            isrc TEXT,
            popularity INTEGER,
            data_source TEXT NOT NULL,
            track_number INTEGER,
            disc_number INTEGER NOT NULL DEFAULT 1,
            composer TEXT,
            lyrics TEXT,
            explicit_content INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (album_id) REFERENCES albums(album_id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_songs_album ON songs(album_id);

        CREATE TABLE IF NOT EXISTS song_genres (
            song_id INTEGER NOT NULL,
            genre_id INTEGER NOT NULL,
            PRIMARY KEY (song_id, genre_id),
            FOREIGN KEY (song_id) REFERENCES songs(song_id) ON DELETE CASCADE,
            FOREIGN KEY (genre_id) REFERENCES genres(genre_id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Playlists and their ordered entries
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            playlist_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'private',
            cover_image_url TEXT,
            spotify_id TEXT UNIQUE,
            spotify_snapshot_id TEXT,
            is_synced_with_spotify INTEGER NOT NULL DEFAULT 0,
            last_sync_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            UNIQUE(user_id, name)
        );

        CREATE TABLE IF NOT EXISTS playlist_songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            playlist_id INTEGER NOT NULL,
            song_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            date_added TEXT NOT NULL,
            added_by_user_id INTEGER,
            FOREIGN KEY (playlist_id) REFERENCES playlists(playlist_id) ON DELETE CASCADE,
            FOREIGN KEY (song_id) REFERENCES songs(song_id) ON DELETE CASCADE,
            FOREIGN KEY (added_by_user_id) REFERENCES users(id) ON DELETE SET NULL,
            UNIQUE(playlist_id, song_id)
        );

        CREATE INDEX IF NOT EXISTS idx_playlist_songs_playlist ON playlist_songs(playlist_id, position);
        "#,
    )
    .execute(pool)
    .await?;

    // Favorites
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_favorite_songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            song_id INTEGER NOT NULL,
            favorited_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (song_id) REFERENCES songs(song_id) ON DELETE CASCADE,
            UNIQUE(user_id, song_id)
        );

        CREATE TABLE IF NOT EXISTS user_favorite_artists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            artist_id INTEGER NOT NULL,
            favorited_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (artist_id) REFERENCES artists(artist_id) ON DELETE CASCADE,
            UNIQUE(user_id, artist_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Devices and playback history
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS devices (
            device_id INTEGER PRIMARY KEY AUTOINCREMENT,
            device_name TEXT,
            device_type TEXT NOT NULL,
            operating_system TEXT,
            browser TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS playback_history (
            playback_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            song_id INTEGER NOT NULL,
            device_id INTEGER NOT NULL,
            playback_date TEXT NOT NULL,
            completed INTEGER NOT NULL,
            playback_duration INTEGER,
            rating INTEGER,
            skipped INTEGER,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
            FOREIGN KEY (song_id) REFERENCES songs(song_id) ON DELETE CASCADE,
            FOREIGN KEY (device_id) REFERENCES devices(device_id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_playback_history_user ON playback_history(user_id, playback_date);
        "#,
    )
    .execute(pool)
    .await?;

    // Sync log
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS spotify_sync_log (
            sync_id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            sync_type TEXT NOT NULL,
            status TEXT NOT NULL,
            items_processed INTEGER,
            items_total INTEGER,
            error_message TEXT,
            started_at TEXT,
            completed_at TEXT,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        );
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
