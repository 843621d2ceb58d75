//! Artists, albums, songs and genres

use chrono::Utc;
use sqlx::SqlitePool;

use super::SONG_SUMMARY_SELECT;
use crate::db::{
    AlbumWithArtist, Artist, CatalogStats, Genre, ListQuery, SongDetail, SongSummary,
    UpsertAlbum, UpsertArtist, UpsertSong,
};

const ALBUM_SELECT: &str = r#"
    SELECT al.*, ar.name AS artist_name, ar.image_url AS artist_image_url,
           ar.spotify_id AS artist_spotify_id
    FROM albums al
    INNER JOIN artists ar ON ar.artist_id = al.artist_id
"#;

const SONG_DETAIL_SELECT: &str = r#"
    SELECT s.*, al.title AS album_title, al.cover_image_url AS album_cover,
           al.spotify_id AS album_spotify_id, ar.artist_id AS artist_id,
           ar.name AS artist_name
    FROM songs s
    INNER JOIN albums al ON al.album_id = s.album_id
    INNER JOIN artists ar ON ar.artist_id = al.artist_id
"#;

/// Builds an `ORDER BY` body from a `field` / `-field` parameter.
///
/// Only names listed in `allowed` reach the SQL; anything else falls back to
/// `default`.
pub(crate) fn order_clause(ordering: Option<&str>, allowed: &[(&str, &str)], default: &str) -> String {
    let resolve = |raw: &str| {
        let (desc, field) = match raw.strip_prefix('-') {
            Some(field) => (true, field),
            None => (false, raw),
        };
        allowed
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, column)| format!("{column} {}", if desc { "DESC" } else { "ASC" }))
    };

    ordering
        .and_then(resolve)
        .or_else(|| resolve(default))
        .unwrap_or_else(|| "1".to_string())
}

fn like_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{s}%"))
}

// ============ Upserts ============

pub async fn upsert_artist(pool: &SqlitePool, artist: &UpsertArtist) -> sqlx::Result<i64> {
    let now = Utc::now();
    sqlx::query_scalar(
        r#"
        INSERT INTO artists (name, spotify_id, spotify_url, image_url, popularity, followers, data_source, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 'spotify', ?, ?)
        ON CONFLICT(spotify_id) DO UPDATE SET
            name = excluded.name,
            spotify_url = COALESCE(excluded.spotify_url, artists.spotify_url),
            image_url = COALESCE(excluded.image_url, artists.image_url),
            popularity = COALESCE(excluded.popularity, artists.popularity),
            followers = COALESCE(excluded.followers, artists.followers),
            data_source = excluded.data_source,
            updated_at = excluded.updated_at
        RETURNING artist_id
        "#,
    )
    .bind(&artist.name)
    .bind(&artist.spotify_id)
    .bind(&artist.spotify_url)
    .bind(&artist.image_url)
    .bind(artist.popularity)
    .bind(artist.followers)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn upsert_album(pool: &SqlitePool, album: &UpsertAlbum) -> sqlx::Result<i64> {
    let now = Utc::now();
    sqlx::query_scalar(
        r#"
        INSERT INTO albums (artist_id, title, release_date, release_year, album_type, cover_image_url,
                            total_tracks, spotify_id, spotify_url, data_source, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'spotify', ?, ?)
        ON CONFLICT(spotify_id) DO UPDATE SET
            artist_id = excluded.artist_id,
            title = excluded.title,
            release_date = excluded.release_date,
            release_year = excluded.release_year,
            album_type = excluded.album_type,
            cover_image_url = excluded.cover_image_url,
            total_tracks = excluded.total_tracks,
            spotify_url = excluded.spotify_url,
            data_source = excluded.data_source,
            updated_at = excluded.updated_at
        RETURNING album_id
        "#,
    )
    .bind(album.artist_id)
    .bind(&album.title)
    .bind(album.release_date)
    .bind(album.release_year)
    .bind(&album.album_type)
    .bind(&album.cover_image_url)
    .bind(album.total_tracks)
    .bind(&album.spotify_id)
    .bind(&album.spotify_url)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn upsert_song(pool: &SqlitePool, song: &UpsertSong) -> sqlx::Result<i64> {
    let now = Utc::now();
    sqlx::query_scalar(
        r#"
        INSERT INTO songs (album_id, title, duration, track_number, disc_number, explicit_content,
                           preview_url, spotify_url, popularity, isrc, spotify_id, data_source,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, COALESCE(?, 1), ?, ?, ?, ?, ?, ?, 'spotify', ?, ?)
        ON CONFLICT(spotify_id) DO UPDATE SET
            album_id = excluded.album_id,
            title = excluded.title,
            duration = excluded.duration,
            track_number = excluded.track_number,
            disc_number = excluded.disc_number,
            explicit_content = excluded.explicit_content,
            preview_url = excluded.preview_url,
            spotify_url = excluded.spotify_url,
            popularity = excluded.popularity,
            isrc = excluded.isrc,
            data_source = excluded.data_source,
            updated_at = excluded.updated_at
        RETURNING song_id
        "#,
    )
    .bind(song.album_id)
    .bind(&song.title)
    .bind(song.duration)
    .bind(song.track_number)
    .bind(song.disc_number)
    .bind(song.explicit_content)
    .bind(&song.preview_url)
    .bind(&song.spotify_url)
    .bind(song.popularity)
    .bind(&song.isrc)
    .bind(&song.spotify_id)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn upsert_genre(pool: &SqlitePool, name: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        "INSERT INTO genres (name) VALUES (?) ON CONFLICT(name) DO UPDATE SET name = excluded.name RETURNING genre_id",
    )
    .bind(name)
    .fetch_one(pool)
    .await
}

/// Tag every stored song of an artist with a genre
pub async fn tag_artist_songs(pool: &SqlitePool, artist_id: i64, genre_id: i64) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT OR IGNORE INTO song_genres (song_id, genre_id)
        SELECT s.song_id, ? FROM songs s
        INNER JOIN albums al ON al.album_id = s.album_id
        WHERE al.artist_id = ?
        "#,
    )
    .bind(genre_id)
    .bind(artist_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

// ============ Artists ============

pub async fn list_artists(pool: &SqlitePool, query: &ListQuery) -> sqlx::Result<Vec<Artist>> {
    let order = order_clause(
        query.ordering.as_deref(),
        &[("name", "name"), ("popularity", "popularity"), ("followers", "followers")],
        "-popularity",
    );
    let sql = format!(
        "SELECT * FROM artists WHERE (?1 IS NULL OR name LIKE ?1 OR country LIKE ?1) ORDER BY {order}, artist_id"
    );
    sqlx::query_as::<_, Artist>(&sql)
        .bind(like_pattern(query.search.as_deref()))
        .fetch_all(pool)
        .await
}

pub async fn get_artist(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Artist>> {
    sqlx::query_as::<_, Artist>("SELECT * FROM artists WHERE artist_id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_artist_by_spotify_id(
    pool: &SqlitePool,
    spotify_id: &str,
) -> sqlx::Result<Option<Artist>> {
    sqlx::query_as::<_, Artist>("SELECT * FROM artists WHERE spotify_id = ?")
        .bind(spotify_id)
        .fetch_optional(pool)
        .await
}

/// Case-insensitive lookup by exact name
pub async fn find_artist_by_name(pool: &SqlitePool, name: &str) -> sqlx::Result<Option<Artist>> {
    sqlx::query_as::<_, Artist>("SELECT * FROM artists WHERE lower(name) = lower(?) LIMIT 1")
        .bind(name)
        .fetch_optional(pool)
        .await
}

// ============ Albums ============

pub async fn list_albums(pool: &SqlitePool, query: &ListQuery) -> sqlx::Result<Vec<AlbumWithArtist>> {
    let order = order_clause(
        query.ordering.as_deref(),
        &[
            ("title", "al.title"),
            ("release_date", "al.release_date"),
            ("release_year", "al.release_year"),
        ],
        "-release_date",
    );
    let sql = format!(
        "{ALBUM_SELECT} WHERE (?1 IS NULL OR al.title LIKE ?1 OR ar.name LIKE ?1) ORDER BY {order}, al.album_id"
    );
    sqlx::query_as::<_, AlbumWithArtist>(&sql)
        .bind(like_pattern(query.search.as_deref()))
        .fetch_all(pool)
        .await
}

pub async fn get_album(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<AlbumWithArtist>> {
    let sql = format!("{ALBUM_SELECT} WHERE al.album_id = ?");
    sqlx::query_as::<_, AlbumWithArtist>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn albums_for_artist(pool: &SqlitePool, artist_id: i64) -> sqlx::Result<Vec<AlbumWithArtist>> {
    let sql = format!("{ALBUM_SELECT} WHERE al.artist_id = ? ORDER BY al.release_date DESC, al.album_id");
    sqlx::query_as::<_, AlbumWithArtist>(&sql)
        .bind(artist_id)
        .fetch_all(pool)
        .await
}

// ============ Songs ============

pub async fn list_songs(pool: &SqlitePool, query: &ListQuery) -> sqlx::Result<Vec<SongSummary>> {
    let order = order_clause(
        query.ordering.as_deref(),
        &[
            ("title", "s.title"),
            ("popularity", "s.popularity"),
            ("duration", "s.duration"),
        ],
        "-popularity",
    );
    let sql = format!(
        "{SONG_SUMMARY_SELECT} WHERE (?1 IS NULL OR s.title LIKE ?1 OR ar.name LIKE ?1 OR al.title LIKE ?1) ORDER BY {order}, s.song_id"
    );
    sqlx::query_as::<_, SongSummary>(&sql)
        .bind(like_pattern(query.search.as_deref()))
        .fetch_all(pool)
        .await
}

pub async fn get_song(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<SongDetail>> {
    let sql = format!("{SONG_DETAIL_SELECT} WHERE s.song_id = ?");
    sqlx::query_as::<_, SongDetail>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Songs of an album ordered by disc and track number
pub async fn songs_for_album(pool: &SqlitePool, album_id: i64) -> sqlx::Result<Vec<SongDetail>> {
    let sql = format!(
        "{SONG_DETAIL_SELECT} WHERE s.album_id = ? ORDER BY s.disc_number, s.track_number, s.song_id"
    );
    sqlx::query_as::<_, SongDetail>(&sql)
        .bind(album_id)
        .fetch_all(pool)
        .await
}

// ============ Genres ============

pub async fn genres_for_song(pool: &SqlitePool, song_id: i64) -> sqlx::Result<Vec<Genre>> {
    sqlx::query_as::<_, Genre>(
        r#"
        SELECT g.* FROM genres g
        INNER JOIN song_genres sg ON sg.genre_id = g.genre_id
        WHERE sg.song_id = ?
        ORDER BY g.name
        "#,
    )
    .bind(song_id)
    .fetch_all(pool)
    .await
}

pub async fn list_genres(pool: &SqlitePool, search: Option<&str>) -> sqlx::Result<Vec<Genre>> {
    sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE (?1 IS NULL OR name LIKE ?1) ORDER BY name")
        .bind(like_pattern(search))
        .fetch_all(pool)
        .await
}

pub async fn get_genre(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Genre>> {
    sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE genre_id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

// ============ Stats ============

pub async fn catalog_stats(pool: &SqlitePool, user_id: i64) -> sqlx::Result<CatalogStats> {
    let playlists_count = sqlx::query_scalar("SELECT COUNT(*) FROM playlists WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    let songs_count = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(pool)
        .await?;
    let artists_count = sqlx::query_scalar("SELECT COUNT(*) FROM artists")
        .fetch_one(pool)
        .await?;

    Ok(CatalogStats {
        playlists_count,
        songs_count,
        artists_count,
    })
}
