//! Database operations split by table family

mod catalog;
mod favorites;
mod history;
mod playlists;
mod sync_log;
mod tokens;
mod users;

pub use catalog::*;
pub use favorites::*;
pub use history::*;
pub use playlists::*;
pub use sync_log::*;
pub use tokens::*;
pub use users::*;

/// Columns of a [`crate::db::SongSummary`], joined through album and artist.
pub(crate) const SONG_SUMMARY_SELECT: &str = r#"
    SELECT s.song_id, s.title, ar.name AS artist_name, al.title AS album_title,
           al.cover_image_url AS album_cover, s.duration, s.spotify_id,
           s.preview_url, s.explicit_content
    FROM songs s
    INNER JOIN albums al ON al.album_id = s.album_id
    INNER JOIN artists ar ON ar.artist_id = al.artist_id
"#;
