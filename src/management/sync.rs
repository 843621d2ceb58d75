//! Mirrors a user's Spotify library into the local catalog.
//!
//! Every write is an upsert keyed by Spotify ID, so running a sync twice
//! leaves the same rows behind. Playlist entries are the exception: they are
//! replaced wholesale on each run.

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::{
    db::{
        Database, NewPlaylistEntry, UpsertAlbum, UpsertArtist, UpsertPlaylist, UpsertSong,
        ops::{SYNC_COMPLETED, SYNC_FAILED},
    },
    error::SpotifyError,
    spotify::SpotifyClient,
    types::{FullArtist, FullTrack, SimplifiedAlbum, SimplifiedArtist, SimplifiedPlaylist},
    utils,
};

const TOP_ARTISTS_LIMIT: u32 = 50;
const TOP_ARTISTS_RANGE: &str = "medium_term";

fn enabled() -> bool {
    true
}

/// Which parts of the library a sync run covers
#[derive(Debug, Clone, Deserialize)]
pub struct SyncOptions {
    #[serde(default = "enabled")]
    pub sync_playlists: bool,
    #[serde(default = "enabled")]
    pub sync_saved_tracks: bool,
    #[serde(default = "enabled")]
    pub sync_top_artists: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            sync_playlists: true,
            sync_saved_tracks: true,
            sync_top_artists: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Tabled)]
pub struct SyncResults {
    #[tabled(rename = "Playlists")]
    pub playlists_synced: usize,
    #[tabled(rename = "Saved tracks")]
    pub tracks_synced: usize,
    #[tabled(rename = "Top artists")]
    pub artists_synced: usize,
}

impl SyncResults {
    pub fn total(&self) -> usize {
        self.playlists_synced + self.tracks_synced + self.artists_synced
    }
}

pub struct SyncService {
    db: Database,
    client: SpotifyClient,
    user_id: i64,
}

impl SyncService {
    pub fn new(db: Database, client: SpotifyClient, user_id: i64) -> Self {
        Self {
            db,
            client,
            user_id,
        }
    }

    /// Upsert an artist as referenced from a track or album.
    ///
    /// Returns `None` for artists without a Spotify ID.
    pub async fn sync_artist(&self, artist: &SimplifiedArtist) -> Result<Option<i64>, SpotifyError> {
        let Some(spotify_id) = artist.id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        let name = if artist.name.is_empty() {
            "Unknown artist".to_string()
        } else {
            artist.name.clone()
        };

        let id = self
            .db
            .upsert_artist(&UpsertArtist {
                spotify_id: spotify_id.to_string(),
                name,
                spotify_url: artist.external_urls.spotify.clone(),
                ..Default::default()
            })
            .await?;
        Ok(Some(id))
    }

    /// Upsert an artist with its profile details and genres
    pub async fn sync_full_artist(&self, artist: &FullArtist) -> Result<i64, SpotifyError> {
        let artist_id = self
            .db
            .upsert_artist(&UpsertArtist {
                spotify_id: artist.id.clone(),
                name: artist.name.clone(),
                spotify_url: artist.external_urls.spotify.clone(),
                image_url: utils::first_image_url(&artist.images),
                popularity: artist.popularity.map(i64::from),
                followers: artist.followers.as_ref().map(|f| f.total as i64),
            })
            .await?;

        for genre in &artist.genres {
            let genre_id = self.db.upsert_genre(genre).await?;
            self.db.tag_artist_songs(artist_id, genre_id).await?;
        }

        Ok(artist_id)
    }

    /// Upsert an album under `artist_id`. Returns `None` for albums without
    /// a Spotify ID.
    pub async fn sync_album(
        &self,
        album: &SimplifiedAlbum,
        artist_id: i64,
    ) -> Result<Option<i64>, SpotifyError> {
        let Some(spotify_id) = album.id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        let release = album
            .release_date
            .as_deref()
            .and_then(utils::parse_release_date);

        let title = if album.name.is_empty() {
            "Unknown album".to_string()
        } else {
            album.name.clone()
        };

        let id = self
            .db
            .upsert_album(&UpsertAlbum {
                spotify_id: spotify_id.to_string(),
                artist_id,
                title,
                release_date: release.map(|(date, _)| date),
                release_year: release.map(|(_, year)| i64::from(year)),
                album_type: album.album_type.clone(),
                cover_image_url: utils::first_image_url(&album.images),
                total_tracks: album.total_tracks.map(i64::from),
                spotify_url: album.external_urls.spotify.clone(),
            })
            .await?;
        Ok(Some(id))
    }

    /// Upsert a track together with its first artist and its album.
    ///
    /// Local files and podcast episodes come without an ID or artists and
    /// yield `None`.
    pub async fn sync_song(&self, track: &FullTrack) -> Result<Option<i64>, SpotifyError> {
        let Some(spotify_id) = track.id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(None);
        };
        let Some(first_artist) = track.artists.first() else {
            return Ok(None);
        };
        let Some(artist_id) = self.sync_artist(first_artist).await? else {
            return Ok(None);
        };
        let Some(album) = track.album.as_ref() else {
            return Ok(None);
        };
        let Some(album_id) = self.sync_album(album, artist_id).await? else {
            return Ok(None);
        };

        let song_id = self
            .db
            .upsert_song(&UpsertSong {
                spotify_id: spotify_id.to_string(),
                album_id,
                title: track.name.clone(),
                duration: track.duration_ms as i64,
                track_number: track.track_number.map(i64::from),
                disc_number: track.disc_number.map(i64::from),
                explicit_content: track.explicit,
                preview_url: track.preview_url.clone(),
                spotify_url: track.external_urls.spotify.clone(),
                popularity: Some(i64::from(track.popularity.unwrap_or(0))),
                isrc: track.external_ids.isrc.clone(),
            })
            .await?;
        Ok(Some(song_id))
    }

    /// Sync every playlist of the user with its tracks.
    ///
    /// A playlist that fails is logged and skipped. Returns the number of
    /// playlists synced.
    pub async fn sync_playlists(&self) -> Result<usize, SpotifyError> {
        tracing::info!(user_id = self.user_id, "syncing playlists");

        let playlists = self.client.all_playlists().await?;
        if playlists.is_empty() {
            tracing::warn!(user_id = self.user_id, "no playlists found on Spotify");
            return Ok(0);
        }

        let mut synced = 0;
        for playlist in &playlists {
            match self.sync_playlist(playlist).await {
                Ok(_) => synced += 1,
                Err(e) => {
                    tracing::error!(
                        user_id = self.user_id,
                        playlist = %playlist.name,
                        error = %e,
                        "failed to sync playlist"
                    );
                }
            }
        }

        tracing::info!(user_id = self.user_id, synced, "playlists synced");
        Ok(synced)
    }

    async fn sync_playlist(&self, playlist: &SimplifiedPlaylist) -> Result<i64, SpotifyError> {
        let playlist_id = self
            .db
            .upsert_synced_playlist(&UpsertPlaylist {
                user_id: self.user_id,
                spotify_id: playlist.id.clone(),
                name: playlist.name.clone(),
                description: Some(playlist.description.clone().unwrap_or_default()),
                cover_image_url: utils::first_image_url(&playlist.images),
                snapshot_id: playlist.snapshot_id.clone(),
            })
            .await?;

        self.sync_playlist_tracks(playlist_id, &playlist.id).await?;
        Ok(playlist_id)
    }

    /// Replace the entries of a local playlist with the remote items.
    ///
    /// Entries keep their remote position (index + 1). Returns the number of
    /// entries written.
    pub async fn sync_playlist_tracks(
        &self,
        playlist_id: i64,
        spotify_playlist_id: &str,
    ) -> Result<usize, SpotifyError> {
        let items = self.client.playlist_tracks(spotify_playlist_id).await?;

        let mut entries = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let Some(track) = item.track.as_ref() else {
                continue;
            };
            if let Some(song_id) = self.sync_song(track).await? {
                entries.push(NewPlaylistEntry {
                    song_id,
                    position: idx as i64 + 1,
                    date_added: utils::parse_timestamp_or_now(item.added_at.as_deref()),
                });
            }
        }

        let written = self.db.replace_playlist_entries(playlist_id, &entries).await?;
        Ok(written as usize)
    }

    /// Sync saved tracks and mark them as favorites. Returns the count.
    pub async fn sync_saved_tracks(&self) -> Result<usize, SpotifyError> {
        tracing::info!(user_id = self.user_id, "syncing saved tracks");

        let saved = self.client.all_saved_tracks().await?;
        let mut synced = 0;
        for item in &saved {
            if let Some(song_id) = self.sync_song(&item.track).await? {
                self.db.add_favorite_song(self.user_id, song_id).await?;
                synced += 1;
            }
        }
        Ok(synced)
    }

    /// Sync top artists and mark them as favorites. Returns the count.
    pub async fn sync_top_artists(&self) -> Result<usize, SpotifyError> {
        tracing::info!(user_id = self.user_id, "syncing top artists");

        let page = self
            .client
            .current_user_top_artists(TOP_ARTISTS_LIMIT, TOP_ARTISTS_RANGE)
            .await?;
        for artist in &page.items {
            let artist_id = self.sync_full_artist(artist).await?;
            self.db.add_favorite_artist(self.user_id, artist_id).await?;
        }
        Ok(page.items.len())
    }

    /// Run the selected parts and record the run in the sync log
    pub async fn full_sync(&self, options: &SyncOptions) -> Result<SyncResults, SpotifyError> {
        tracing::info!(user_id = self.user_id, ?options, "full sync started");
        let sync_id = self.db.start_sync_log(self.user_id, "full").await?;

        match self.run(options).await {
            Ok(results) => {
                self.db
                    .finish_sync_log(sync_id, SYNC_COMPLETED, results.total() as i64, None)
                    .await?;
                tracing::info!(
                    user_id = self.user_id,
                    playlists = results.playlists_synced,
                    tracks = results.tracks_synced,
                    artists = results.artists_synced,
                    "full sync completed"
                );
                Ok(results)
            }
            Err(e) => {
                let message = e.to_string();
                if let Err(log_err) = self
                    .db
                    .finish_sync_log(sync_id, SYNC_FAILED, 0, Some(&message))
                    .await
                {
                    tracing::error!(error = %log_err, "failed to record sync failure");
                }
                tracing::error!(user_id = self.user_id, error = %message, "full sync failed");
                Err(e)
            }
        }
    }

    async fn run(&self, options: &SyncOptions) -> Result<SyncResults, SpotifyError> {
        let mut results = SyncResults::default();
        if options.sync_playlists {
            results.playlists_synced = self.sync_playlists().await?;
        }
        if options.sync_saved_tracks {
            results.tracks_synced = self.sync_saved_tracks().await?;
        }
        if options.sync_top_artists {
            results.artists_synced = self.sync_top_artists().await?;
        }
        Ok(results)
    }
}
