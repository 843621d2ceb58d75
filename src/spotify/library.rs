//! The current user's library: profile, playlists, saved tracks, top items
//! and listening history.

use super::SpotifyClient;
use crate::{
    error::SpotifyError,
    types::{
        CursorPage, FullArtist, FullTrack, Page, PlayHistory, PlaylistItem, PrivateUser,
        SavedTrack, SimplifiedPlaylist,
    },
};

/// Largest page size Spotify accepts on library endpoints
pub const MAX_PAGE_SIZE: u32 = 50;

impl SpotifyClient {
    pub async fn current_user(&self) -> Result<PrivateUser, SpotifyError> {
        self.get_json("/me", &[]).await
    }

    /// First page of the user's playlists
    pub async fn current_user_playlists(
        &self,
        limit: u32,
    ) -> Result<Page<SimplifiedPlaylist>, SpotifyError> {
        self.get_json("/me/playlists", &[("limit", limit.to_string())])
            .await
    }

    /// Every playlist of the user
    pub async fn all_playlists(&self) -> Result<Vec<SimplifiedPlaylist>, SpotifyError> {
        let first = self.current_user_playlists(MAX_PAGE_SIZE).await?;
        self.collect_pages(first).await
    }

    /// Every item of a playlist, following `next` links
    pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<PlaylistItem>, SpotifyError> {
        let first: Page<PlaylistItem> = self
            .get_json(
                &format!("/playlists/{playlist_id}/tracks"),
                &[("limit", "100".to_string())],
            )
            .await?;
        self.collect_pages(first).await
    }

    /// First page of saved tracks
    pub async fn saved_tracks(&self, limit: u32) -> Result<Page<SavedTrack>, SpotifyError> {
        self.get_json("/me/tracks", &[("limit", limit.to_string())])
            .await
    }

    pub async fn all_saved_tracks(&self) -> Result<Vec<SavedTrack>, SpotifyError> {
        let first = self.saved_tracks(MAX_PAGE_SIZE).await?;
        self.collect_pages(first).await
    }

    /// `time_range` is one of `short_term`, `medium_term`, `long_term`
    pub async fn current_user_top_artists(
        &self,
        limit: u32,
        time_range: &str,
    ) -> Result<Page<FullArtist>, SpotifyError> {
        self.get_json(
            "/me/top/artists",
            &[
                ("limit", limit.to_string()),
                ("time_range", time_range.to_string()),
            ],
        )
        .await
    }

    pub async fn current_user_top_tracks(
        &self,
        limit: u32,
        time_range: &str,
    ) -> Result<Page<FullTrack>, SpotifyError> {
        self.get_json(
            "/me/top/tracks",
            &[
                ("limit", limit.to_string()),
                ("time_range", time_range.to_string()),
            ],
        )
        .await
    }

    pub async fn current_user_recently_played(
        &self,
        limit: u32,
    ) -> Result<CursorPage<PlayHistory>, SpotifyError> {
        self.get_json(
            "/me/player/recently-played",
            &[("limit", limit.to_string())],
        )
        .await
    }
}
