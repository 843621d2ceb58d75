use super::SpotifyClient;
use crate::{
    error::SpotifyError,
    types::{ArtistTopTracks, FullArtist, FullTrack, Page, SimplifiedAlbum},
};

impl SpotifyClient {
    pub async fn artist(&self, artist_id: &str) -> Result<FullArtist, SpotifyError> {
        self.get_json(&format!("/artists/{artist_id}"), &[]).await
    }

    /// Most popular tracks of an artist in `market`
    pub async fn artist_top_tracks(
        &self,
        artist_id: &str,
        market: &str,
    ) -> Result<Vec<FullTrack>, SpotifyError> {
        let res: ArtistTopTracks = self
            .get_json(
                &format!("/artists/{artist_id}/top-tracks"),
                &[("market", market.to_string())],
            )
            .await?;
        Ok(res.tracks)
    }

    /// One page of an artist's releases.
    ///
    /// `include_groups` is a comma separated list such as `album,single`.
    pub async fn artist_albums(
        &self,
        artist_id: &str,
        include_groups: &str,
        limit: u32,
    ) -> Result<Vec<SimplifiedAlbum>, SpotifyError> {
        let page: Page<SimplifiedAlbum> = self
            .get_json(
                &format!("/artists/{artist_id}/albums"),
                &[
                    ("include_groups", include_groups.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(page.items)
    }
}
