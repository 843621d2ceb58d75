use super::SpotifyClient;
use crate::{error::SpotifyError, types::FullAlbum};

impl SpotifyClient {
    /// Full album including its first page of tracks
    pub async fn album(&self, album_id: &str) -> Result<FullAlbum, SpotifyError> {
        self.get_json(&format!("/albums/{album_id}"), &[]).await
    }
}
