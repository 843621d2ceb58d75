use super::SpotifyClient;
use crate::{error::SpotifyError, types::SearchResponse};

impl SpotifyClient {
    /// Searches the catalog. `types` is a comma separated list of
    /// `track`, `artist`, `album` and `playlist`.
    pub async fn search(
        &self,
        query: &str,
        types: &str,
        limit: u32,
    ) -> Result<SearchResponse, SpotifyError> {
        self.get_json(
            "/search",
            &[
                ("q", query.to_string()),
                ("type", types.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }
}
