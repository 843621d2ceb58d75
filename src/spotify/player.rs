//! Playback state and remote control of the user's active device.

use super::{Query, SpotifyClient};
use crate::{
    error::SpotifyError,
    types::{CurrentPlayback, Device, DevicesResponse, PlaybackOffset, StartPlayback},
};

/// Accepted values of the repeat mode
pub const REPEAT_STATES: [&str; 3] = ["off", "context", "track"];

/// Picks what to play from the loose fields of a play request.
///
/// Precedence: an explicit `uris` list, then `context_uri` (with `uri` as
/// the offset inside it), then a lone `uri` which plays as a single track
/// when it names a track and as a context otherwise. `None` resumes.
pub fn resolve_play_request(
    uri: Option<&str>,
    context_uri: Option<&str>,
    uris: Option<&[String]>,
) -> Option<StartPlayback> {
    if let Some(uris) = uris.filter(|u| !u.is_empty()) {
        return Some(StartPlayback {
            uris: Some(uris.to_vec()),
            ..Default::default()
        });
    }

    if let Some(context_uri) = context_uri.filter(|c| !c.is_empty()) {
        return Some(StartPlayback {
            context_uri: Some(context_uri.to_string()),
            offset: uri
                .filter(|u| !u.is_empty())
                .map(|u| PlaybackOffset { uri: u.to_string() }),
            ..Default::default()
        });
    }

    match uri.filter(|u| !u.is_empty()) {
        Some(uri) if uri.contains("track") => Some(StartPlayback {
            uris: Some(vec![uri.to_string()]),
            ..Default::default()
        }),
        Some(uri) => Some(StartPlayback {
            context_uri: Some(uri.to_string()),
            ..Default::default()
        }),
        None => None,
    }
}

fn device_query(device_id: Option<&str>) -> Vec<(&'static str, String)> {
    device_id
        .map(|id| vec![("device_id", id.to_string())])
        .unwrap_or_default()
}

impl SpotifyClient {
    /// `None` when nothing is playing
    pub async fn current_playback(&self) -> Result<Option<CurrentPlayback>, SpotifyError> {
        self.get_json_opt("/me/player", &[]).await
    }

    pub async fn devices(&self) -> Result<Vec<Device>, SpotifyError> {
        let res: DevicesResponse = self.get_json("/me/player/devices", &[]).await?;
        Ok(res.devices)
    }

    /// Starts playback of `request`, or resumes when it is `None`
    pub async fn start_playback(
        &self,
        device_id: Option<&str>,
        request: Option<&StartPlayback>,
    ) -> Result<(), SpotifyError> {
        let query = device_query(device_id);
        self.put("/me/player/play", &query, request).await
    }

    pub async fn pause_playback(&self, device_id: Option<&str>) -> Result<(), SpotifyError> {
        self.command_put("/me/player/pause", &device_query(device_id)).await
    }

    pub async fn next_track(&self, device_id: Option<&str>) -> Result<(), SpotifyError> {
        self.post::<()>("/me/player/next", &device_query(device_id), None)
            .await
    }

    pub async fn previous_track(&self, device_id: Option<&str>) -> Result<(), SpotifyError> {
        self.post::<()>("/me/player/previous", &device_query(device_id), None)
            .await
    }

    pub async fn seek_track(&self, position_ms: u64, device_id: Option<&str>) -> Result<(), SpotifyError> {
        let mut query = device_query(device_id);
        query.push(("position_ms", position_ms.to_string()));
        self.command_put("/me/player/seek", &query).await
    }

    pub async fn shuffle(&self, state: bool, device_id: Option<&str>) -> Result<(), SpotifyError> {
        let mut query = device_query(device_id);
        query.push(("state", state.to_string()));
        self.command_put("/me/player/shuffle", &query).await
    }

    /// `state` is one of [`REPEAT_STATES`]
    pub async fn repeat(&self, state: &str, device_id: Option<&str>) -> Result<(), SpotifyError> {
        let mut query = device_query(device_id);
        query.push(("state", state.to_string()));
        self.command_put("/me/player/repeat", &query).await
    }

    async fn command_put(&self, path: &str, query: Query<'_>) -> Result<(), SpotifyError> {
        self.put::<()>(path, query, None).await
    }
}
