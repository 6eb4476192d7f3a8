use color_eyre::eyre::Result;
use serde::Serialize;

/// Decoupled representation of a destination playlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationPlaylist {
    pub id: String,
    pub name: String,
}

/// Decoupled representation of a destination track search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTrack {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationUser {
    pub id: String,
}

/// Port trait wrapping the destination API capabilities used by the sync.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DestinationPlatform: Send + Sync {
    /// Acquire fresh credentials for a run.
    async fn authorize(&self) -> Result<()>;

    /// Free-text track search, best match first, at most `limit` results.
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<DestinationTrack>>;

    async fn current_user(&self) -> Result<DestinationUser>;

    async fn list_playlists(&self) -> Result<Vec<DestinationPlaylist>>;

    /// Creates a private playlist owned by `owner_id`.
    async fn create_playlist(&self, owner_id: &str, name: &str) -> Result<DestinationPlaylist>;

    /// Replaces the whole membership of a playlist with `uris`, in order.
    async fn replace_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;
}
