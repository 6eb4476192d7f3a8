use color_eyre::eyre::Result;
use serde::Serialize;

/// A single entry of a source playlist. The title doubles as the search query
/// used to find the track on the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceTrack {
    pub title: String,
    pub source_id: String,
}

/// A source playlist with its tracks in playlist order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourcePlaylist {
    pub id: String,
    pub title: String,
    pub tracks: Vec<SourceTrack>,
}

/// Port trait for the platform playlists are mirrored from.
///
/// Implementations handle pagination and title-prefix filtering, so every
/// playlist returned takes part in the sync.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SourcePlatform: Send + Sync {
    /// Acquire fresh credentials for a run.
    async fn authorize(&self) -> Result<()>;

    async fn fetch_playlists(&self) -> Result<Vec<SourcePlaylist>>;
}
