use chrono::{DateTime, Utc};
use serde::Serialize;

pub const SPOTIFY_TRACK_URI_PREFIX: &str = "spotify:track:";

/// A source track that was matched to a destination track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub destination_track_id: String,
}

impl ResolvedTrack {
    pub fn new(destination_track_id: impl Into<String>) -> Self {
        Self {
            destination_track_id: destination_track_id.into(),
        }
    }

    pub fn uri(&self) -> String {
        format!("{}{}", SPOTIFY_TRACK_URI_PREFIX, self.destination_track_id)
    }
}

/// A track query that could not be resolved, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub query: String,
    pub reason: String,
}

impl FailureRecord {
    pub fn new(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            reason: reason.into(),
        }
    }
}

/// Unresolved tracks of a single run, in the order they were encountered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FailureReport(Vec<FailureRecord>);

impl FailureReport {
    pub fn push(&mut self, record: FailureRecord) {
        self.0.push(record);
    }

    pub fn records(&self) -> &[FailureRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaylistAction {
    Created,
    Reused,
}

/// What happened to one source playlist during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaylistOutcome {
    pub title: String,
    pub destination_id: Option<String>,
    pub action: Option<PlaylistAction>,
    pub tracks_resolved: usize,
    pub tracks_unresolved: usize,
    pub tracks_written: usize,
    pub error: Option<String>,
}

/// Result of a sync run
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub playlists: Vec<PlaylistOutcome>,
    pub failures: FailureReport,
}

impl SyncReport {
    pub fn failed_playlists(&self) -> impl Iterator<Item = &PlaylistOutcome> {
        self.playlists.iter().filter(|p| p.error.is_some())
    }
}

/// Errors that abort a whole run before any playlist is processed.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("A sync run is already in progress")]
    AlreadyRunning,
    #[error("Failed to authorize with {platform}: {cause:#}")]
    Authorization {
        platform: &'static str,
        cause: color_eyre::Report,
    },
    #[error("Failed to fetch source playlists: {0:#}")]
    SourceFetch(color_eyre::Report),
    #[error("Failed to fetch destination account profile: {0:#}")]
    DestinationProfile(color_eyre::Report),
    #[error("Failed to list destination playlists: {0:#}")]
    DestinationPlaylists(color_eyre::Report),
}
