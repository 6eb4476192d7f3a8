use std::sync::Arc;

use chrono::Utc;
use color_eyre::eyre::Result;
use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use crate::ports::destination::{DestinationPlatform, DestinationPlaylist};
use crate::ports::source::{SourcePlatform, SourcePlaylist};
use crate::services::sync::matcher::resolve_destination;
use crate::services::sync::resolver::TrackResolver;
use crate::services::sync::strategy::{FirstResult, MatchStrategy};
use crate::services::sync::types::{FailureReport, PlaylistOutcome, SyncError, SyncReport};
use crate::services::sync::writer::replace_tracks;

pub struct SyncOptions {
    /// Upper bound on in-flight track searches within one playlist.
    pub concurrency: usize,
    pub strategy: Arc<dyn MatchStrategy>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            strategy: Arc::new(FirstResult),
        }
    }
}

/// Mirrors every source playlist into the destination.
///
/// Playlists are processed one after another in source order. A failing
/// playlist is recorded on its outcome and the run moves on; unresolved
/// tracks end up in the run's [`FailureReport`]. Only one run may be in
/// progress at a time.
pub struct SyncOrchestrator<S, D> {
    source: S,
    destination: D,
    resolver: TrackResolver,
    concurrency: usize,
    run_guard: Mutex<()>,
}

impl<S: SourcePlatform, D: DestinationPlatform> SyncOrchestrator<S, D> {
    pub fn new(source: S, destination: D, options: SyncOptions) -> Self {
        Self {
            source,
            destination,
            resolver: TrackResolver::new(options.strategy),
            concurrency: options.concurrency.max(1),
            run_guard: Mutex::new(()),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let _guard = self
            .run_guard
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;
        let started_at = Utc::now();

        self.source
            .authorize()
            .await
            .map_err(|cause| SyncError::Authorization {
                platform: "source",
                cause,
            })?;
        self.destination
            .authorize()
            .await
            .map_err(|cause| SyncError::Authorization {
                platform: "destination",
                cause,
            })?;

        let playlists = self
            .source
            .fetch_playlists()
            .await
            .map_err(SyncError::SourceFetch)?;
        tracing::info!("Fetched {} source playlists", playlists.len());

        let owner = self
            .destination
            .current_user()
            .await
            .map_err(SyncError::DestinationProfile)?;
        let mut existing = self
            .destination
            .list_playlists()
            .await
            .map_err(SyncError::DestinationPlaylists)?;
        tracing::info!("Destination account has {} playlists", existing.len());

        let mut failures = FailureReport::default();
        let mut outcomes = Vec::with_capacity(playlists.len());
        for playlist in &playlists {
            let outcome = self
                .sync_playlist(playlist, &mut existing, &owner.id, &mut failures)
                .await;
            outcomes.push(outcome);
        }

        let report = SyncReport {
            started_at,
            finished_at: Utc::now(),
            playlists: outcomes,
            failures,
        };

        for failure in report.failures.records() {
            tracing::warn!("Failed track: '{}' ({})", failure.query, failure.reason);
        }
        tracing::info!(
            "Sync complete: {} playlists, {} failed playlists, {} unresolved tracks",
            report.playlists.len(),
            report.failed_playlists().count(),
            report.failures.len()
        );

        Ok(report)
    }

    #[tracing::instrument(skip_all, fields(playlist = %playlist.title))]
    async fn sync_playlist(
        &self,
        playlist: &SourcePlaylist,
        existing: &mut Vec<DestinationPlaylist>,
        owner_id: &str,
        failures: &mut FailureReport,
    ) -> PlaylistOutcome {
        tracing::info!(
            "Syncing playlist: '{}' ({} tracks)",
            playlist.title,
            playlist.tracks.len()
        );

        let searches: Vec<_> = playlist
            .tracks
            .iter()
            .map(|track| self.resolver.resolve(&self.destination, &track.title))
            .collect();
        // `buffered` yields in input order, so source ordering survives
        // concurrent searches.
        let resolutions: Vec<_> = stream::iter(searches)
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut uris = Vec::with_capacity(resolutions.len());
        let mut unresolved = 0;
        for resolution in resolutions {
            match resolution {
                Ok(track) => uris.push(track.uri()),
                Err(failure) => {
                    unresolved += 1;
                    failures.push(failure);
                }
            }
        }

        let mut outcome = PlaylistOutcome {
            title: playlist.title.clone(),
            destination_id: None,
            action: None,
            tracks_resolved: uris.len(),
            tracks_unresolved: unresolved,
            tracks_written: 0,
            error: None,
        };

        if let Err(e) = self
            .commit(&playlist.title, &uris, existing, owner_id, &mut outcome)
            .await
        {
            tracing::error!("Error updating playlist '{}': {:#}", playlist.title, e);
            outcome.error = Some(format!("{:#}", e));
        }

        outcome
    }

    async fn commit(
        &self,
        title: &str,
        uris: &[String],
        existing: &mut Vec<DestinationPlaylist>,
        owner_id: &str,
        outcome: &mut PlaylistOutcome,
    ) -> Result<()> {
        let (playlist, action) =
            resolve_destination(&self.destination, title, existing, owner_id).await?;
        outcome.destination_id = Some(playlist.id.clone());
        outcome.action = Some(action);

        outcome.tracks_written = replace_tracks(&self.destination, &playlist.id, uris).await?;
        Ok(())
    }
}
