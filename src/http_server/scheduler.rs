use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::ports::destination::DestinationPlatform;
use crate::ports::source::SourcePlatform;
use crate::services::sync::{SyncError, SyncOrchestrator};

/// Spawn a task that runs a sync every `period`, starting one period from now.
/// A tick that lands while another run is in progress is skipped.
pub fn spawn_sync_scheduler<S, D>(
    orchestrator: Arc<SyncOrchestrator<S, D>>,
    period: Duration,
) -> JoinHandle<()>
where
    S: SourcePlatform + 'static,
    D: DestinationPlatform + 'static,
{
    tokio::spawn(async move {
        tracing::info!(
            "Periodic sync every {}",
            humantime::format_duration(period)
        );
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match orchestrator.run().await {
                Ok(report) => tracing::info!(
                    "Periodic sync finished: {} playlists, {} unresolved tracks",
                    report.playlists.len(),
                    report.failures.len()
                ),
                Err(SyncError::AlreadyRunning) => {
                    tracing::info!("Skipping periodic sync, a run is already in progress")
                }
                Err(e) => tracing::error!("Periodic sync failed: {:#}", e),
            }
        }
    })
}
