use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::State, routing::get};
use color_eyre::eyre::{Context, eyre};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    http_server::{error::Report, scheduler::spawn_sync_scheduler, state::AppState},
    ports::{destination::DestinationPlatform, source::SourcePlatform},
    services::sync::{SyncOrchestrator, SyncReport},
};

pub struct HttpServerConfig<S, D> {
    pub port: u16,
    pub orchestrator: Arc<SyncOrchestrator<S, D>>,
    pub sync_interval: Option<Duration>,
}

async fn root() -> &'static str {
    "playlist-mirror is running. GET /sync-playlists mirrors YouTube playlists to Spotify."
}

async fn sync_playlists<S, D>(
    State(app_state): State<Arc<AppState<S, D>>>,
) -> Result<Json<SyncReport>, Report>
where
    S: SourcePlatform + 'static,
    D: DestinationPlatform + 'static,
{
    let orchestrator = app_state.orchestrator.clone();
    // Run detached so a dropped connection does not abort a half-written sync.
    let report = tokio::spawn(async move { orchestrator.run().await })
        .await
        .wrap_err("Sync task panicked")??;
    Ok(Json(report))
}

pub fn router<S, D>(orchestrator: Arc<SyncOrchestrator<S, D>>) -> Router
where
    S: SourcePlatform + 'static,
    D: DestinationPlatform + 'static,
{
    let app_state = Arc::new(AppState { orchestrator });

    Router::new()
        .route("/", get(root))
        .route("/sync-playlists", get(sync_playlists::<S, D>))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}

pub async fn start<S, D>(config: HttpServerConfig<S, D>) -> color_eyre::Result<()>
where
    S: SourcePlatform + 'static,
    D: DestinationPlatform + 'static,
{
    if let Some(period) = config.sync_interval {
        spawn_sync_scheduler(config.orchestrator.clone(), period);
    }

    let app = router(config.orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", config.port))?;
    tracing::info!("Listening on port {}", config.port);
    axum::serve(listener, app)
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}
