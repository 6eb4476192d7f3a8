use std::sync::Arc;

use crate::services::sync::SyncOrchestrator;

pub struct AppState<S, D> {
    pub orchestrator: Arc<SyncOrchestrator<S, D>>,
}
