pub mod matcher;
pub mod orchestrator;
pub mod resolver;
pub mod strategy;
pub mod types;
pub mod writer;

pub use orchestrator::{SyncOptions, SyncOrchestrator};
pub use types::{SyncError, SyncReport};
