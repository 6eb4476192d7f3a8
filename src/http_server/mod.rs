pub mod app;
pub mod error;
pub mod scheduler;
pub mod state;
