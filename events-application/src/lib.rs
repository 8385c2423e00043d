// Event Orchestration Application Layer

pub mod authorization;
pub mod commands;
pub mod dtos;
pub mod enrichment;
pub mod error;
pub mod event_store;
pub mod metrics;
pub mod queries;
pub mod state;
mod upstream;

pub use error::AppError;
pub use metrics::Metrics;
pub use state::AppState;
