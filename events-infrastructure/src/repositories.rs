pub mod memory_events;
pub mod postgres_events;

pub use memory_events::*;
pub use postgres_events::*;
