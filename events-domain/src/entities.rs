// Domain entities
pub mod change;
pub mod config;
pub mod event;
pub mod membership;

pub use change::*;
pub use config::*;
pub use event::*;
pub use membership::*;
