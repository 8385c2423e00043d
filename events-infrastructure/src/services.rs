pub mod change_notifier;
pub mod membership_client;
pub mod profile_client;

pub use change_notifier::*;
pub use membership_client::*;
pub use profile_client::*;
