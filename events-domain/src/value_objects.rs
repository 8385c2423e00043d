// Domain value objects
pub mod attendance_status;
pub mod identifiers;
pub mod team_role;

pub use attendance_status::*;
pub use identifiers::*;
pub use team_role::*;
