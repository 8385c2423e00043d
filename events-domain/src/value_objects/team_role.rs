// Team role value object

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Coach,
    Manager,
    Player,
    Unknown,
}

/// Roles allowed to create or modify team events.
pub const WRITE_ROLES: &[TeamRole] = &[TeamRole::Coach, TeamRole::Manager];

/// Roles allowed to view team events and respond to them.
pub const READ_ROLES: &[TeamRole] = &[TeamRole::Coach, TeamRole::Manager, TeamRole::Player];

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Coach => "coach",
            TeamRole::Manager => "manager",
            TeamRole::Player => "player",
            TeamRole::Unknown => "unknown",
        }
    }

    /// `Unknown` never satisfies a requirement, even if a caller lists it.
    pub fn is_any_of(&self, allowed: &[TeamRole]) -> bool {
        *self != TeamRole::Unknown && allowed.contains(self)
    }
}

impl From<&str> for TeamRole {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "coach" => TeamRole::Coach,
            "manager" => TeamRole::Manager,
            "player" => TeamRole::Player,
            _ => TeamRole::Unknown,
        }
    }
}

impl fmt::Display for TeamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
