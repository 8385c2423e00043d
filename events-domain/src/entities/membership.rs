// Externally owned team and profile data.
// Snapshots are fetched per request and never written by this service.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value_objects::{TeamRole, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: UserId,
    pub role: TeamRole,
}

/// Point-in-time map of team members to their role.
pub type MembershipView = HashMap<UserId, TeamRole>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Profiles keyed by user. Users without a profile are simply absent.
pub type ProfileView = HashMap<UserId, UserProfile>;
