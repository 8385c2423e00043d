use async_trait::async_trait;

use crate::entities::{EventChange, MembershipView, ProfileView, TeamMember};
use crate::value_objects::{TeamId, UserId};

/// Team service view of who belongs to a team.
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    /// Returns the roles of those `user_ids` that are members of the team.
    /// Non-members are absent from the map.
    async fn check_membership(
        &self,
        team_id: TeamId,
        user_ids: &[UserId],
    ) -> anyhow::Result<MembershipView>;

    /// Returns the full roster. An unknown or empty team yields an empty list.
    async fn team_summary(&self, team_id: TeamId) -> anyhow::Result<Vec<TeamMember>>;
}

/// User service view of display attributes.
#[async_trait]
pub trait ProfileOracle: Send + Sync {
    /// One batched lookup. Users without a profile are omitted.
    async fn get_profiles(&self, user_ids: &[UserId]) -> anyhow::Result<ProfileView>;
}

/// Best-effort publication of committed changes.
pub trait ChangeNotifier: Send + Sync {
    /// Must return immediately; delivery failures are the notifier's to log.
    fn publish(&self, change: EventChange);
}
