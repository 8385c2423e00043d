use tracing::{info, warn};

use events_domain::{MembershipView, TeamId, TeamRole, UserId, READ_ROLES};

use crate::upstream::call_upstream;
use crate::{AppError, AppState};

/// Checks the requester's role in `team_id` against `required`.
///
/// An RPC failure is reported as `UpstreamUnavailable`, never as a denial.
pub async fn authorize(
    state: &AppState,
    requester: UserId,
    team_id: TeamId,
    required: &[TeamRole],
) -> Result<TeamRole, AppError> {
    let membership = call_upstream(
        state,
        "check_membership",
        state.membership.check_membership(team_id, &[requester]),
    )
    .await?;
    decide(requester, team_id, &membership, required)
}

pub async fn authorize_write(
    state: &AppState,
    requester: UserId,
    team_id: TeamId,
) -> Result<TeamRole, AppError> {
    authorize(state, requester, team_id, &state.config.event_write_roles).await
}

pub async fn authorize_read(
    state: &AppState,
    requester: UserId,
    team_id: TeamId,
) -> Result<TeamRole, AppError> {
    authorize(state, requester, team_id, READ_ROLES).await
}

fn decide(
    requester: UserId,
    team_id: TeamId,
    membership: &MembershipView,
    required: &[TeamRole],
) -> Result<TeamRole, AppError> {
    let Some(role) = membership.get(&requester).copied() else {
        warn!(user_id = %requester, team_id = %team_id, "requester is not a team member");
        return Err(AppError::Forbidden);
    };
    if !role.is_any_of(required) {
        warn!(user_id = %requester, team_id = %team_id, role = %role, "role not permitted");
        return Err(AppError::Forbidden);
    }
    info!(user_id = %requester, team_id = %team_id, role = %role, "authorized");
    Ok(role)
}
