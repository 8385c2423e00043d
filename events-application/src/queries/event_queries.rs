use events_domain::{Event, EventDetails, EventId, TeamId, UserId};

use crate::authorization::authorize_read;
use crate::enrichment;
use crate::upstream::storage_error;
use crate::{AppError, AppState};

pub async fn get_team_event(
    state: &AppState,
    requester: UserId,
    event_id: EventId,
) -> Result<EventDetails, AppError> {
    enrichment::get_event_details(state, event_id, requester).await
}

/// Events of a team, earliest first.
pub async fn list_team_events(
    state: &AppState,
    requester: UserId,
    team_id: TeamId,
) -> Result<Vec<Event>, AppError> {
    authorize_read(state, requester, team_id).await?;
    let mut events = state
        .event_repo
        .list_team_events(team_id)
        .await
        .map_err(|err| storage_error(state, "list_team_events", err))?;
    events.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
    Ok(events)
}
