use tracing::info;

use events_domain::{
    AttendanceStatus, Event, EventChange, EventChangeKind, EventId, EventPatch, NewEvent, TeamId,
    UserId,
};

use crate::authorization::{authorize_read, authorize_write};
use crate::event_store::{self, CreatedEvent};
use crate::upstream::storage_error;
use crate::{AppError, AppState};

/// Creates an event for the requester's team and seeds a pending attendance
/// row for every roster member. The change is published only after commit.
pub async fn create_team_event(
    state: &AppState,
    requester: UserId,
    new_event: NewEvent,
) -> Result<CreatedEvent, AppError> {
    new_event.normalized().validate()?;
    authorize_write(state, requester, new_event.team_id).await?;

    let created = event_store::create_event(state, new_event).await?;
    state.metrics.record_event_created(created.attendance_rows);
    state.notifier.publish(EventChange::new(
        EventChangeKind::EventCreated,
        created.event.clone(),
        requester,
    ));
    Ok(created)
}

pub async fn update_team_event(
    state: &AppState,
    requester: UserId,
    team_id: TeamId,
    event_id: EventId,
    patch: EventPatch,
) -> Result<Event, AppError> {
    authorize_write(state, requester, team_id).await?;

    let updated = event_store::update_event(state, team_id, event_id, &patch).await?;
    state.metrics.record_event_updated();
    state.notifier.publish(EventChange::new(
        EventChangeKind::EventUpdated,
        updated.clone(),
        requester,
    ));
    Ok(updated)
}

/// Records the requester's own response. Only members with an attendance row may respond.
pub async fn respond_to_event(
    state: &AppState,
    requester: UserId,
    event_id: EventId,
    status: AttendanceStatus,
) -> Result<Event, AppError> {
    let event = state
        .event_repo
        .find_event(event_id)
        .await
        .map_err(|err| storage_error(state, "find_event", err))?
        .ok_or_else(|| AppError::NotFound(format!("event {}", event_id)))?;

    authorize_read(state, requester, event.team_id).await?;
    event_store::set_attendance_status(state, event_id, requester, status).await?;

    state.metrics.record_attendance_response();
    info!(event_id = %event_id, user_id = %requester, status = %status, "attendance updated");
    state.notifier.publish(
        EventChange::new(EventChangeKind::AttendanceUpdated, event.clone(), requester)
            .with_status(status),
    );
    Ok(event)
}
