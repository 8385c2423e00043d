use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use events_domain::{
    AttendanceRecord, AttendanceStatus, Event, EventId, EventPatch, NewEvent, TeamId, TeamMember,
    UserId,
};

use crate::upstream::{call_upstream, storage_error};
use crate::{AppError, AppState};

#[derive(Debug, Clone)]
pub struct CreatedEvent {
    pub event: Event,
    pub attendance_rows: u64,
}

/// Persists the event and its full attendance cohort in one transaction.
///
/// The roster is read before the transaction opens and is not part of it.
/// Any failure after `begin` drops the transaction, so neither the event nor
/// any attendance row survives.
pub async fn create_event(state: &AppState, new_event: NewEvent) -> Result<CreatedEvent, AppError> {
    let new_event = new_event.normalized();
    new_event.validate()?;

    let roster = call_upstream(
        state,
        "team_summary",
        state.membership.team_summary(new_event.team_id),
    )
    .await?;

    let mut tx = state
        .event_repo
        .begin()
        .await
        .map_err(|err| storage_error(state, "begin", err))?;

    let event = tx
        .insert_event(&new_event)
        .await
        .map_err(|err| storage_error(state, "insert_event", err))?;

    let records = attendance_cohort(&event, &roster, Utc::now());
    let attendance_rows = if records.is_empty() {
        info!(event_id = %event.id, team_id = %event.team_id, "team roster is empty, no attendance rows");
        0
    } else {
        let written = tx
            .insert_attendance(&records)
            .await
            .map_err(|err| storage_error(state, "insert_attendance", err))?;
        if written != records.len() as u64 {
            return Err(storage_error(
                state,
                "insert_attendance",
                anyhow::anyhow!(
                    "attendance insert wrote {} of {} rows",
                    written,
                    records.len()
                ),
            ));
        }
        written
    };

    tx.commit()
        .await
        .map_err(|err| storage_error(state, "commit", err))?;

    info!(
        event_id = %event.id,
        team_id = %event.team_id,
        attendance_rows,
        "event created"
    );
    Ok(CreatedEvent {
        event,
        attendance_rows,
    })
}

/// Applies `patch` to an event of `team_id`. An event of another team is reported as missing.
pub async fn update_event(
    state: &AppState,
    team_id: TeamId,
    event_id: EventId,
    patch: &EventPatch,
) -> Result<Event, AppError> {
    if patch.is_empty() {
        return Err(AppError::Validation(
            "update must change at least one field".to_string(),
        ));
    }

    let mut tx = state
        .event_repo
        .begin()
        .await
        .map_err(|err| storage_error(state, "begin", err))?;

    let current = tx
        .lock_event(event_id)
        .await
        .map_err(|err| storage_error(state, "lock_event", err))?
        .filter(|event| event.team_id == team_id)
        .ok_or_else(|| AppError::NotFound(format!("event {}", event_id)))?;

    let updated = patch.apply_to(&current)?;
    let matched = tx
        .update_event(&updated)
        .await
        .map_err(|err| storage_error(state, "update_event", err))?;
    if !matched {
        return Err(AppError::NotFound(format!("event {}", event_id)));
    }

    tx.commit()
        .await
        .map_err(|err| storage_error(state, "commit", err))?;
    info!(event_id = %event_id, team_id = %team_id, "event updated");
    Ok(updated)
}

pub async fn set_attendance_status(
    state: &AppState,
    event_id: EventId,
    user_id: UserId,
    status: AttendanceStatus,
) -> Result<(), AppError> {
    let mut tx = state
        .event_repo
        .begin()
        .await
        .map_err(|err| storage_error(state, "begin", err))?;

    let matched = tx
        .update_attendance_status(event_id, user_id, status, Utc::now())
        .await
        .map_err(|err| storage_error(state, "update_attendance_status", err))?;
    if !matched {
        warn!(event_id = %event_id, user_id = %user_id, "no attendance row for user");
        return Err(AppError::NotFound(format!(
            "attendance of user {} for event {}",
            user_id, event_id
        )));
    }

    tx.commit()
        .await
        .map_err(|err| storage_error(state, "commit", err))?;
    Ok(())
}

/// One pending record per distinct roster member, in roster order.
fn attendance_cohort(event: &Event, roster: &[TeamMember], now: DateTime<Utc>) -> Vec<AttendanceRecord> {
    let mut seen = HashSet::with_capacity(roster.len());
    roster
        .iter()
        .filter(|member| seen.insert(member.user_id))
        .map(|member| AttendanceRecord::pending(event, member.user_id, now))
        .collect()
}
