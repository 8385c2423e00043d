use std::collections::BTreeSet;

use tracing::{info, warn};

use events_domain::{
    AttendanceRecord, AttendeeView, EventDetails, EventId, ProfileView, UserId,
};

use crate::authorization::authorize_read;
use crate::upstream::{call_upstream, storage_error};
use crate::{AppError, AppState};

/// Builds the attendance view of an event for a team member.
///
/// A missing event is `NotFound` for everyone; an existing event read by a
/// non-member is `Forbidden`. Attendees without a profile are dropped with a
/// warning, while a failed profile RPC fails the whole read.
pub async fn get_event_details(
    state: &AppState,
    event_id: EventId,
    requester: UserId,
) -> Result<EventDetails, AppError> {
    let event = state
        .event_repo
        .find_event(event_id)
        .await
        .map_err(|err| storage_error(state, "find_event", err))?
        .ok_or_else(|| AppError::NotFound(format!("event {}", event_id)))?;

    authorize_read(state, requester, event.team_id).await?;

    let mut records = state
        .event_repo
        .list_attendance(event_id)
        .await
        .map_err(|err| storage_error(state, "list_attendance", err))?;
    records.sort_by(|a, b| a.user_id.cmp(&b.user_id));

    let user_ids = records
        .iter()
        .map(|record| record.user_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let profiles = if user_ids.is_empty() {
        ProfileView::new()
    } else {
        call_upstream(state, "get_profiles", state.profiles.get_profiles(&user_ids)).await?
    };

    let attendance = join_profiles(state, event_id, &records, &profiles);
    info!(
        event_id = %event_id,
        attendees = attendance.len(),
        records = records.len(),
        "event details assembled"
    );
    Ok(EventDetails { event, attendance })
}

fn join_profiles(
    state: &AppState,
    event_id: EventId,
    records: &[AttendanceRecord],
    profiles: &ProfileView,
) -> Vec<AttendeeView> {
    let mut misses = 0usize;
    let attendance = records
        .iter()
        .filter_map(|record| {
            let Some(profile) = profiles.get(&record.user_id) else {
                warn!(event_id = %event_id, user_id = %record.user_id, "profile missing, attendee dropped");
                misses += 1;
                return None;
            };
            Some(AttendeeView {
                user_id: record.user_id,
                first_name: profile.first_name.clone(),
                last_name: profile.last_name.clone(),
                email: profile.email.clone(),
                status: record.status,
            })
        })
        .collect();
    if misses > 0 {
        state.metrics.record_profile_misses(misses);
    }
    attendance
}
