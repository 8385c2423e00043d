// Event entities
// An event belongs to exactly one team and owns one attendance row per roster member.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value_objects::{AttendanceStatus, EventId, TeamId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub team_id: TeamId,
    pub title: String,
    pub event_type: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventValidationError {
    #[error("team_id is required")]
    MissingTeam,
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("event_type must not be empty")]
    EmptyEventType,
    #[error("start_time must be before end_time")]
    InvalidTimeRange,
    #[error("update must change at least one field")]
    EmptyPatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub team_id: TeamId,
    pub title: String,
    pub event_type: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// TIMESTAMPTZ keeps microseconds.
pub fn stored_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(6)
}

impl NewEvent {
    /// Canonicalizes the event type and truncates times to the stored microsecond
    /// precision. Title and location are stored exactly as given.
    pub fn normalized(&self) -> Self {
        Self {
            event_type: self.event_type.trim().to_lowercase(),
            start_time: stored_precision(self.start_time),
            end_time: stored_precision(self.end_time),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), EventValidationError> {
        if self.team_id.is_nil() {
            return Err(EventValidationError::MissingTeam);
        }
        if self.title.trim().is_empty() {
            return Err(EventValidationError::EmptyTitle);
        }
        if self.event_type.trim().is_empty() {
            return Err(EventValidationError::EmptyEventType);
        }
        if self.start_time >= self.end_time {
            return Err(EventValidationError::InvalidTimeRange);
        }
        Ok(())
    }
}

/// Mutable event fields. Team and event type are fixed at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.location.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }

    /// Returns the event as it would look after the patch, validating the merged result.
    pub fn apply_to(&self, event: &Event) -> Result<Event, EventValidationError> {
        if self.is_empty() {
            return Err(EventValidationError::EmptyPatch);
        }
        let mut updated = event.clone();
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(EventValidationError::EmptyTitle);
            }
            updated.title = title.clone();
        }
        if let Some(location) = &self.location {
            updated.location = location.clone();
        }
        if let Some(start_time) = self.start_time {
            updated.start_time = stored_precision(start_time);
        }
        if let Some(end_time) = self.end_time {
            updated.end_time = stored_precision(end_time);
        }
        if updated.start_time >= updated.end_time {
            return Err(EventValidationError::InvalidTimeRange);
        }
        Ok(updated)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub event_id: EventId,
    pub team_id: TeamId,
    pub user_id: UserId,
    pub status: AttendanceStatus,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn pending(event: &Event, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            event_id: event.id,
            team_id: event.team_id,
            user_id,
            status: AttendanceStatus::Pending,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeView {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub status: AttendanceStatus,
}

/// Read-side aggregate, rebuilt on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    #[serde(flatten)]
    pub event: Event,
    pub attendance: Vec<AttendeeView>,
}
