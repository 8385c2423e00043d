use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use events_domain::{AttendanceStatus, Event, EventId, EventPatch, NewEvent, TeamId, UserId};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub team_id: TeamId,
    pub title: String,
    pub event_type: String,
    #[serde(default)]
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<CreateEventRequest> for NewEvent {
    fn from(value: CreateEventRequest) -> Self {
        NewEvent {
            team_id: value.team_id,
            title: value.title,
            event_type: value.event_type,
            location: value.location,
            start_time: value.start_time,
            end_time: value.end_time,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl From<UpdateEventRequest> for EventPatch {
    fn from(value: UpdateEventRequest) -> Self {
        EventPatch {
            title: value.title,
            location: value.location,
            start_time: value.start_time,
            end_time: value.end_time,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RespondRequest {
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateEventResponse {
    #[serde(flatten)]
    pub event: Event,
    pub attendance_rows: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventListResponse {
    pub team_id: TeamId,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RespondResponse {
    pub event_id: EventId,
    pub user_id: UserId,
    pub status: AttendanceStatus,
}
