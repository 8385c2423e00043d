// Change records published after a committed mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Event;
use crate::value_objects::{AttendanceStatus, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventChangeKind {
    EventCreated,
    EventUpdated,
    AttendanceUpdated,
}

impl EventChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventChangeKind::EventCreated => "event_created",
            EventChangeKind::EventUpdated => "event_updated",
            EventChangeKind::AttendanceUpdated => "attendance_updated",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventChange {
    pub kind: EventChangeKind,
    pub event: Event,
    pub actor_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance_status: Option<AttendanceStatus>,
    pub occurred_at: DateTime<Utc>,
}

impl EventChange {
    pub fn new(kind: EventChangeKind, event: Event, actor_id: UserId) -> Self {
        Self {
            kind,
            event,
            actor_id,
            attendance_status: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_status(mut self, status: AttendanceStatus) -> Self {
        self.attendance_status = Some(status);
        self
    }
}
