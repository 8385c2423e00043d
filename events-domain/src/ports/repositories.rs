use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{AttendanceRecord, Event, NewEvent};
use crate::value_objects::{AttendanceStatus, EventId, TeamId, UserId};

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Opens a transaction owned by a single request.
    async fn begin(&self) -> anyhow::Result<Box<dyn EventTransaction>>;
    async fn find_event(&self, event_id: EventId) -> anyhow::Result<Option<Event>>;
    async fn list_team_events(&self, team_id: TeamId) -> anyhow::Result<Vec<Event>>;
    async fn list_attendance(&self, event_id: EventId) -> anyhow::Result<Vec<AttendanceRecord>>;
    async fn ping(&self) -> anyhow::Result<()>;
}

/// Writes staged through a transaction become visible only on `commit`.
/// Dropping the transaction without committing rolls every write back.
#[async_trait]
pub trait EventTransaction: Send {
    /// Inserts the event row and returns it with its generated id.
    async fn insert_event(&mut self, event: &NewEvent) -> anyhow::Result<Event>;
    /// Inserts all records as one batch and returns the number of rows written.
    async fn insert_attendance(&mut self, records: &[AttendanceRecord]) -> anyhow::Result<u64>;
    /// Loads the event and holds it against concurrent writers until the transaction ends.
    async fn lock_event(&mut self, event_id: EventId) -> anyhow::Result<Option<Event>>;
    /// Returns false when no row matched.
    async fn update_event(&mut self, event: &Event) -> anyhow::Result<bool>;
    /// Returns false when the user has no attendance row for the event.
    async fn update_attendance_status(
        &mut self,
        event_id: EventId,
        user_id: UserId,
        status: AttendanceStatus,
        updated_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
}
