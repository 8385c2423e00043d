//! In-memory event store.
//!
//! Backs `storage_backend = "memory"` and the orchestration tests. Transactions
//! are serialized by a single writer gate and stage their writes locally, so an
//! uncommitted transaction is invisible to readers and vanishes when dropped.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use events_domain::{
    AttendanceRecord, AttendanceStatus, Event, EventId, EventRepository, EventTransaction,
    NewEvent, TeamId, UserId,
};

type AttendanceKey = (EventId, UserId);

#[derive(Debug, Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    attendance: BTreeMap<AttendanceKey, AttendanceRecord>,
}

fn poison_err<T>(_: PoisonError<T>) -> anyhow::Error {
    anyhow!("event store lock poisoned")
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryEventRepository {
    tables: Arc<RwLock<Tables>>,
    writer: Arc<Mutex<()>>,
    fail_attendance_inserts: Arc<AtomicBool>,
    attendance_batches: Arc<AtomicUsize>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent bulk attendance insert fail until reset.
    pub fn fail_attendance_inserts(&self, fail: bool) {
        self.fail_attendance_inserts.store(fail, Ordering::SeqCst);
    }

    /// Number of bulk attendance insert calls seen, failed ones included.
    pub fn attendance_batches(&self) -> usize {
        self.attendance_batches.load(Ordering::SeqCst)
    }

    pub fn event_count(&self) -> Result<usize> {
        Ok(self.tables.read().map_err(poison_err)?.events.len())
    }

    pub fn team_event_count(&self, team_id: TeamId) -> Result<usize> {
        let tables = self.tables.read().map_err(poison_err)?;
        Ok(tables
            .events
            .values()
            .filter(|event| event.team_id == team_id)
            .count())
    }

    pub fn attendance_count(&self) -> Result<usize> {
        Ok(self.tables.read().map_err(poison_err)?.attendance.len())
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn begin(&self) -> Result<Box<dyn EventTransaction>> {
        let gate = self.writer.clone().lock_owned().await;
        Ok(Box::new(InMemoryEventTransaction {
            tables: self.tables.clone(),
            fail_attendance_inserts: self.fail_attendance_inserts.clone(),
            attendance_batches: self.attendance_batches.clone(),
            staged: Tables::default(),
            _gate: gate,
        }))
    }

    async fn find_event(&self, event_id: EventId) -> Result<Option<Event>> {
        let tables = self.tables.read().map_err(poison_err)?;
        Ok(tables.events.get(&event_id).cloned())
    }

    async fn list_team_events(&self, team_id: TeamId) -> Result<Vec<Event>> {
        let tables = self.tables.read().map_err(poison_err)?;
        let mut events: Vec<Event> = tables
            .events
            .values()
            .filter(|event| event.team_id == team_id)
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    async fn list_attendance(&self, event_id: EventId) -> Result<Vec<AttendanceRecord>> {
        let tables = self.tables.read().map_err(poison_err)?;
        Ok(tables
            .attendance
            .values()
            .filter(|record| record.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        drop(self.tables.read().map_err(poison_err)?);
        Ok(())
    }
}

pub struct InMemoryEventTransaction {
    tables: Arc<RwLock<Tables>>,
    fail_attendance_inserts: Arc<AtomicBool>,
    attendance_batches: Arc<AtomicUsize>,
    staged: Tables,
    _gate: OwnedMutexGuard<()>,
}

impl InMemoryEventTransaction {
    fn visible_event(&self, event_id: EventId) -> Result<Option<Event>> {
        if let Some(event) = self.staged.events.get(&event_id) {
            return Ok(Some(event.clone()));
        }
        let tables = self.tables.read().map_err(poison_err)?;
        Ok(tables.events.get(&event_id).cloned())
    }

    fn visible_attendance(&self, key: &AttendanceKey) -> Result<Option<AttendanceRecord>> {
        if let Some(record) = self.staged.attendance.get(key) {
            return Ok(Some(record.clone()));
        }
        let tables = self.tables.read().map_err(poison_err)?;
        Ok(tables.attendance.get(key).cloned())
    }
}

#[async_trait]
impl EventTransaction for InMemoryEventTransaction {
    async fn insert_event(&mut self, new_event: &NewEvent) -> Result<Event> {
        let event = Event {
            id: EventId::new(),
            team_id: new_event.team_id,
            title: new_event.title.clone(),
            event_type: new_event.event_type.clone(),
            location: new_event.location.clone(),
            start_time: new_event.start_time,
            end_time: new_event.end_time,
        };
        self.staged.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn insert_attendance(&mut self, records: &[AttendanceRecord]) -> Result<u64> {
        self.attendance_batches.fetch_add(1, Ordering::SeqCst);
        if self.fail_attendance_inserts.load(Ordering::SeqCst) {
            bail!("injected attendance insert failure");
        }
        let mut batch = BTreeMap::new();
        for record in records {
            if self.visible_event(record.event_id)?.is_none() {
                bail!("attendance references unknown event {}", record.event_id);
            }
            let key = (record.event_id, record.user_id);
            if batch.contains_key(&key) || self.visible_attendance(&key)?.is_some() {
                bail!(
                    "duplicate attendance for event {} user {}",
                    record.event_id,
                    record.user_id
                );
            }
            batch.insert(key, record.clone());
        }
        let written = batch.len() as u64;
        self.staged.attendance.extend(batch);
        Ok(written)
    }

    async fn lock_event(&mut self, event_id: EventId) -> Result<Option<Event>> {
        self.visible_event(event_id)
    }

    async fn update_event(&mut self, event: &Event) -> Result<bool> {
        match self.visible_event(event.id)? {
            Some(current) if current.team_id == event.team_id => {
                self.staged.events.insert(event.id, event.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_attendance_status(
        &mut self,
        event_id: EventId,
        user_id: UserId,
        status: AttendanceStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let key = (event_id, user_id);
        let Some(mut record) = self.visible_attendance(&key)? else {
            return Ok(false);
        };
        record.status = status;
        record.updated_at = updated_at;
        self.staged.attendance.insert(key, record);
        Ok(true)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        let mut tables = this.tables.write().map_err(poison_err)?;
        tables.events.extend(this.staged.events);
        tables.attendance.extend(this.staged.attendance);
        Ok(())
    }
}
