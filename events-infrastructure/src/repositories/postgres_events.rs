use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Transaction};
use tracing::info;
use uuid::Uuid;

use events_domain::{
    AttendanceRecord, AttendanceStatus, DbConfig, Event, EventId, EventRepository,
    EventTransaction, NewEvent, TeamId, UserId,
};

/// Postgres caps a statement at 65535 bind parameters.
const MAX_BIND_PARAMS: usize = 65_535;
const ATTENDANCE_COLUMNS: usize = 5;
const ATTENDANCE_ROWS_PER_STATEMENT: usize = MAX_BIND_PARAMS / ATTENDANCE_COLUMNS;

const EVENT_COLUMNS: &str = "id, team_id, title, event_type, location, start_time, end_time";

const SCHEMA: [&str; 4] = [
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        team_id UUID NOT NULL,
        title TEXT NOT NULL,
        event_type TEXT NOT NULL,
        location TEXT NOT NULL DEFAULT '',
        start_time TIMESTAMPTZ NOT NULL,
        end_time TIMESTAMPTZ NOT NULL,
        CHECK (start_time < end_time)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS events_team_start_idx ON events (team_id, start_time)",
    r#"
    CREATE TABLE IF NOT EXISTS attendance (
        event_id UUID NOT NULL REFERENCES events (id) ON DELETE CASCADE,
        team_id UUID NOT NULL,
        user_id UUID NOT NULL,
        status TEXT NOT NULL DEFAULT 'PENDING'
            CHECK (status IN ('PENDING', 'ACCEPTED', 'DECLINED', 'TENTATIVE')),
        updated_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (event_id, user_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS attendance_team_idx ON attendance (team_id)",
];

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    team_id: Uuid,
    title: String,
    event_type: String,
    location: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: EventId(row.id),
            team_id: TeamId(row.team_id),
            title: row.title,
            event_type: row.event_type,
            location: row.location,
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AttendanceRow {
    event_id: Uuid,
    team_id: Uuid,
    user_id: Uuid,
    status: String,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = anyhow::Error;

    fn try_from(row: AttendanceRow) -> Result<Self> {
        Ok(AttendanceRecord {
            event_id: EventId(row.event_id),
            team_id: TeamId(row.team_id),
            user_id: UserId(row.user_id),
            status: row.status.parse::<AttendanceStatus>()?,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Builds a lazily connecting pool; the first query opens the first connection.
    pub fn connect_lazy(config: &DbConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect_lazy(&config.database_url)
            .context("invalid database_url")?;
        Ok(Self::new(pool))
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("failed to apply schema")?;
        }
        info!("event schema ready");
        Ok(())
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn begin(&self) -> Result<Box<dyn EventTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgEventTransaction { tx }))
    }

    async fn find_event(&self, event_id: EventId) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Event::from))
    }

    async fn list_team_events(&self, team_id: TeamId) -> Result<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE team_id = $1 ORDER BY start_time, id",
            EVENT_COLUMNS
        ))
        .bind(team_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn list_attendance(&self, event_id: EventId) -> Result<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT event_id, team_id, user_id, status, updated_at
            FROM attendance
            WHERE event_id = $1
            ORDER BY user_id
            "#,
        )
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AttendanceRecord::try_from).collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Dropping this without `commit` rolls the transaction back.
pub struct PgEventTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl EventTransaction for PgEventTransaction {
    async fn insert_event(&mut self, new_event: &NewEvent) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events (team_id, title, event_type, location, start_time, end_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        ))
        .bind(new_event.team_id.as_uuid())
        .bind(&new_event.title)
        .bind(&new_event.event_type)
        .bind(&new_event.location)
        .bind(new_event.start_time)
        .bind(new_event.end_time)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.into())
    }

    async fn insert_attendance(&mut self, records: &[AttendanceRecord]) -> Result<u64> {
        let mut written = 0;
        for chunk in records.chunks(ATTENDANCE_ROWS_PER_STATEMENT) {
            let mut builder = build_attendance_insert(chunk);
            written += builder.build().execute(&mut *self.tx).await?.rows_affected();
        }
        Ok(written)
    }

    async fn lock_event(&mut self, event_id: EventId) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1 FOR UPDATE",
            EVENT_COLUMNS
        ))
        .bind(event_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Event::from))
    }

    async fn update_event(&mut self, event: &Event) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $3, location = $4, start_time = $5, end_time = $6
            WHERE id = $1 AND team_id = $2
            "#,
        )
        .bind(event.id.as_uuid())
        .bind(event.team_id.as_uuid())
        .bind(&event.title)
        .bind(&event.location)
        .bind(event.start_time)
        .bind(event.end_time)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_attendance_status(
        &mut self,
        event_id: EventId,
        user_id: UserId,
        status: AttendanceStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET status = $3, updated_at = $4
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(status.as_str())
        .bind(updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// One multi-row INSERT for the whole slice.
fn build_attendance_insert(records: &[AttendanceRecord]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        "INSERT INTO attendance (event_id, team_id, user_id, status, updated_at) ",
    );
    builder.push_values(records, |mut row, record| {
        row.push_bind(record.event_id.as_uuid())
            .push_bind(record.team_id.as_uuid())
            .push_bind(record.user_id.as_uuid())
            .push_bind(record.status.as_str())
            .push_bind(record.updated_at);
    });
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(event_id: EventId, team_id: TeamId) -> AttendanceRecord {
        AttendanceRecord {
            event_id,
            team_id,
            user_id: UserId::new(),
            status: AttendanceStatus::Pending,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn attendance_insert_is_a_single_multi_row_statement() {
        let event_id = EventId::new();
        let team_id = TeamId::new();
        let records = vec![
            record(event_id, team_id),
            record(event_id, team_id),
            record(event_id, team_id),
        ];
        let builder = build_attendance_insert(&records);
        assert_eq!(
            builder.sql(),
            "INSERT INTO attendance (event_id, team_id, user_id, status, updated_at) \
             VALUES ($1, $2, $3, $4, $5), ($6, $7, $8, $9, $10), ($11, $12, $13, $14, $15)"
        );
    }

    #[test]
    fn chunk_size_stays_under_bind_limit() {
        assert!(ATTENDANCE_ROWS_PER_STATEMENT * ATTENDANCE_COLUMNS <= MAX_BIND_PARAMS);
        assert!(ATTENDANCE_ROWS_PER_STATEMENT >= 1_000);
    }

    #[test]
    fn attendance_row_rejects_unknown_status() {
        let row = AttendanceRow {
            event_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: "MAYBE".to_string(),
            updated_at: Utc::now(),
        };
        assert!(AttendanceRecord::try_from(row).is_err());
    }
}
