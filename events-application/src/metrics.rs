use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    events_created: AtomicU64,
    events_updated: AtomicU64,
    attendance_rows: AtomicU64,
    attendance_responses: AtomicU64,
    profile_misses: AtomicU64,
    upstream_errors: AtomicU64,
    storage_errors: AtomicU64,
}

impl Metrics {
    pub fn record_event_created(&self, attendance_rows: u64) {
        self.events_created.fetch_add(1, Ordering::Relaxed);
        self.attendance_rows
            .fetch_add(attendance_rows, Ordering::Relaxed);
    }

    pub fn record_event_updated(&self) {
        self.events_updated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attendance_response(&self) {
        self.attendance_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_profile_misses(&self, count: usize) {
        self.profile_misses
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_upstream_error(&self) {
        self.upstream_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_storage_error(&self) {
        self.storage_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let created = self.events_created.load(Ordering::Relaxed);
        let updated = self.events_updated.load(Ordering::Relaxed);
        let rows = self.attendance_rows.load(Ordering::Relaxed);
        let responses = self.attendance_responses.load(Ordering::Relaxed);
        let misses = self.profile_misses.load(Ordering::Relaxed);
        let upstream = self.upstream_errors.load(Ordering::Relaxed);
        let storage = self.storage_errors.load(Ordering::Relaxed);

        format!(
            "# TYPE team_events_created_total counter\n\
team_events_created_total {}\n\
# TYPE team_events_updated_total counter\n\
team_events_updated_total {}\n\
# TYPE team_events_attendance_rows_total counter\n\
team_events_attendance_rows_total {}\n\
# TYPE team_events_attendance_responses_total counter\n\
team_events_attendance_responses_total {}\n\
# TYPE team_events_profile_misses_total counter\n\
team_events_profile_misses_total {}\n\
# TYPE team_events_upstream_errors_total counter\n\
team_events_upstream_errors_total {}\n\
# TYPE team_events_storage_errors_total counter\n\
team_events_storage_errors_total {}\n",
            created, updated, rows, responses, misses, upstream, storage
        )
    }
}
