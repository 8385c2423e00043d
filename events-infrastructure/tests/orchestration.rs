use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use events_application::commands::event_commands::{
    create_team_event, respond_to_event, update_team_event,
};
use events_application::queries::event_queries::{get_team_event, list_team_events};
use events_application::{AppError, AppState, Metrics};
use events_domain::{
    AttendanceStatus, ChangeNotifier, EventChange, EventChangeKind, EventId, EventPatch,
    EventRepository, MembershipOracle, MembershipView, NewEvent, ProfileOracle, ProfileView,
    RuntimeConfig, TeamId, TeamMember, TeamRole, UserId, UserProfile, WRITE_ROLES,
};
use events_infrastructure::InMemoryEventRepository;

#[derive(Default)]
struct FakeTeamService {
    rosters: Mutex<HashMap<TeamId, Vec<TeamMember>>>,
    unavailable: AtomicBool,
    delay: Mutex<Option<Duration>>,
    summary_calls: AtomicUsize,
    membership_calls: AtomicUsize,
}

impl FakeTeamService {
    fn add_member(&self, team_id: TeamId, user_id: UserId, role: TeamRole) {
        self.rosters
            .lock()
            .unwrap()
            .entry(team_id)
            .or_default()
            .push(TeamMember { user_id, role });
    }

    async fn simulate_network(&self) -> anyhow::Result<()> {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow!("team service connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipOracle for FakeTeamService {
    async fn check_membership(
        &self,
        team_id: TeamId,
        user_ids: &[UserId],
    ) -> anyhow::Result<MembershipView> {
        self.simulate_network().await?;
        self.membership_calls.fetch_add(1, Ordering::SeqCst);
        let rosters = self.rosters.lock().unwrap();
        Ok(rosters
            .get(&team_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|member| user_ids.contains(&member.user_id))
                    .map(|member| (member.user_id, member.role))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn team_summary(&self, team_id: TeamId) -> anyhow::Result<Vec<TeamMember>> {
        self.simulate_network().await?;
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rosters
            .lock()
            .unwrap()
            .get(&team_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct FakeUserService {
    profiles: Mutex<ProfileView>,
    batches: Mutex<Vec<Vec<UserId>>>,
    unavailable: AtomicBool,
}

impl FakeUserService {
    fn add_profile(&self, user_id: UserId, first_name: &str) {
        self.profiles.lock().unwrap().insert(
            user_id,
            UserProfile {
                first_name: first_name.to_string(),
                last_name: "Tester".to_string(),
                email: format!("{}@example.com", first_name.to_lowercase()),
            },
        );
    }
}

#[async_trait]
impl ProfileOracle for FakeUserService {
    async fn get_profiles(&self, user_ids: &[UserId]) -> anyhow::Result<ProfileView> {
        self.batches.lock().unwrap().push(user_ids.to_vec());
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(anyhow!("user service connection refused"));
        }
        let profiles = self.profiles.lock().unwrap();
        Ok(user_ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|profile| (*id, profile.clone())))
            .collect())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    changes: Mutex<Vec<EventChange>>,
}

impl RecordingNotifier {
    fn kinds(&self) -> Vec<EventChangeKind> {
        self.changes
            .lock()
            .unwrap()
            .iter()
            .map(|change| change.kind)
            .collect()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn publish(&self, change: EventChange) {
        self.changes.lock().unwrap().push(change);
    }
}

struct Harness {
    state: AppState,
    repo: InMemoryEventRepository,
    teams: Arc<FakeTeamService>,
    users: Arc<FakeUserService>,
    notifier: Arc<RecordingNotifier>,
}

impl Harness {
    fn new() -> Self {
        Self::with_timeout_ms(500)
    }

    fn with_timeout_ms(rpc_timeout_ms: u64) -> Self {
        let repo = InMemoryEventRepository::new();
        let teams = Arc::new(FakeTeamService::default());
        let users = Arc::new(FakeUserService::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState {
            config: RuntimeConfig {
                bind_addr: "127.0.0.1:0".to_string(),
                api_token: None,
                rpc_timeout_ms,
                event_write_roles: WRITE_ROLES.to_vec(),
                max_body_bytes: 1024 * 1024,
                request_timeout_seconds: 5,
            },
            event_repo: Arc::new(repo.clone()),
            membership: teams.clone(),
            profiles: users.clone(),
            notifier: notifier.clone(),
            metrics: Arc::new(Metrics::default()),
        };
        Self {
            state,
            repo,
            teams,
            users,
            notifier,
        }
    }

    /// Team T1 from the reference scenario: one coach and two players, all with profiles.
    fn team_t1(&self) -> (TeamId, UserId, UserId, UserId) {
        let team = TeamId::new();
        let (c1, p1, p2) = (UserId::new(), UserId::new(), UserId::new());
        self.teams.add_member(team, c1, TeamRole::Coach);
        self.teams.add_member(team, p1, TeamRole::Player);
        self.teams.add_member(team, p2, TeamRole::Player);
        self.users.add_profile(c1, "Casey");
        self.users.add_profile(p1, "Pat");
        self.users.add_profile(p2, "Parker");
        (team, c1, p1, p2)
    }
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

fn practice(team_id: TeamId) -> NewEvent {
    NewEvent {
        team_id,
        title: "Practice".to_string(),
        event_type: "practice".to_string(),
        location: "Field A".to_string(),
        start_time: at(10),
        end_time: at(12),
    }
}

#[tokio::test]
async fn coach_creates_event_with_full_pending_cohort() {
    let h = Harness::new();
    let (team, c1, p1, p2) = h.team_t1();

    let created = create_team_event(&h.state, c1, practice(team))
        .await
        .expect("create");
    assert_eq!(created.attendance_rows, 3);
    assert!(!created.event.id.is_nil());

    let records = h.repo.list_attendance(created.event.id).await.expect("list");
    assert_eq!(records.len(), 3);
    let mut users: Vec<UserId> = records.iter().map(|record| record.user_id).collect();
    users.sort();
    let mut expected = vec![c1, p1, p2];
    expected.sort();
    assert_eq!(users, expected);
    assert!(records.iter().all(|record| record.status == AttendanceStatus::Pending
        && record.event_id == created.event.id
        && record.team_id == team));
    assert_eq!(h.repo.attendance_batches(), 1);
    assert_eq!(h.notifier.kinds(), vec![EventChangeKind::EventCreated]);

    let err = create_team_event(&h.state, p1, practice(team))
        .await
        .expect_err("player cannot create");
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(h.repo.team_event_count(team).expect("count"), 1);
    assert_eq!(h.notifier.kinds().len(), 1);
}

#[tokio::test]
async fn failed_bulk_insert_leaves_no_event_and_no_attendance() {
    let h = Harness::new();
    let (team, c1, _, _) = h.team_t1();
    h.repo.fail_attendance_inserts(true);

    let err = create_team_event(&h.state, c1, practice(team))
        .await
        .expect_err("insert fails");
    assert!(matches!(err, AppError::Storage(_)));
    assert_eq!(h.repo.event_count().expect("events"), 0);
    assert_eq!(h.repo.attendance_count().expect("attendance"), 0);
    assert!(h.notifier.kinds().is_empty());

    h.repo.fail_attendance_inserts(false);
    create_team_event(&h.state, c1, practice(team))
        .await
        .expect("store recovers");
    assert_eq!(h.repo.event_count().expect("events"), 1);
    assert_eq!(h.repo.attendance_count().expect("attendance"), 3);
}

#[tokio::test]
async fn empty_roster_creates_event_without_attendance() {
    let h = Harness::new();
    let team = TeamId::new();
    let coach = UserId::new();
    let mut state = h.state.clone();
    state.membership = Arc::new(EmptyRosterTeam { coach, team });

    let created = create_team_event(&state, coach, practice(team))
        .await
        .expect("create with empty roster");
    assert_eq!(created.attendance_rows, 0);
    assert_eq!(h.repo.attendance_batches(), 0);
    assert!(h
        .repo
        .list_attendance(created.event.id)
        .await
        .expect("list")
        .is_empty());
    assert!(h.repo.find_event(created.event.id).await.expect("find").is_some());
}

/// Team whose coach is a member but whose roster summary is empty.
struct EmptyRosterTeam {
    coach: UserId,
    team: TeamId,
}

#[async_trait]
impl MembershipOracle for EmptyRosterTeam {
    async fn check_membership(
        &self,
        team_id: TeamId,
        user_ids: &[UserId],
    ) -> anyhow::Result<MembershipView> {
        let mut view = MembershipView::new();
        if team_id == self.team && user_ids.contains(&self.coach) {
            view.insert(self.coach, TeamRole::Coach);
        }
        Ok(view)
    }

    async fn team_summary(&self, _team_id: TeamId) -> anyhow::Result<Vec<TeamMember>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn non_member_cannot_create_and_nothing_is_written() {
    let h = Harness::new();
    let (team, _, _, _) = h.team_t1();
    let outsider = UserId::new();

    let err = create_team_event(&h.state, outsider, practice(team))
        .await
        .expect_err("outsider");
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(h.repo.event_count().expect("events"), 0);
    assert_eq!(h.teams.summary_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn membership_outage_is_not_a_denial() {
    let h = Harness::new();
    let (team, c1, _, _) = h.team_t1();
    h.teams.unavailable.store(true, Ordering::SeqCst);

    let err = create_team_event(&h.state, c1, practice(team))
        .await
        .expect_err("outage");
    assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    assert_eq!(h.repo.event_count().expect("events"), 0);
}

#[tokio::test]
async fn slow_membership_call_times_out() {
    let h = Harness::with_timeout_ms(20);
    let (team, c1, _, _) = h.team_t1();
    *h.teams.delay.lock().unwrap() = Some(Duration::from_millis(500));

    let err = create_team_event(&h.state, c1, practice(team))
        .await
        .expect_err("timeout");
    assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    assert!(h
        .state
        .metrics
        .render_prometheus()
        .contains("team_events_upstream_errors_total 1\n"));
}

#[tokio::test]
async fn invalid_event_is_rejected_before_writing() {
    let h = Harness::new();
    let (team, c1, _, _) = h.team_t1();
    let mut inverted = practice(team);
    inverted.end_time = at(9);

    let err = create_team_event(&h.state, c1, inverted)
        .await
        .expect_err("inverted range");
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(h.repo.event_count().expect("events"), 0);
    assert_eq!(h.teams.membership_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.teams.summary_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_member_read_is_forbidden_and_missing_event_is_not_found() {
    let h = Harness::new();
    let (team, c1, _, _) = h.team_t1();
    let created = create_team_event(&h.state, c1, practice(team))
        .await
        .expect("create");
    let outsider = UserId::new();

    let err = get_team_event(&h.state, outsider, created.event.id)
        .await
        .expect_err("outsider");
    assert!(matches!(err, AppError::Forbidden));

    let err = get_team_event(&h.state, c1, EventId::new())
        .await
        .expect_err("missing");
    assert!(matches!(err, AppError::NotFound(_)));
    let err = get_team_event(&h.state, outsider, EventId::new())
        .await
        .expect_err("missing for outsider");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn update_of_missing_or_foreign_event_is_not_found() {
    let h = Harness::new();
    let (team, c1, _, _) = h.team_t1();
    let patch = EventPatch {
        title: Some("Scrimmage".to_string()),
        ..EventPatch::default()
    };

    let err = update_team_event(&h.state, c1, team, EventId::new(), patch.clone())
        .await
        .expect_err("missing");
    assert!(matches!(err, AppError::NotFound(_)));

    let other_team = TeamId::new();
    let other_coach = UserId::new();
    h.teams.add_member(other_team, other_coach, TeamRole::Coach);
    let foreign = create_team_event(&h.state, other_coach, practice(other_team))
        .await
        .expect("create foreign");
    let err = update_team_event(&h.state, c1, team, foreign.event.id, patch)
        .await
        .expect_err("foreign");
    assert!(matches!(err, AppError::NotFound(_)));
    let stored = h
        .repo
        .find_event(foreign.event.id)
        .await
        .expect("find")
        .expect("exists");
    assert_eq!(stored.title, "Practice");
}

#[tokio::test]
async fn update_changes_fields_and_publishes() {
    let h = Harness::new();
    let (team, c1, p1, _) = h.team_t1();
    let created = create_team_event(&h.state, c1, practice(team))
        .await
        .expect("create");

    let bad = EventPatch {
        start_time: Some(at(13)),
        ..EventPatch::default()
    };
    let err = update_team_event(&h.state, c1, team, created.event.id, bad)
        .await
        .expect_err("merged range inverted");
    assert!(matches!(err, AppError::Validation(_)));

    let patch = EventPatch {
        location: Some("Field B".to_string()),
        start_time: Some(at(14)),
        end_time: Some(at(16)),
        ..EventPatch::default()
    };
    let err = update_team_event(&h.state, p1, team, created.event.id, patch.clone())
        .await
        .expect_err("player cannot update");
    assert!(matches!(err, AppError::Forbidden));

    let updated = update_team_event(&h.state, c1, team, created.event.id, patch)
        .await
        .expect("update");
    assert_eq!(updated.location, "Field B");
    assert_eq!(updated.title, "Practice");
    assert_eq!(updated.start_time, at(14));
    assert_eq!(
        h.repo.find_event(created.event.id).await.expect("find"),
        Some(updated)
    );
    assert_eq!(
        h.notifier.kinds(),
        vec![EventChangeKind::EventCreated, EventChangeKind::EventUpdated]
    );
}

#[tokio::test]
async fn missing_profile_drops_only_that_attendee() {
    let h = Harness::new();
    let (team, c1, p1, p2) = h.team_t1();
    h.users.profiles.lock().unwrap().remove(&p2);
    let created = create_team_event(&h.state, c1, practice(team))
        .await
        .expect("create");

    let details = get_team_event(&h.state, p1, created.event.id)
        .await
        .expect("details");
    assert_eq!(details.attendance.len(), 2);
    assert!(details.attendance.iter().all(|entry| entry.user_id != p2));

    let batches = h.users.batches.lock().unwrap().clone();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 3);
    assert!(h
        .state
        .metrics
        .render_prometheus()
        .contains("team_events_profile_misses_total 1\n"));
}

#[tokio::test]
async fn profile_outage_fails_the_read() {
    let h = Harness::new();
    let (team, c1, _, _) = h.team_t1();
    let created = create_team_event(&h.state, c1, practice(team))
        .await
        .expect("create");
    h.users.unavailable.store(true, Ordering::SeqCst);

    let err = get_team_event(&h.state, c1, created.event.id)
        .await
        .expect_err("outage");
    assert!(matches!(err, AppError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn reads_are_idempotent_and_round_trip_inputs() {
    let h = Harness::new();
    let (team, c1, _, _) = h.team_t1();
    let input = NewEvent {
        title: "  Morning Practice ".to_string(),
        location: "Field A, north end".to_string(),
        ..practice(team)
    };
    let created = create_team_event(&h.state, c1, input.clone())
        .await
        .expect("create");

    let first = get_team_event(&h.state, c1, created.event.id)
        .await
        .expect("first read");
    let second = get_team_event(&h.state, c1, created.event.id)
        .await
        .expect("second read");
    assert_eq!(first, second);
    assert_eq!(first.event.title, input.title);
    assert_eq!(first.event.location, input.location);
    assert_eq!(first.event.start_time, input.start_time);
    assert_eq!(first.event.end_time, input.end_time);

    let ids: Vec<UserId> = first.attendance.iter().map(|entry| entry.user_id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn member_responds_to_event() {
    let h = Harness::new();
    let (team, c1, p1, _) = h.team_t1();
    let created = create_team_event(&h.state, c1, practice(team))
        .await
        .expect("create");

    respond_to_event(&h.state, p1, created.event.id, AttendanceStatus::Accepted)
        .await
        .expect("respond");
    let details = get_team_event(&h.state, p1, created.event.id)
        .await
        .expect("details");
    let entry = details
        .attendance
        .iter()
        .find(|entry| entry.user_id == p1)
        .expect("p1 listed");
    assert_eq!(entry.status, AttendanceStatus::Accepted);
    let last = h.notifier.changes.lock().unwrap().last().cloned().expect("change");
    assert_eq!(last.kind, EventChangeKind::AttendanceUpdated);
    assert_eq!(last.attendance_status, Some(AttendanceStatus::Accepted));
    assert_eq!(last.actor_id, p1);

    let outsider = UserId::new();
    let err = respond_to_event(&h.state, outsider, created.event.id, AttendanceStatus::Declined)
        .await
        .expect_err("outsider");
    assert!(matches!(err, AppError::Forbidden));

    let late_joiner = UserId::new();
    h.teams.add_member(team, late_joiner, TeamRole::Player);
    let err = respond_to_event(&h.state, late_joiner, created.event.id, AttendanceStatus::Declined)
        .await
        .expect_err("no attendance row");
    assert!(matches!(err, AppError::NotFound(_)));

    let err = respond_to_event(&h.state, p1, EventId::new(), AttendanceStatus::Declined)
        .await
        .expect_err("missing event");
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn team_events_are_listed_in_start_order() {
    let h = Harness::new();
    let (team, c1, p1, _) = h.team_t1();
    let late = NewEvent {
        start_time: at(18),
        end_time: at(20),
        ..practice(team)
    };
    create_team_event(&h.state, c1, late).await.expect("late");
    create_team_event(&h.state, c1, practice(team)).await.expect("early");

    let events = list_team_events(&h.state, p1, team).await.expect("list");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].start_time, at(10));
    assert_eq!(events[1].start_time, at(18));

    let err = list_team_events(&h.state, UserId::new(), team)
        .await
        .expect_err("outsider");
    assert!(matches!(err, AppError::Forbidden));
}
