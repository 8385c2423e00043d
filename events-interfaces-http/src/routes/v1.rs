use axum::routing::{get, post, put};
use axum::Router;

use events_application::AppState;

use crate::handlers::{event_handlers, ops_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/events", post(event_handlers::create_event))
        .route("/v1/events/:event_id", get(event_handlers::get_event))
        .route(
            "/v1/events/:event_id/attendance",
            put(event_handlers::respond_to_event),
        )
        .route("/v1/teams/:team_id/events", get(event_handlers::list_events))
        .route(
            "/v1/teams/:team_id/events/:event_id",
            put(event_handlers::update_event),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
