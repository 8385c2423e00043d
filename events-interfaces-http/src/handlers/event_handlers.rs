use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use events_application::commands::event_commands;
use events_application::dtos::{
    CreateEventRequest, CreateEventResponse, EventListResponse, RespondRequest, RespondResponse,
    UpdateEventRequest,
};
use events_application::queries::event_queries;
use events_application::AppState;
use events_domain::{Event, EventDetails, EventId, TeamId};

use crate::error::HttpError;
use crate::middleware::authenticate;

pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateEventResponse>), HttpError> {
    let requester = authenticate(&state.config, &headers)?;
    let Json(payload) = payload.map_err(|err| HttpError::BadRequest(err.body_text()))?;
    let created = event_commands::create_team_event(&state, requester, payload.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            event: created.event,
            attendance_rows: created.attendance_rows,
        }),
    ))
}

pub async fn get_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    event_id: Result<Path<EventId>, PathRejection>,
) -> Result<Json<EventDetails>, HttpError> {
    let requester = authenticate(&state.config, &headers)?;
    let Path(event_id) = event_id.map_err(|err| HttpError::BadRequest(err.body_text()))?;
    let details = event_queries::get_team_event(&state, requester, event_id).await?;
    Ok(Json(details))
}

pub async fn update_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    ids: Result<Path<(TeamId, EventId)>, PathRejection>,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> Result<Json<Event>, HttpError> {
    let requester = authenticate(&state.config, &headers)?;
    let Path((team_id, event_id)) = ids.map_err(|err| HttpError::BadRequest(err.body_text()))?;
    let Json(payload) = payload.map_err(|err| HttpError::BadRequest(err.body_text()))?;
    let updated =
        event_commands::update_team_event(&state, requester, team_id, event_id, payload.into())
            .await?;
    Ok(Json(updated))
}

pub async fn list_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    team_id: Result<Path<TeamId>, PathRejection>,
) -> Result<Json<EventListResponse>, HttpError> {
    let requester = authenticate(&state.config, &headers)?;
    let Path(team_id) = team_id.map_err(|err| HttpError::BadRequest(err.body_text()))?;
    let events = event_queries::list_team_events(&state, requester, team_id).await?;
    Ok(Json(EventListResponse { team_id, events }))
}

pub async fn respond_to_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    event_id: Result<Path<EventId>, PathRejection>,
    payload: Result<Json<RespondRequest>, JsonRejection>,
) -> Result<Json<RespondResponse>, HttpError> {
    let requester = authenticate(&state.config, &headers)?;
    let Path(event_id) = event_id.map_err(|err| HttpError::BadRequest(err.body_text()))?;
    let Json(payload) = payload.map_err(|err| HttpError::BadRequest(err.body_text()))?;
    event_commands::respond_to_event(&state, requester, event_id, payload.status).await?;
    Ok(Json(RespondResponse {
        event_id,
        user_id: requester,
        status: payload.status,
    }))
}
