//! Campus event endpoints.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::event::Event;
use crate::services::events::NewEvent;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{event_id}/registration",
            post(register).delete(unregister),
        )
        .route("/events/{event_id}/cancel", post(cancel_event))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub capacity: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Events by start time", body = Vec<Event>),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_events(_user: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.events.list().await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    security(("bearer" = [])),
    request_body = CreateEventRequest,
    responses(
        (status = 200, description = "Event created", body = Event),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 403, description = "Administrator access required", body = ApiErrorBody),
    ),
)]
pub async fn create_event(
    user: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    let input = NewEvent {
        title: body.title,
        description: body.description,
        location: body.location,
        start_time: body.start_time,
        end_time: body.end_time,
        capacity: body.capacity,
    };
    Ok(Json(state.events.create(&user, input).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/registration",
    tag = "Events",
    security(("bearer" = [])),
    params(("event_id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Registered", body = Event),
        (status = 400, description = "Event cancelled", body = ApiErrorBody),
        (status = 404, description = "Event not found", body = ApiErrorBody),
        (status = 409, description = "Already registered or full", body = ApiErrorBody),
    ),
)]
pub async fn register(
    user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.events.register(&user, &event_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/events/{event_id}/registration",
    tag = "Events",
    security(("bearer" = [])),
    params(("event_id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Registration withdrawn", body = Event),
        (status = 404, description = "Event or registration not found", body = ApiErrorBody),
    ),
)]
pub async fn unregister(
    user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.events.unregister(&user, &event_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/events/{event_id}/cancel",
    tag = "Events",
    security(("bearer" = [])),
    params(("event_id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event cancelled", body = Event),
        (status = 403, description = "Administrator access required", body = ApiErrorBody),
        (status = 404, description = "Event not found", body = ApiErrorBody),
    ),
)]
pub async fn cancel_event(
    user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.events.cancel(&user, &event_id).await?))
}
