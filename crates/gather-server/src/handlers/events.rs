//! Handlers for `/api/event` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/event/create`       | Any authenticated user; 201 |
//! | `GET`    | `/event/getevent`     | All events by start time |
//! | `GET`    | `/event/{id}`         | 404 if not found |
//! | `PUT`    | `/event/{id}`         | Owner only |
//! | `DELETE` | `/event/{id}`         | Owner only; 204 |
//! | `PUT`    | `/event/{id}/like`    | Add-once |
//! | `DELETE` | `/event/{id}/like`    | Removes the caller's like |
//! | `POST`   | `/event/{id}/comment` | Body: `{"text": "..."}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use gather_core::{
  event::{Event, EventPatch, NewEvent},
  store::GatherStore,
};
use serde::Deserialize;
use uuid::Uuid;

use super::ApiJson;
use crate::{AppState, auth::Authenticated, error::ApiError, photos::PhotoStorage};

/// An unparseable id cannot name an event, so it is reported the same way as
/// an unknown one.
fn event_id(raw: &str) -> Result<Uuid, ApiError> {
  raw.parse().map_err(|_| ApiError::NotFound("event not found".into()))
}

/// RFC 3339 date-time, or a bare `YYYY-MM-DD` taken as midnight UTC.
fn parse_starts_at(raw: &str) -> Result<DateTime<Utc>, ApiError> {
  let raw = raw.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Ok(dt.with_timezone(&Utc));
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|date| date.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
    .ok_or_else(|| {
      ApiError::BadRequest(format!("startsAt {raw:?} is not an RFC 3339 date-time"))
    })
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreateBody {
  pub title:       String,
  pub description: String,
  pub location:    String,
  #[serde(alias = "date")]
  pub starts_at:   Option<String>,
  pub category:    Option<String>,
}

/// `POST /event/create`
pub async fn create<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  Authenticated(caller): Authenticated,
  ApiJson(body): ApiJson<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let starts_at = body
    .starts_at
    .as_deref()
    .ok_or_else(|| ApiError::BadRequest("startsAt is required".into()))
    .and_then(parse_starts_at)?;

  let event = state
    .store
    .create_event(caller.user_id, NewEvent {
      title: body.title,
      description: body.description,
      location: body.location,
      starts_at,
      category: body.category,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(event = %event.event_id, owner = %caller.user_id, "created event");

  Ok((StatusCode::CREATED, Json(event)))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /event/getevent`
pub async fn list<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
) -> Result<Json<Vec<Event>>, ApiError> {
  let events = state.store.list_events().await.map_err(ApiError::store)?;
  Ok(Json(events))
}

/// `GET /event/{id}`
pub async fn get_one<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
  let id = event_id(&id)?;
  state
    .store
    .get_event(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("event not found".into()))
}

// ─── Update / delete ──────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateBody {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub location:    Option<String>,
  #[serde(alias = "date")]
  pub starts_at:   Option<String>,
  pub category:    Option<String>,
}

/// `PUT /event/{id}`
pub async fn update<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<UpdateBody>,
) -> Result<Json<Event>, ApiError> {
  let id = event_id(&id)?;
  let patch = EventPatch {
    title:       body.title,
    description: body.description,
    location:    body.location,
    starts_at:   body.starts_at.as_deref().map(parse_starts_at).transpose()?,
    category:    body.category,
  };
  if patch.is_empty() {
    return Err(ApiError::BadRequest("nothing to update".into()));
  }

  let event = state
    .store
    .update_event(id, caller.user_id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(event))
}

/// `DELETE /event/{id}`
pub async fn delete<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let id = event_id(&id)?;
  state
    .store
    .delete_event(id, caller.user_id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(event = %id, owner = %caller.user_id, "deleted event");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Likes and comments ───────────────────────────────────────────────────────

/// `PUT /event/{id}/like`
pub async fn like<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
  let id = event_id(&id)?;
  let event = state
    .store
    .like_event(id, caller.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(event))
}

/// `DELETE /event/{id}/like`
pub async fn unlike<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<String>,
) -> Result<Json<Event>, ApiError> {
  let id = event_id(&id)?;
  let event = state
    .store
    .unlike_event(id, caller.user_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(event))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CommentBody {
  #[serde(alias = "comment")]
  pub text: String,
}

/// `POST /event/{id}/comment`
pub async fn comment<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  Authenticated(caller): Authenticated,
  Path(id): Path<String>,
  ApiJson(body): ApiJson<CommentBody>,
) -> Result<Json<Event>, ApiError> {
  let id = event_id(&id)?;
  let event = state
    .store
    .add_comment(id, caller.user_id, body.text)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(event))
}
