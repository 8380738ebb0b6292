//! Handlers for `/api/user` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/user/details`          | Caller's profile; `photoUrl` may be null |
//! | `PUT`  | `/user/details`          | Names, email, optional new password |
//! | `PUT`  | `/user/update-photo`     | Multipart, single field `photo` |
//! | `GET`  | `/user/photo/{filename}` | Streams a stored photo; no auth |
//! | `GET`  | `/user/suggestions`      | Students other than the caller |

use axum::{
  Json,
  body::{Body, Bytes},
  extract::{
    Multipart, Path, State,
    multipart::{MultipartError, MultipartRejection},
  },
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use gather_core::{
  store::GatherStore,
  user::{Role, User, UserQuery, UserUpdate},
  validate,
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use super::{ApiJson, UserView};
use crate::{
  AppState,
  auth::{Authenticated, MaybeAuthenticated},
  error::ApiError,
  origin::RequestOrigin,
  password::hash_password,
  photos::{PhotoStorage, resolve_url},
};

/// Multipart field carrying the upload.
const PHOTO_FIELD: &str = "photo";

async fn current_user<S: GatherStore>(store: &S, user_id: Uuid) -> Result<User, ApiError> {
  store
    .get_user(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("user not found".into()))
}

// ─── Details ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsView {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub photo_url:  Option<String>,
}

/// `GET /user/details`
pub async fn details<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  Authenticated(caller): Authenticated,
  origin: RequestOrigin,
) -> Result<Json<DetailsView>, ApiError> {
  let user = current_user(&*state.store, caller.user_id).await?;
  Ok(Json(DetailsView {
    photo_url:  user.photo.as_deref().map(|name| resolve_url(name, &origin.0)),
    first_name: user.first_name,
    last_name:  user.last_name,
    email:      user.email,
  }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateDetailsBody {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  /// Blank or absent keeps the current password.
  pub password:   Option<String>,
}

/// `PUT /user/details`
pub async fn update_details<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  Authenticated(caller): Authenticated,
  origin: RequestOrigin,
  ApiJson(body): ApiJson<UpdateDetailsBody>,
) -> Result<Json<UserView>, ApiError> {
  let update = UserUpdate {
    first_name:    validate::required("firstName", &body.first_name)?,
    last_name:     validate::required("lastName", &body.last_name)?,
    email:         validate::email(&body.email)?,
    password_hash: match body.password.as_deref().filter(|p| !p.is_empty()) {
      Some(password) => Some(hash_password(password)?),
      None => None,
    },
  };

  let user = state
    .store
    .update_user(caller.user_id, update)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(UserView::new(user, &origin)))
}

// ─── Photo upload ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PhotoUpdated {
  pub message: &'static str,
  pub user:    UserView,
}

fn multipart_error(e: MultipartError) -> ApiError {
  if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
    ApiError::PayloadTooLarge(format!("photo exceeds the upload limit: {}", e.body_text()))
  } else {
    ApiError::BadRequest(e.body_text())
  }
}

struct Upload {
  original_name: String,
  bytes:         Bytes,
}

/// Pull the `photo` field out of the form; other fields are ignored. The
/// part's declared content type is not trusted; serving guesses it from the
/// stored extension.
async fn read_photo_field(mut multipart: Multipart) -> Result<Option<Upload>, ApiError> {
  while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
    if field.name() != Some(PHOTO_FIELD) {
      continue;
    }
    let original_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;
    if bytes.is_empty() {
      return Ok(None);
    }
    return Ok(Some(Upload { original_name, bytes }));
  }
  Ok(None)
}

/// `PUT /user/update-photo`
pub async fn update_photo<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  Authenticated(caller): Authenticated,
  origin: RequestOrigin,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PhotoUpdated>, ApiError> {
  let multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let upload = read_photo_field(multipart)
    .await?
    .ok_or_else(|| ApiError::BadRequest("No image uploaded".into()))?;

  // Resolve the user before writing anything so a stale token cannot leave an
  // orphaned file behind.
  let user = current_user(&*state.store, caller.user_id).await?;
  let name = state.photos.store(&upload.bytes, &upload.original_name).await?;
  let user = state.photos.replace(&*state.store, &user, name).await?;
  tracing::info!(user = %user.user_id, photo = ?user.photo, "updated profile photo");

  Ok(Json(PhotoUpdated {
    message: "Profile photo updated successfully",
    user:    UserView::new(user, &origin),
  }))
}

// ─── Photo serving ────────────────────────────────────────────────────────────

/// `GET /user/photo/{filename}`
pub async fn photo<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  Path(filename): Path<String>,
) -> Result<Response, ApiError> {
  let stream = state.photos.serve(&filename).await?;
  let mime = mime_guess::from_path(&filename).first_or_octet_stream();

  Ok(
    (
      [
        (header::CONTENT_TYPE, mime.to_string()),
        (header::CONTENT_LENGTH, stream.len.to_string()),
      ],
      Body::from_stream(ReaderStream::new(stream.reader)),
    )
      .into_response(),
  )
}

// ─── Suggestions ──────────────────────────────────────────────────────────────

/// `GET /user/suggestions`
pub async fn suggestions<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  MaybeAuthenticated(caller): MaybeAuthenticated,
  origin: RequestOrigin,
) -> Result<Json<Vec<UserView>>, ApiError> {
  let query = UserQuery {
    exclude_user: caller.map(|c| c.user_id),
    exclude_role: Some(Role::Organizer),
  };
  let users = state.store.list_users(&query).await.map_err(ApiError::store)?;
  Ok(Json(users.into_iter().map(|u| UserView::new(u, &origin)).collect()))
}
