//! Handlers for `/api/auth` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/register` | 201 `{token, user}`; 409 on duplicate email |
//! | `POST` | `/auth/login`    | `{token}`; 401 on bad credentials |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use gather_core::{
  store::GatherStore,
  user::{NewUser, Role},
  validate,
};
use serde::{Deserialize, Serialize};

use super::{ApiJson, UserView};
use crate::{
  AppState,
  error::ApiError,
  origin::RequestOrigin,
  password::{hash_password, verify_password},
  photos::PhotoStorage,
};

#[derive(Debug, Serialize)]
pub struct TokenResponse {
  pub token: String,
}

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterBody {
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub password:   String,
  /// `student` or `organizer`.
  #[serde(rename = "type", alias = "role")]
  pub role:       String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
  pub token: String,
  pub user:  UserView,
}

/// `POST /auth/register`
pub async fn register<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  origin: RequestOrigin,
  ApiJson(body): ApiJson<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
  let first_name = validate::required("firstName", &body.first_name)?;
  let last_name = validate::required("lastName", &body.last_name)?;
  let email = validate::email(&body.email)?;
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password is required".into()));
  }
  let role: Role = body.role.parse()?;

  let user = state
    .store
    .create_user(NewUser {
      first_name,
      last_name,
      email,
      password_hash: hash_password(&body.password)?,
      role,
    })
    .await
    .map_err(ApiError::store)?;
  tracing::info!(user = %user.user_id, role = %user.role, "registered user");

  let token = state.tokens.issue(&user.identity())?;
  Ok((
    StatusCode::CREATED,
    Json(RegisterResponse { token, user: UserView::new(user, &origin) }),
  ))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S: GatherStore + 'static, P: PhotoStorage>(
  State(state): State<AppState<S, P>>,
  ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<TokenResponse>, ApiError> {
  let email = body.email.trim().to_lowercase();
  let user = state
    .store
    .find_user_by_email(&email)
    .await
    .map_err(ApiError::store)?
    .filter(|user| verify_password(&body.password, &user.password_hash))
    .ok_or_else(|| ApiError::Unauthorized("invalid email or password".into()))?;

  let token = state.tokens.issue(&user.identity())?;
  Ok(Json(TokenResponse { token }))
}
