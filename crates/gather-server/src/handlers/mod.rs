//! Route handlers, one module per resource.
//!
//! | Prefix | Module |
//! |--------|--------|
//! | `/api/auth`  | [`auth`] |
//! | `/api/user`  | [`users`] |
//! | `/api/event` | [`events`] |
//! | `/api/stat`  | [`stats`] |

pub mod auth;
pub mod events;
pub mod stats;
pub mod users;

use axum::{Json, extract::FromRequest};
use gather_core::user::{Role, User};
use serde::Serialize;
use uuid::Uuid;

use crate::{error::ApiError, origin::RequestOrigin, photos::resolve_url};

/// [`Json`] whose rejections render as [`ApiError`], so a malformed body gets
/// the same `{"error": ...}` shape as every other failure.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// A user as exposed to clients: no password hash, photo as an absolute URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
  pub user_id:    Uuid,
  pub first_name: String,
  pub last_name:  String,
  pub email:      String,
  pub role:       Role,
  pub photo:      Option<String>,
}

impl UserView {
  pub fn new(user: User, origin: &RequestOrigin) -> Self {
    Self {
      photo:      user.photo.as_deref().map(|name| resolve_url(name, &origin.0)),
      user_id:    user.user_id,
      first_name: user.first_name,
      last_name:  user.last_name,
      email:      user.email,
      role:       user.role,
    }
  }
}
