//! Users, roles, and the identity a verified token carries.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Role ────────────────────────────────────────────────────────────────────

/// The kind of account a user registered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Student,
  Organizer,
}

impl Role {
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Student => "student",
      Role::Organizer => "organizer",
    }
  }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Role {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "student" => Ok(Role::Student),
      "organizer" => Ok(Role::Organizer),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// Who is making a request, as asserted by a verified token.
///
/// Self-contained: producing one never touches the store. Handlers that need
/// fresh profile data re-fetch the [`User`] by `user_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
  pub user_id: Uuid,
  pub role:    Role,
}

// ─── User ────────────────────────────────────────────────────────────────────

/// A persisted account.
///
/// `password_hash` is an argon2 PHC string; it is skipped on serialization so
/// a `User` can never leak it through a response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub user_id:       Uuid,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub role:          Role,
  /// Stored name of the current profile photo, if any.
  pub photo:         Option<String>,
  pub created_at:    DateTime<Utc>,
}

impl User {
  pub fn identity(&self) -> Identity {
    Identity { user_id: self.user_id, role: self.role }
  }
}

/// Input for [`GatherStore::create_user`](crate::store::GatherStore::create_user).
///
/// Fields are expected to be normalised already (see [`crate::validate`]) and
/// the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
}

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone)]
pub struct UserUpdate {
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  /// Replacement hash; `None` keeps the current password.
  pub password_hash: Option<String>,
}

/// Filter for [`GatherStore::list_users`](crate::store::GatherStore::list_users).
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
  /// Leave this user out of the result.
  pub exclude_user: Option<Uuid>,
  /// Leave every user with this role out of the result.
  pub exclude_role: Option<Role>,
}

impl UserQuery {
  pub fn matches(&self, user: &User) -> bool {
    self.exclude_user != Some(user.user_id) && self.exclude_role != Some(user.role)
  }
}
