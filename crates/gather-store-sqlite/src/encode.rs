//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings so that they
//! sort lexically. UUIDs are stored as hyphenated lowercase strings. The
//! embedded like and comment lists are stored as compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use gather_core::{
  event::{Comment, Event},
  user::{Role, User},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ─────────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str { role.as_str() }

pub fn decode_role(s: &str) -> Result<Role> { Ok(s.parse()?) }

// ─── Embedded lists ───────────────────────────────────────────────────────────

pub fn encode_likes(likes: &[Uuid]) -> Result<String> {
  Ok(serde_json::to_string(likes)?)
}

pub fn decode_likes(s: &str) -> Result<Vec<Uuid>> { Ok(serde_json::from_str(s)?) }

pub fn encode_comments(comments: &[Comment]) -> Result<String> {
  Ok(serde_json::to_string(comments)?)
}

pub fn decode_comments(s: &str) -> Result<Vec<Comment>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Users ────────────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str =
  "user_id, first_name, last_name, email, password_hash, role, photo, created_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub first_name:    String,
  pub last_name:     String,
  pub email:         String,
  pub password_hash: String,
  pub role:          String,
  pub photo:         Option<String>,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawUser {
      user_id:       row.get(0)?,
      first_name:    row.get(1)?,
      last_name:     row.get(2)?,
      email:         row.get(3)?,
      password_hash: row.get(4)?,
      role:          row.get(5)?,
      photo:         row.get(6)?,
      created_at:    row.get(7)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      first_name:    self.first_name,
      last_name:     self.last_name,
      email:         self.email,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      photo:         self.photo,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

// ─── Events ───────────────────────────────────────────────────────────────────

/// Column list matching [`RawEvent::from_row`] and [`RawEvent::encode`].
pub const EVENT_COLUMNS: &str = "event_id, owner_id, title, description, location, \
   starts_at, category, likes, comments, created_at, updated_at";

/// Raw strings for one `events` row, in [`EVENT_COLUMNS`] order.
pub struct RawEvent {
  pub event_id:    String,
  pub owner_id:    String,
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub starts_at:   String,
  pub category:    Option<String>,
  pub likes:       String,
  pub comments:    String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(RawEvent {
      event_id:    row.get(0)?,
      owner_id:    row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      location:    row.get(4)?,
      starts_at:   row.get(5)?,
      category:    row.get(6)?,
      likes:       row.get(7)?,
      comments:    row.get(8)?,
      created_at:  row.get(9)?,
      updated_at:  row.get(10)?,
    })
  }

  pub fn encode(event: &Event) -> Result<Self> {
    Ok(RawEvent {
      event_id:    encode_uuid(event.event_id),
      owner_id:    encode_uuid(event.owner_id),
      title:       event.title.clone(),
      description: event.description.clone(),
      location:    event.location.clone(),
      starts_at:   encode_dt(event.starts_at),
      category:    event.category.clone(),
      likes:       encode_likes(&event.likes)?,
      comments:    encode_comments(&event.comments)?,
      created_at:  encode_dt(event.created_at),
      updated_at:  encode_dt(event.updated_at),
    })
  }

  pub fn into_event(self) -> Result<Event> {
    Ok(Event {
      event_id:    decode_uuid(&self.event_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      title:       self.title,
      description: self.description,
      location:    self.location,
      starts_at:   decode_dt(&self.starts_at)?,
      category:    self.category,
      likes:       decode_likes(&self.likes)?,
      comments:    decode_comments(&self.comments)?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}
