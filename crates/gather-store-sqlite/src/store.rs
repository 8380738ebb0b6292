//! [`SqliteStore`]: the SQLite implementation of [`GatherStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use gather_core::{
  event::{Event, EventPatch, NewEvent},
  store::{GatherStore, Stats},
  user::{NewUser, User, UserQuery, UserUpdate},
};

use crate::{
  encode::{
    EVENT_COLUMNS, RawEvent, RawUser, USER_COLUMNS, encode_dt, encode_role, encode_uuid,
  },
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Gather document store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised on the connection's thread, and every read-modify-write
/// runs inside one transaction, so each document write is atomic.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load an event, let `modify` change it, and write it back if it reports
  /// a change. The whole sequence runs in one transaction.
  async fn modify_event<F>(&self, id: Uuid, modify: F) -> Result<Event>
  where
    F: FnOnce(&mut Event) -> gather_core::Result<bool> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(modify_event_in(conn, id, modify)))
      .await?
  }
}

// ─── Synchronous helpers (run on the connection thread) ──────────────────────

fn user_by_id(conn: &Connection, id: Uuid) -> Result<Option<User>> {
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawUser::from_row,
    )
    .optional()?;
  raw.map(RawUser::into_user).transpose()
}

fn user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
  let raw = conn
    .query_row(
      &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
      rusqlite::params![email],
      RawUser::from_row,
    )
    .optional()?;
  raw.map(RawUser::into_user).transpose()
}

fn event_by_id(conn: &Connection, id: Uuid) -> Result<Option<Event>> {
  let raw = conn
    .query_row(
      &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
      rusqlite::params![encode_uuid(id)],
      RawEvent::from_row,
    )
    .optional()?;
  raw.map(RawEvent::into_event).transpose()
}

fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
  let raw = RawEvent::encode(event)?;
  conn.execute(
    &format!(
      "INSERT INTO events ({EVENT_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
    ),
    rusqlite::params![
      raw.event_id,
      raw.owner_id,
      raw.title,
      raw.description,
      raw.location,
      raw.starts_at,
      raw.category,
      raw.likes,
      raw.comments,
      raw.created_at,
      raw.updated_at,
    ],
  )?;
  Ok(())
}

/// Rewrite every mutable column of an existing event document.
fn rewrite_event(conn: &Connection, event: &Event) -> Result<()> {
  let raw = RawEvent::encode(event)?;
  conn.execute(
    "UPDATE events SET
       title = ?2, description = ?3, location = ?4, starts_at = ?5,
       category = ?6, likes = ?7, comments = ?8, updated_at = ?9
     WHERE event_id = ?1",
    rusqlite::params![
      raw.event_id,
      raw.title,
      raw.description,
      raw.location,
      raw.starts_at,
      raw.category,
      raw.likes,
      raw.comments,
      raw.updated_at,
    ],
  )?;
  Ok(())
}

fn modify_event_in<F>(conn: &mut Connection, id: Uuid, modify: F) -> Result<Event>
where
  F: FnOnce(&mut Event) -> gather_core::Result<bool>,
{
  let tx = conn.transaction()?;
  let mut event =
    event_by_id(&tx, id)?.ok_or(gather_core::Error::EventNotFound(id))?;
  if modify(&mut event)? {
    rewrite_event(&tx, &event)?;
  }
  tx.commit()?;
  Ok(event)
}

fn create_user_in(conn: &mut Connection, user: &User) -> Result<()> {
  let tx = conn.transaction()?;
  if user_by_email(&tx, &user.email)?.is_some() {
    return Err(gather_core::Error::EmailTaken(user.email.clone()).into());
  }
  tx.execute(
    &format!(
      "INSERT INTO users ({USER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
    ),
    rusqlite::params![
      encode_uuid(user.user_id),
      user.first_name,
      user.last_name,
      user.email,
      user.password_hash,
      encode_role(user.role),
      user.photo,
      encode_dt(user.created_at),
    ],
  )?;
  tx.commit()?;
  Ok(())
}

fn update_user_in(conn: &mut Connection, id: Uuid, update: UserUpdate) -> Result<User> {
  let tx = conn.transaction()?;
  let mut user = user_by_id(&tx, id)?.ok_or(gather_core::Error::UserNotFound(id))?;

  if let Some(holder) = user_by_email(&tx, &update.email)?
    && holder.user_id != id
  {
    return Err(gather_core::Error::EmailTaken(update.email).into());
  }

  user.first_name = update.first_name;
  user.last_name = update.last_name;
  user.email = update.email;
  if let Some(hash) = update.password_hash {
    user.password_hash = hash;
  }

  tx.execute(
    "UPDATE users SET first_name = ?2, last_name = ?3, email = ?4, password_hash = ?5
     WHERE user_id = ?1",
    rusqlite::params![
      encode_uuid(id),
      user.first_name,
      user.last_name,
      user.email,
      user.password_hash,
    ],
  )?;
  tx.commit()?;
  Ok(user)
}

fn set_user_photo_in(
  conn: &mut Connection,
  id: Uuid,
  photo: Option<String>,
) -> Result<User> {
  let tx = conn.transaction()?;
  let mut user = user_by_id(&tx, id)?.ok_or(gather_core::Error::UserNotFound(id))?;
  tx.execute(
    "UPDATE users SET photo = ?2 WHERE user_id = ?1",
    rusqlite::params![encode_uuid(id), photo],
  )?;
  tx.commit()?;
  user.photo = photo;
  Ok(user)
}

fn delete_event_in(conn: &mut Connection, id: Uuid, actor: Uuid) -> Result<()> {
  let tx = conn.transaction()?;
  let event = event_by_id(&tx, id)?.ok_or(gather_core::Error::EventNotFound(id))?;
  event.ensure_owner(actor)?;
  tx.execute(
    "DELETE FROM events WHERE event_id = ?1",
    rusqlite::params![encode_uuid(id)],
  )?;
  tx.commit()?;
  Ok(())
}

// ─── GatherStore impl ────────────────────────────────────────────────────────

impl GatherStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:       Uuid::new_v4(),
      first_name:    input.first_name,
      last_name:     input.last_name,
      email:         input.email,
      password_hash: input.password_hash,
      role:          input.role,
      photo:         None,
      created_at:    Utc::now(),
    };

    let row = user.clone();
    self
      .conn
      .call(move |conn| Ok(create_user_in(conn, &row)))
      .await??;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    self.conn.call(move |conn| Ok(user_by_id(conn, id))).await?
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();
    self
      .conn
      .call(move |conn| Ok(user_by_email(conn, &email)))
      .await?
  }

  async fn update_user(&self, id: Uuid, update: UserUpdate) -> Result<User> {
    self
      .conn
      .call(move |conn| Ok(update_user_in(conn, id, update)))
      .await?
  }

  async fn set_user_photo(&self, id: Uuid, photo: Option<String>) -> Result<User> {
    self
      .conn
      .call(move |conn| Ok(set_user_photo_in(conn, id, photo)))
      .await?
  }

  async fn list_users(&self, query: &UserQuery) -> Result<Vec<User>> {
    let exclude_user = query.exclude_user.map(encode_uuid);
    let exclude_role = query.exclude_role.map(encode_role);

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {USER_COLUMNS} FROM users
           WHERE (?1 IS NULL OR user_id != ?1)
             AND (?2 IS NULL OR role != ?2)
           ORDER BY created_at, user_id"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![exclude_user, exclude_role],
            RawUser::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn create_event(&self, owner: Uuid, input: NewEvent) -> Result<Event> {
    let event = input.into_event(owner, Utc::now())?;

    let row = event.clone();
    self
      .conn
      .call(move |conn| Ok(insert_event(conn, &row)))
      .await??;

    Ok(event)
  }

  async fn get_event(&self, id: Uuid) -> Result<Option<Event>> {
    self.conn.call(move |conn| Ok(event_by_id(conn, id))).await?
  }

  async fn list_events(&self) -> Result<Vec<Event>> {
    let raws: Vec<RawEvent> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at, created_at"
        ))?;
        let rows = stmt
          .query_map([], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn update_event(&self, id: Uuid, actor: Uuid, patch: EventPatch) -> Result<Event> {
    self
      .modify_event(id, move |event| {
        event.ensure_owner(actor)?;
        event.apply(patch, Utc::now())?;
        Ok(true)
      })
      .await
  }

  async fn delete_event(&self, id: Uuid, actor: Uuid) -> Result<()> {
    self
      .conn
      .call(move |conn| Ok(delete_event_in(conn, id, actor)))
      .await?
  }

  async fn like_event(&self, id: Uuid, actor: Uuid) -> Result<Event> {
    self.modify_event(id, move |event| Ok(event.like(actor))).await
  }

  async fn unlike_event(&self, id: Uuid, actor: Uuid) -> Result<Event> {
    self.modify_event(id, move |event| Ok(event.unlike(actor))).await
  }

  async fn add_comment(&self, id: Uuid, actor: Uuid, text: String) -> Result<Event> {
    self
      .modify_event(id, move |event| {
        event.add_comment(actor, &text, Utc::now())?;
        Ok(true)
      })
      .await
  }

  // ── Statistics ────────────────────────────────────────────────────────────

  async fn stats(&self) -> Result<Stats> {
    let counts: [i64; 6] = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM users),
             (SELECT COUNT(*) FROM users WHERE role = 'student'),
             (SELECT COUNT(*) FROM users WHERE role = 'organizer'),
             (SELECT COUNT(*) FROM events),
             (SELECT COALESCE(SUM(json_array_length(likes)), 0) FROM events),
             (SELECT COALESCE(SUM(json_array_length(comments)), 0) FROM events)",
          [],
          |row| {
            Ok([
              row.get(0)?,
              row.get(1)?,
              row.get(2)?,
              row.get(3)?,
              row.get(4)?,
              row.get(5)?,
            ])
          },
        )?)
      })
      .await?;

    let [users, students, organizers, events, likes, comments] = counts.map(|n| n.max(0) as u64);
    Ok(Stats { users, students, organizers, events, likes, comments })
  }
}
