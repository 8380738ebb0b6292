//! The `GatherStore` trait and supporting types.
//!
//! The trait is implemented by storage backends (e.g. `gather-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::Serialize;
use uuid::Uuid;

use crate::{
  event::{Event, EventPatch, NewEvent},
  user::{NewUser, User, UserQuery, UserUpdate},
};

// ─── Stats ───────────────────────────────────────────────────────────────────

/// Aggregate counts served by the statistics endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
  pub users:      u64,
  pub students:   u64,
  pub organizers: u64,
  pub events:     u64,
  pub likes:      u64,
  pub comments:   u64,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Gather document store.
///
/// Every method is a single document read or write. Mutations of an event are
/// read-modify-write operations that the backend must apply atomically per
/// document; no operation spans more than one document.
///
/// Backend errors convert into [`crate::Error`] so callers can tell domain
/// failures (not found, not owner, duplicate email) from storage faults
/// without knowing the backend.
pub trait GatherStore: Send + Sync {
  type Error: std::error::Error + Into<crate::Error> + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails with [`crate::Error::EmailTaken`] if the
  /// email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Retrieve a user by (normalised) email. Returns `None` if not found.
  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  /// Replace a user's profile fields. Fails with
  /// [`crate::Error::EmailTaken`] if the new email belongs to someone else.
  fn update_user(
    &self,
    id: Uuid,
    update: UserUpdate,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Set (or clear) the stored name of a user's profile photo.
  fn set_user_photo(
    &self,
    id: Uuid,
    photo: Option<String>,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// List users matching `query`, oldest account first.
  fn list_users<'a>(
    &'a self,
    query: &'a UserQuery,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + 'a;

  // ── Events ────────────────────────────────────────────────────────────

  /// Validate and persist a new event owned by `owner`.
  fn create_event(
    &self,
    owner: Uuid,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Retrieve an event by id. Returns `None` if not found.
  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// All events, soonest first.
  fn list_events(
    &self,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  /// Apply `patch` on behalf of `actor`, who must own the event.
  fn update_event(
    &self,
    id: Uuid,
    actor: Uuid,
    patch: EventPatch,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Delete an event on behalf of `actor`, who must own it.
  fn delete_event(
    &self,
    id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Add `actor` to the event's likes; a repeated like changes nothing.
  fn like_event(
    &self,
    id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Remove `actor` from the event's likes; a no-op if they were absent.
  fn unlike_event(
    &self,
    id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Append a comment by `actor`. Any user may comment.
  fn add_comment(
    &self,
    id: Uuid,
    actor: Uuid,
    text: String,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  // ── Statistics ────────────────────────────────────────────────────────

  fn stats(&self) -> impl Future<Output = Result<Stats, Self::Error>> + Send + '_;
}
