//! Events and the rules that govern who may change them.
//!
//! An event is a single document: its likes and comments are embedded lists
//! and every mutation rewrites the whole document. The rules here are pure so
//! every store backend enforces them identically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, validate};

// ─── Types ───────────────────────────────────────────────────────────────────

/// A comment left on an event. Comments are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub comment_id: Uuid,
  pub author_id:  Uuid,
  pub text:       String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
  pub event_id:    Uuid,
  /// The user who created the event; sole authority for update and delete.
  pub owner_id:    Uuid,
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub starts_at:   DateTime<Utc>,
  pub category:    Option<String>,
  /// Users who like this event, in the order they liked it. Never contains
  /// the same user twice.
  pub likes:       Vec<Uuid>,
  pub comments:    Vec<Comment>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input for [`GatherStore::create_event`](crate::store::GatherStore::create_event).
#[derive(Debug, Clone)]
pub struct NewEvent {
  pub title:       String,
  pub description: String,
  pub location:    String,
  pub starts_at:   DateTime<Utc>,
  pub category:    Option<String>,
}

/// A partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub location:    Option<String>,
  pub starts_at:   Option<DateTime<Utc>>,
  pub category:    Option<String>,
}

// ─── Construction ────────────────────────────────────────────────────────────

impl NewEvent {
  /// Validate the descriptive fields and build the initial document.
  pub fn into_event(self, owner_id: Uuid, now: DateTime<Utc>) -> Result<Event> {
    Ok(Event {
      event_id: Uuid::new_v4(),
      owner_id,
      title: validate::required("title", &self.title)?,
      description: validate::required("description", &self.description)?,
      location: validate::required("location", &self.location)?,
      starts_at: self.starts_at,
      category: validate::optional(self.category.as_deref()),
      likes: Vec::new(),
      comments: Vec::new(),
      created_at: now,
      updated_at: now,
    })
  }
}

impl EventPatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.description.is_none()
      && self.location.is_none()
      && self.starts_at.is_none()
      && self.category.is_none()
  }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

impl Event {
  /// Fail with [`Error::NotOwner`] unless `actor` created this event.
  pub fn ensure_owner(&self, actor: Uuid) -> Result<()> {
    if self.owner_id != actor {
      return Err(Error::NotOwner { event: self.event_id, actor });
    }
    Ok(())
  }

  /// Apply an owner's patch. Ownership must already have been checked.
  ///
  /// A blank `category` clears it; any other blank field is rejected.
  pub fn apply(&mut self, patch: EventPatch, now: DateTime<Utc>) -> Result<()> {
    if let Some(title) = patch.title {
      self.title = validate::required("title", &title)?;
    }
    if let Some(description) = patch.description {
      self.description = validate::required("description", &description)?;
    }
    if let Some(location) = patch.location {
      self.location = validate::required("location", &location)?;
    }
    if let Some(starts_at) = patch.starts_at {
      self.starts_at = starts_at;
    }
    if let Some(category) = patch.category {
      self.category = validate::optional(Some(&category));
    }
    self.updated_at = now;
    Ok(())
  }

  /// Add `actor` to the like set. Returns `false` if they already liked it.
  pub fn like(&mut self, actor: Uuid) -> bool {
    if self.likes.contains(&actor) {
      return false;
    }
    self.likes.push(actor);
    true
  }

  /// Remove `actor` from the like set. Returns `false` if they were absent.
  pub fn unlike(&mut self, actor: Uuid) -> bool {
    let before = self.likes.len();
    self.likes.retain(|id| *id != actor);
    self.likes.len() != before
  }

  /// Append a comment by `author`.
  pub fn add_comment(
    &mut self,
    author: Uuid,
    text: &str,
    now: DateTime<Utc>,
  ) -> Result<&Comment> {
    let text = validate::comment(text)?;
    self.comments.push(Comment {
      comment_id: Uuid::new_v4(),
      author_id: author,
      text,
      created_at: now,
    });
    self.updated_at = now;
    Ok(&self.comments[self.comments.len() - 1])
  }
}
