//! Error types for `gather-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("event not found: {0}")]
  EventNotFound(Uuid),

  #[error("email is already registered: {0}")]
  EmailTaken(String),

  #[error("user {actor} is not the owner of event {event}")]
  NotOwner { event: Uuid, actor: Uuid },

  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  /// A failure inside a storage backend that has no domain meaning.
  #[error("storage error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
