//! Error types for `folio-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("chapter not found: {0}")]
  ChapterNotFound(Uuid),

  #[error("character not found: {0}")]
  CharacterNotFound(Uuid),

  #[error("comment not found: {0}")]
  CommentNotFound(Uuid),

  #[error("notification not found: {0}")]
  NotificationNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("chapter order {0} is already taken")]
  OrderTaken(i64),

  #[error("chapter {0} already has a POV character")]
  PovTaken(Uuid),

  #[error("chapter {0} must be read before it can be favorited")]
  MustReadFirst(Uuid),

  #[error("username {0:?} is already taken")]
  UsernameTaken(String),

  #[error("parent comment {parent} does not belong to chapter {chapter}")]
  ParentMismatch { parent: Uuid, chapter: Uuid },

  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
