//! Error type for `folio-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] folio_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unexpected value {value:?} in column {column}")]
  UnknownValue { column: &'static str, value: String },

  #[error("chapter not found: {0}")]
  ChapterNotFound(Uuid),

  #[error("character not found: {0}")]
  CharacterNotFound(Uuid),

  #[error("comment not found: {0}")]
  CommentNotFound(Uuid),

  #[error("notification not found: {0}")]
  NotificationNotFound(Uuid),

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
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<Error> for folio_core::Error {
  fn from(e: Error) -> Self {
    use folio_core::Error as Core;
    match e {
      Error::Core(e) => e,
      Error::ChapterNotFound(id) => Core::ChapterNotFound(id),
      Error::CharacterNotFound(id) => Core::CharacterNotFound(id),
      Error::CommentNotFound(id) => Core::CommentNotFound(id),
      Error::NotificationNotFound(id) => Core::NotificationNotFound(id),
      Error::OrderTaken(order) => Core::OrderTaken(order),
      Error::PovTaken(id) => Core::PovTaken(id),
      Error::MustReadFirst(id) => Core::MustReadFirst(id),
      Error::UsernameTaken(name) => Core::UsernameTaken(name),
      Error::ParentMismatch { parent, chapter } => {
        Core::ParentMismatch { parent, chapter }
      }
      other => Core::Storage(Box::new(other)),
    }
  }
}
