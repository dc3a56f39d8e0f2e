//! The `ReadingStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `folio-store-sqlite`).
//! Higher layers (`folio-api`, `folio-server`) depend on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  chapter::{
    Chapter, ChapterCounts, ChapterPatch, ChapterStatus, ChapterSummary,
    ChapterUpdate, Neighbors, NewChapter, ViewerState,
  },
  character::{
    Appearance, AppearanceType, AppearingCharacter, AppearsIn, Character,
    CharacterCounts, CharacterPatch, CharacterSort, CharacterSummary,
    NewCharacter,
  },
  comment::{Comment, NewComment},
  identity::{Credentials, NewUser, User},
  interaction::FavoriteOutcome,
  notification::{Notification, NotificationContent},
  pagination::{Page, PageRequest},
  ranking::{DateRange, SortOrder},
};

pub const MAX_QUERY_LEN: usize = 127;

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`ReadingStore::list_chapters`].
#[derive(Debug, Clone, Default)]
pub struct ChapterQuery {
  pub page:     PageRequest,
  /// Case-insensitive substring match over title and content.
  pub text:     Option<String>,
  pub sort:     SortOrder,
  /// Applied to `published_at`; ignored under [`SortOrder::Rising`].
  pub range:    DateRange,
  /// `None` matches every status. An empty list matches nothing.
  pub statuses: Option<Vec<ChapterStatus>>,
  /// Reference instant for date ranges and recency decay; defaults to now.
  pub as_of:    Option<DateTime<Utc>>,
}

impl ChapterQuery {
  /// The reader-facing feed: published chapters only.
  pub fn published(page: PageRequest) -> Self {
    Self {
      page,
      statuses: Some(vec![ChapterStatus::Published]),
      ..Default::default()
    }
  }
}

/// Parameters for [`ReadingStore::list_characters`].
#[derive(Debug, Clone, Default)]
pub struct CharacterQuery {
  pub page:                PageRequest,
  /// Case-insensitive substring match over name and summary.
  pub text:                Option<String>,
  pub sort:                CharacterSort,
  pub include_unpublished: bool,
}

/// Reject free-text queries longer than [`MAX_QUERY_LEN`] characters.
pub fn validate_query_text(text: Option<&str>) -> crate::Result<()> {
  match text {
    Some(t) if t.chars().count() > MAX_QUERY_LEN => Err(crate::Error::Invalid(
      format!("query must be at most {MAX_QUERY_LEN} characters"),
    )),
    _ => Ok(()),
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Folio storage backend.
///
/// Every method is a single atomic unit against the store. Uniqueness of
/// (resource, user) interaction pairs, chapter `order` and the per-chapter POV
/// slot is enforced here, so concurrent duplicate writes are harmless.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ReadingStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Returns [`crate::Error::UsernameTaken`] if the name is in use.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user and their password hash by username.
  fn find_credentials(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + '_;

  // ── Chapters ──────────────────────────────────────────────────────────

  /// Persist a chapter, deriving slug, word count and `published_at`.
  /// Returns [`crate::Error::OrderTaken`] if `order` is in use.
  fn create_chapter(
    &self,
    input: NewChapter,
  ) -> impl Future<Output = Result<Chapter, Self::Error>> + Send + '_;

  /// Apply a partial update. `published_at` is set on the first transition
  /// to published and never again.
  fn update_chapter(
    &self,
    chapter_id: Uuid,
    patch: ChapterPatch,
  ) -> impl Future<Output = Result<ChapterUpdate, Self::Error>> + Send + '_;

  /// Physically delete a chapter and everything hanging off it.
  fn delete_chapter(
    &self,
    chapter_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_chapter(
    &self,
    chapter_id: Uuid,
  ) -> impl Future<Output = Result<Option<Chapter>, Self::Error>> + Send + '_;

  fn get_chapter_by_slug(
    &self,
    slug: String,
  ) -> impl Future<Output = Result<Option<Chapter>, Self::Error>> + Send + '_;

  fn chapter_counts(
    &self,
    chapter_id: Uuid,
  ) -> impl Future<Output = Result<ChapterCounts, Self::Error>> + Send + '_;

  /// The published chapters immediately before and after `order`.
  fn neighbors(
    &self,
    order: i64,
  ) -> impl Future<Output = Result<Neighbors, Self::Error>> + Send + '_;

  /// One page of chapters with counts, filtered and ordered per `query`.
  fn list_chapters<'a>(
    &'a self,
    query: &'a ChapterQuery,
  ) -> impl Future<Output = Result<Page<ChapterSummary>, Self::Error>> + Send + 'a;

  /// The most recently published chapters, newest first.
  fn recent_chapters(
    &self,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<Chapter>, Self::Error>> + Send + '_;

  // ── Characters ────────────────────────────────────────────────────────

  fn create_character(
    &self,
    input: NewCharacter,
  ) -> impl Future<Output = Result<Character, Self::Error>> + Send + '_;

  fn update_character(
    &self,
    character_id: Uuid,
    patch: CharacterPatch,
  ) -> impl Future<Output = Result<Character, Self::Error>> + Send + '_;

  fn delete_character(
    &self,
    character_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_character(
    &self,
    character_id: Uuid,
  ) -> impl Future<Output = Result<Option<Character>, Self::Error>> + Send + '_;

  fn get_character_by_slug(
    &self,
    slug: String,
  ) -> impl Future<Output = Result<Option<Character>, Self::Error>> + Send + '_;

  fn character_counts(
    &self,
    character_id: Uuid,
  ) -> impl Future<Output = Result<CharacterCounts, Self::Error>> + Send + '_;

  fn list_characters<'a>(
    &'a self,
    query: &'a CharacterQuery,
  ) -> impl Future<Output = Result<Page<CharacterSummary>, Self::Error>> + Send + 'a;

  // ── Appearances ───────────────────────────────────────────────────────

  /// Insert or retype the (chapter, character) appearance. Returns
  /// [`crate::Error::PovTaken`] if another character already holds the
  /// chapter's POV slot.
  fn set_appearance(
    &self,
    chapter_id: Uuid,
    character_id: Uuid,
    appearance_type: AppearanceType,
  ) -> impl Future<Output = Result<Appearance, Self::Error>> + Send + '_;

  /// Returns whether a row was removed.
  fn remove_appearance(
    &self,
    chapter_id: Uuid,
    character_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Characters appearing in a chapter, POV first, then by name.
  fn chapter_characters(
    &self,
    chapter_id: Uuid,
    include_unpublished: bool,
  ) -> impl Future<Output = Result<Vec<AppearingCharacter>, Self::Error>> + Send + '_;

  /// Chapters a character appears in, by `order`.
  fn character_chapters(
    &self,
    character_id: Uuid,
    include_unpublished: bool,
  ) -> impl Future<Output = Result<Vec<AppearsIn>, Self::Error>> + Send + '_;

  // ── Interactions ──────────────────────────────────────────────────────

  /// Returns `true` if the read was newly recorded.
  fn record_read(
    &self,
    chapter_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn remove_read(
    &self,
    chapter_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns [`crate::Error::MustReadFirst`] without a prior read.
  fn favorite_chapter(
    &self,
    chapter_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<FavoriteOutcome, Self::Error>> + Send + '_;

  fn unfavorite_chapter(
    &self,
    chapter_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn viewer_state(
    &self,
    chapter_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<ViewerState, Self::Error>> + Send + '_;

  fn favorite_character(
    &self,
    character_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<FavoriteOutcome, Self::Error>> + Send + '_;

  fn unfavorite_character(
    &self,
    character_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn has_favorited_character(
    &self,
    character_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns `true` if this is the user's first view of the character.
  fn record_character_view(
    &self,
    character_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// A user's favorited chapters, most recently favorited first.
  fn favorite_chapters(
    &self,
    user_id: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<ChapterSummary>, Self::Error>> + Send + '_;

  fn favorite_characters(
    &self,
    user_id: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<CharacterSummary>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  /// Persist a comment with `depth` derived from its parent. The parent must
  /// exist and belong to the same chapter.
  fn create_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    comment_id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  fn update_comment(
    &self,
    comment_id: Uuid,
    content: String,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Delete a comment and, transitively, its replies.
  fn delete_comment(
    &self,
    comment_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All comments on a chapter in insertion order.
  fn chapter_comments(
    &self,
    chapter_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  fn notify(
    &self,
    recipient_id: Uuid,
    content: NotificationContent,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// Send `content` to every user except `except`; returns how many were
  /// created.
  fn notify_all(
    &self,
    except: Uuid,
    content: NotificationContent,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// A user's notifications, newest first.
  fn list_notifications(
    &self,
    user_id: Uuid,
    unread_only: bool,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Notification>, Self::Error>> + Send + '_;

  fn unread_count(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Returns [`crate::Error::NotificationNotFound`] unless the notification
  /// belongs to `user_id`.
  fn mark_notification_read(
    &self,
    user_id: Uuid,
    notification_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns how many notifications changed.
  fn mark_all_read(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
