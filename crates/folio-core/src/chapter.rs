//! Chapters, the numbered and ordered units of the serialized work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MAX_TITLE_LEN: usize = 200;

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
  #[default]
  Draft,
  Published,
  Archived,
}

impl ChapterStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Draft => "draft",
      Self::Published => "published",
      Self::Archived => "archived",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "draft" => Some(Self::Draft),
      "published" => Some(Self::Published),
      "archived" => Some(Self::Archived),
      _ => None,
    }
  }
}

/// The `published_at` a chapter should carry after moving to `next`.
///
/// The timestamp is set on the first transition to published and never
/// replaced afterwards, not even when the chapter is archived or returned to
/// draft and later published again.
pub fn published_at_after(
  current: Option<DateTime<Utc>>,
  next: ChapterStatus,
  now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
  match (current, next) {
    (None, ChapterStatus::Published) => Some(now),
    (current, _) => current,
  }
}

// ─── Chapter ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
  pub chapter_id:   Uuid,
  pub author_id:    Uuid,
  /// Position in the book; unique across all chapters.
  pub order:        i64,
  pub title:        String,
  pub slug:         String,
  pub content:      String,
  pub status:       ChapterStatus,
  pub word_count:   u32,
  pub published_at: Option<DateTime<Utc>>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Chapter {
  pub fn is_published(&self) -> bool { self.status == ChapterStatus::Published }
}

/// Input to [`crate::store::ReadingStore::create_chapter`]. Slug, word count
/// and timestamps are derived by the store.
#[derive(Debug, Clone)]
pub struct NewChapter {
  pub author_id: Uuid,
  pub order:     i64,
  pub title:     String,
  pub content:   String,
  pub status:    ChapterStatus,
}

impl NewChapter {
  pub fn validate(&self) -> Result<()> {
    validate_title(&self.title)?;
    validate_order(self.order)
  }
}

/// A partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ChapterPatch {
  pub title:   Option<String>,
  pub content: Option<String>,
  pub order:   Option<i64>,
  pub status:  Option<ChapterStatus>,
}

impl ChapterPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(title) = &self.title {
      validate_title(title)?;
    }
    if let Some(order) = self.order {
      validate_order(order)?;
    }
    Ok(())
  }
}

/// Result of an update: the stored chapter plus whether this update was its
/// first publication.
#[derive(Debug, Clone)]
pub struct ChapterUpdate {
  pub chapter:         Chapter,
  pub newly_published: bool,
}

fn validate_title(title: &str) -> Result<()> {
  let len = title.trim().chars().count();
  if len == 0 || len > MAX_TITLE_LEN {
    return Err(Error::Invalid(format!(
      "title must be 1-{MAX_TITLE_LEN} characters"
    )));
  }
  Ok(())
}

fn validate_order(order: i64) -> Result<()> {
  if order < 1 {
    return Err(Error::Invalid(format!("order must be positive, got {order}")));
  }
  Ok(())
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// Denormalized interaction counts for one chapter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterCounts {
  pub reads:     u64,
  pub favorites: u64,
  pub comments:  u64,
}

/// A listing row: everything but the content, plus counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterSummary {
  pub chapter_id:   Uuid,
  pub order:        i64,
  pub title:        String,
  pub slug:         String,
  pub status:       ChapterStatus,
  pub word_count:   u32,
  pub published_at: Option<DateTime<Utc>>,
  pub created_at:   DateTime<Utc>,
  #[serde(flatten)]
  pub counts:       ChapterCounts,
}

/// Previous/next navigation entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterLink {
  pub chapter_id: Uuid,
  pub order:      i64,
  pub title:      String,
  pub slug:       String,
}

/// The published chapters immediately before and after a given `order`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Neighbors {
  pub previous: Option<ChapterLink>,
  pub next:     Option<ChapterLink>,
}

/// What the requesting user has done with a chapter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerState {
  pub has_read:      bool,
  pub has_favorited: bool,
}
