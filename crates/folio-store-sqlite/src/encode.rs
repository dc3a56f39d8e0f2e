//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexical order matches chronological order. UUIDs are stored as
//! hyphenated lowercase strings; booleans as 0/1 integers.

use chrono::{DateTime, SecondsFormat, Utc};
use folio_core::{
  chapter::{Chapter, ChapterCounts, ChapterStatus, ChapterSummary},
  character::{AppearanceType, Character, CharacterCounts, CharacterSummary},
  comment::Comment,
  identity::User,
  notification::{Notification, NotificationKind},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

fn count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern and wrap the
/// text in wildcards.
pub fn like_pattern(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len() + 2);
  escaped.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped.push('%');
  escaped
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_status(s: &str) -> Result<ChapterStatus> {
  ChapterStatus::parse(s).ok_or_else(|| Error::UnknownValue {
    column: "chapters.status",
    value:  s.to_owned(),
  })
}

pub fn decode_appearance_type(s: &str) -> Result<AppearanceType> {
  AppearanceType::parse(s).ok_or_else(|| Error::UnknownValue {
    column: "chapter_characters.appearance_type",
    value:  s.to_owned(),
  })
}

pub fn decode_notification_kind(s: &str) -> Result<NotificationKind> {
  NotificationKind::parse(s).ok_or_else(|| Error::UnknownValue {
    column: "notifications.kind",
    value:  s.to_owned(),
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, username, is_admin, created_at";

/// Raw values read from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub is_admin:   bool,
  pub created_at: String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:    row.get(0)?,
      username:   row.get(1)?,
      is_admin:   row.get(2)?,
      created_at: row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      is_admin:   self.is_admin,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const CHAPTER_COLUMNS: &str = "c.chapter_id, c.author_id, c.sort_order, \
  c.title, c.slug, c.content, c.status, c.word_count, c.published_at, \
  c.created_at, c.updated_at";

/// Raw values read from a `chapters` row.
pub struct RawChapter {
  pub chapter_id:   String,
  pub author_id:    String,
  pub sort_order:   i64,
  pub title:        String,
  pub slug:         String,
  pub content:      String,
  pub status:       String,
  pub word_count:   i64,
  pub published_at: Option<String>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawChapter {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      chapter_id:   row.get(0)?,
      author_id:    row.get(1)?,
      sort_order:   row.get(2)?,
      title:        row.get(3)?,
      slug:         row.get(4)?,
      content:      row.get(5)?,
      status:       row.get(6)?,
      word_count:   row.get(7)?,
      published_at: row.get(8)?,
      created_at:   row.get(9)?,
      updated_at:   row.get(10)?,
    })
  }

  pub fn into_chapter(self) -> Result<Chapter> {
    Ok(Chapter {
      chapter_id:   decode_uuid(&self.chapter_id)?,
      author_id:    decode_uuid(&self.author_id)?,
      order:        self.sort_order,
      title:        self.title,
      slug:         self.slug,
      content:      self.content,
      status:       decode_status(&self.status)?,
      word_count:   u32::try_from(self.word_count).unwrap_or(0),
      published_at: decode_opt_dt(self.published_at)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Listing columns plus the three engagement counts.
pub const CHAPTER_SUMMARY_COLUMNS: &str = "c.chapter_id, c.sort_order, c.title, \
  c.slug, c.status, c.word_count, c.published_at, c.created_at, \
  (SELECT COUNT(*) FROM reads r WHERE r.chapter_id = c.chapter_id) AS read_count, \
  (SELECT COUNT(*) FROM chapter_favorites f WHERE f.chapter_id = c.chapter_id) AS favorite_count, \
  (SELECT COUNT(*) FROM comments m WHERE m.chapter_id = c.chapter_id) AS comment_count";

pub struct RawChapterSummary {
  pub chapter_id:     String,
  pub sort_order:     i64,
  pub title:          String,
  pub slug:           String,
  pub status:         String,
  pub word_count:     i64,
  pub published_at:   Option<String>,
  pub created_at:     String,
  pub read_count:     i64,
  pub favorite_count: i64,
  pub comment_count:  i64,
}

impl RawChapterSummary {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      chapter_id:     row.get(0)?,
      sort_order:     row.get(1)?,
      title:          row.get(2)?,
      slug:           row.get(3)?,
      status:         row.get(4)?,
      word_count:     row.get(5)?,
      published_at:   row.get(6)?,
      created_at:     row.get(7)?,
      read_count:     row.get(8)?,
      favorite_count: row.get(9)?,
      comment_count:  row.get(10)?,
    })
  }

  pub fn into_summary(self) -> Result<ChapterSummary> {
    Ok(ChapterSummary {
      chapter_id:   decode_uuid(&self.chapter_id)?,
      order:        self.sort_order,
      title:        self.title,
      slug:         self.slug,
      status:       decode_status(&self.status)?,
      word_count:   u32::try_from(self.word_count).unwrap_or(0),
      published_at: decode_opt_dt(self.published_at)?,
      created_at:   decode_dt(&self.created_at)?,
      counts:       ChapterCounts {
        reads:     count(self.read_count),
        favorites: count(self.favorite_count),
        comments:  count(self.comment_count),
      },
    })
  }
}

pub const CHARACTER_COLUMNS: &str = "ch.character_id, ch.name, ch.slug, \
  ch.summary, ch.biography, ch.image_url, ch.is_published, ch.created_at, \
  ch.updated_at";

pub struct RawCharacter {
  pub character_id: String,
  pub name:         String,
  pub slug:         String,
  pub summary:      String,
  pub biography:    String,
  pub image_url:    Option<String>,
  pub is_published: bool,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawCharacter {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      character_id: row.get(0)?,
      name:         row.get(1)?,
      slug:         row.get(2)?,
      summary:      row.get(3)?,
      biography:    row.get(4)?,
      image_url:    row.get(5)?,
      is_published: row.get(6)?,
      created_at:   row.get(7)?,
      updated_at:   row.get(8)?,
    })
  }

  pub fn into_character(self) -> Result<Character> {
    Ok(Character {
      character_id: decode_uuid(&self.character_id)?,
      name:         self.name,
      slug:         self.slug,
      summary:      self.summary,
      biography:    self.biography,
      image_url:    self.image_url,
      is_published: self.is_published,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

pub const CHARACTER_SUMMARY_COLUMNS: &str = "ch.character_id, ch.name, ch.slug, \
  ch.summary, ch.image_url, ch.is_published, ch.created_at, \
  (SELECT COUNT(*) FROM character_views v WHERE v.character_id = ch.character_id) AS view_count, \
  (SELECT COUNT(*) FROM character_favorites f WHERE f.character_id = ch.character_id) AS favorite_count";

pub struct RawCharacterSummary {
  pub character_id:   String,
  pub name:           String,
  pub slug:           String,
  pub summary:        String,
  pub image_url:      Option<String>,
  pub is_published:   bool,
  pub created_at:     String,
  pub view_count:     i64,
  pub favorite_count: i64,
}

impl RawCharacterSummary {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      character_id:   row.get(0)?,
      name:           row.get(1)?,
      slug:           row.get(2)?,
      summary:        row.get(3)?,
      image_url:      row.get(4)?,
      is_published:   row.get(5)?,
      created_at:     row.get(6)?,
      view_count:     row.get(7)?,
      favorite_count: row.get(8)?,
    })
  }

  pub fn into_summary(self) -> Result<CharacterSummary> {
    Ok(CharacterSummary {
      character_id: decode_uuid(&self.character_id)?,
      name:         self.name,
      slug:         self.slug,
      summary:      self.summary,
      image_url:    self.image_url,
      is_published: self.is_published,
      created_at:   decode_dt(&self.created_at)?,
      counts:       CharacterCounts {
        views:     count(self.view_count),
        favorites: count(self.favorite_count),
      },
    })
  }
}

pub const COMMENT_COLUMNS: &str = "m.comment_id, m.chapter_id, m.author_id, \
  u.username, m.parent_id, m.depth, m.content, m.created_at, m.updated_at";

pub struct RawComment {
  pub comment_id:  String,
  pub chapter_id:  String,
  pub author_id:   String,
  pub author_name: String,
  pub parent_id:   Option<String>,
  pub depth:       i64,
  pub content:     String,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id:  row.get(0)?,
      chapter_id:  row.get(1)?,
      author_id:   row.get(2)?,
      author_name: row.get(3)?,
      parent_id:   row.get(4)?,
      depth:       row.get(5)?,
      content:     row.get(6)?,
      created_at:  row.get(7)?,
      updated_at:  row.get(8)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id:  decode_uuid(&self.comment_id)?,
      chapter_id:  decode_uuid(&self.chapter_id)?,
      author_id:   decode_uuid(&self.author_id)?,
      author_name: self.author_name,
      parent_id:   decode_opt_uuid(self.parent_id)?,
      depth:       u32::try_from(self.depth).unwrap_or(1),
      content:     self.content,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

pub const NOTIFICATION_COLUMNS: &str = "notification_id, recipient_id, kind, \
  message, chapter_id, comment_id, is_read, created_at";

pub struct RawNotification {
  pub notification_id: String,
  pub recipient_id:    String,
  pub kind:            String,
  pub message:         String,
  pub chapter_id:      Option<String>,
  pub comment_id:      Option<String>,
  pub is_read:         bool,
  pub created_at:      String,
}

impl RawNotification {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      notification_id: row.get(0)?,
      recipient_id:    row.get(1)?,
      kind:            row.get(2)?,
      message:         row.get(3)?,
      chapter_id:      row.get(4)?,
      comment_id:      row.get(5)?,
      is_read:         row.get(6)?,
      created_at:      row.get(7)?,
    })
  }

  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      recipient_id:    decode_uuid(&self.recipient_id)?,
      kind:            decode_notification_kind(&self.kind)?,
      message:         self.message,
      chapter_id:      decode_opt_uuid(self.chapter_id)?,
      comment_id:      decode_opt_uuid(self.comment_id)?,
      is_read:         self.is_read,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let b = Utc.timestamp_opt(1_700_000_000, 5_000).unwrap();
    let c = Utc.timestamp_opt(1_700_000_001, 0).unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert!(encode_dt(b) < encode_dt(c));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    assert_eq!(like_pattern("storm"), "%storm%");
  }
}
