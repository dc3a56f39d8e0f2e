//! Notifications: best-effort messages generated as side effects of writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  NewChapter,
  NewComment,
  CommentReply,
  NewFavorite,
}

impl NotificationKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::NewChapter => "new_chapter",
      Self::NewComment => "new_comment",
      Self::CommentReply => "comment_reply",
      Self::NewFavorite => "new_favorite",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "new_chapter" => Some(Self::NewChapter),
      "new_comment" => Some(Self::NewComment),
      "comment_reply" => Some(Self::CommentReply),
      "new_favorite" => Some(Self::NewFavorite),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub notification_id: Uuid,
  pub recipient_id:    Uuid,
  pub kind:            NotificationKind,
  pub message:         String,
  pub chapter_id:      Option<Uuid>,
  pub comment_id:      Option<Uuid>,
  pub is_read:         bool,
  pub created_at:      DateTime<Utc>,
}

/// Everything about a notification except who receives it.
#[derive(Debug, Clone)]
pub struct NotificationContent {
  pub kind:       NotificationKind,
  pub message:    String,
  pub chapter_id: Option<Uuid>,
  pub comment_id: Option<Uuid>,
}

impl NotificationContent {
  pub fn new_chapter(chapter_id: Uuid, title: &str) -> Self {
    Self {
      kind:       NotificationKind::NewChapter,
      message:    format!("New chapter published: {title}"),
      chapter_id: Some(chapter_id),
      comment_id: None,
    }
  }

  pub fn new_comment(
    chapter_id: Uuid,
    comment_id: Uuid,
    commenter: &str,
    title: &str,
  ) -> Self {
    Self {
      kind:       NotificationKind::NewComment,
      message:    format!("{commenter} commented on {title}"),
      chapter_id: Some(chapter_id),
      comment_id: Some(comment_id),
    }
  }

  pub fn comment_reply(chapter_id: Uuid, comment_id: Uuid, replier: &str) -> Self {
    Self {
      kind:       NotificationKind::CommentReply,
      message:    format!("{replier} replied to your comment"),
      chapter_id: Some(chapter_id),
      comment_id: Some(comment_id),
    }
  }

  pub fn new_favorite(chapter_id: Uuid, reader: &str, title: &str) -> Self {
    Self {
      kind:       NotificationKind::NewFavorite,
      message:    format!("{reader} favorited {title}"),
      chapter_id: Some(chapter_id),
      comment_id: None,
    }
  }
}
