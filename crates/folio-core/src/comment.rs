//! Threaded comments.
//!
//! Comments form a forest per chapter. A root has depth 1 and every reply is
//! one deeper than its parent. Depth is not capped when writing; readers see a
//! `can_reply` flag that turns off past [`MAX_REPLY_DEPTH`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  identity::Identity,
  notification::NotificationContent,
};

/// Deepest comment that still offers a reply affordance.
pub const MAX_REPLY_DEPTH: u32 = 4;

pub const MAX_COMMENT_LEN: usize = 5000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub comment_id:  Uuid,
  pub chapter_id:  Uuid,
  pub author_id:   Uuid,
  pub author_name: String,
  pub parent_id:   Option<Uuid>,
  pub depth:       u32,
  pub content:     String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::ReadingStore::create_comment`]. The store derives
/// the depth from the parent.
#[derive(Debug, Clone)]
pub struct NewComment {
  pub chapter_id: Uuid,
  pub author_id:  Uuid,
  pub parent_id:  Option<Uuid>,
  pub content:    String,
}

pub fn validate_content(content: &str) -> Result<()> {
  let len = content.trim().chars().count();
  if len == 0 || len > MAX_COMMENT_LEN {
    return Err(Error::Invalid(format!(
      "comment must be 1-{MAX_COMMENT_LEN} characters"
    )));
  }
  Ok(())
}

/// Depth of a new comment given its parent's depth, if it has a parent.
pub fn child_depth(parent_depth: Option<u32>) -> u32 {
  parent_depth.map_or(1, |d| d.saturating_add(1))
}

/// Edit and delete are open to the comment's author and the chapter's author;
/// admins moderate everything.
pub fn can_moderate(identity: &Identity, comment: &Comment, chapter_author: Uuid) -> bool {
  identity.owns_or_admin(comment.author_id) || identity.user_id == chapter_author
}

/// Who hears about `comment`: the parent's author for a reply, the chapter's
/// author for a root comment. Nobody is notified about their own comment.
pub fn notification_for(
  comment: &Comment,
  parent: Option<&Comment>,
  chapter_author: Uuid,
  chapter_title: &str,
) -> Option<(Uuid, NotificationContent)> {
  let (recipient, content) = match parent {
    Some(parent) => (
      parent.author_id,
      NotificationContent::comment_reply(
        comment.chapter_id,
        comment.comment_id,
        &comment.author_name,
      ),
    ),
    None => (
      chapter_author,
      NotificationContent::new_comment(
        comment.chapter_id,
        comment.comment_id,
        &comment.author_name,
        chapter_title,
      ),
    ),
  };
  (recipient != comment.author_id).then_some((recipient, content))
}

// ─── Threads ─────────────────────────────────────────────────────────────────

/// A comment with its replies nested beneath it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
  #[serde(flatten)]
  pub comment:   Comment,
  pub can_reply: bool,
  pub replies:   Vec<CommentThread>,
}

/// Nest a chapter's comments into threads.
///
/// `flat` must be in insertion order, which guarantees every parent precedes
/// its replies. Roots and siblings keep that order. A comment whose parent is
/// missing from `flat` is promoted to a root.
///
/// Built bottom-up without recursion, since thread depth is unbounded.
pub fn build_threads(flat: Vec<Comment>) -> Vec<CommentThread> {
  let known: HashSet<Uuid> = flat.iter().map(|c| c.comment_id).collect();
  let mut children: HashMap<Uuid, Vec<CommentThread>> = HashMap::new();
  let mut roots = Vec::new();

  for comment in flat.into_iter().rev() {
    let mut replies = children.remove(&comment.comment_id).unwrap_or_default();
    replies.reverse();
    let node = CommentThread {
      can_reply: comment.depth <= MAX_REPLY_DEPTH,
      comment,
      replies,
    };
    match node.comment.parent_id.filter(|p| known.contains(p)) {
      Some(parent) => children.entry(parent).or_default().push(node),
      None => roots.push(node),
    }
  }

  roots.reverse();
  roots
}
