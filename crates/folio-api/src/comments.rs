//! Threaded chapter comments.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/chapters/{id}/comments` | Root threads, oldest first, `?page=` |
//! | `POST`   | `/chapters/{id}/comments` | Body: `{"content":"...","parentId":null}` |
//! | `PATCH`  | `/comments/{id}` | Comment author, chapter author or admin |
//! | `DELETE` | `/comments/{id}` | Same; removes the whole subtree |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use folio_core::{
  comment::{
    Comment, CommentThread, NewComment, build_threads, can_moderate,
    notification_for,
  },
  identity::Identity,
  pagination::{COMMENT_PAGE_SIZE, Page, PageRequest},
  store::ReadingStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  auth::{Authenticated, Viewer},
  chapters::visible_chapter,
  error::ApiError,
  interactions::PageParams,
  notifications::deliver,
  parse_page,
};

/// Load a comment and check the caller may moderate it.
async fn moderated_comment<S: ReadingStore>(
  store: &S,
  comment_id: Uuid,
  identity: Identity,
) -> Result<Comment, ApiError> {
  let comment = store
    .get_comment(comment_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound("comment not found".into()))?;
  let chapter = store
    .get_chapter(comment.chapter_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(ApiError::chapter_not_found)?;

  if !can_moderate(&identity, &comment, chapter.author_id) {
    return Err(ApiError::Forbidden(
      "only the comment's author or the chapter's author may do that".into(),
    ));
  }
  Ok(comment)
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /chapters/{id}/comments`
pub async fn list<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Path(id): Path<Uuid>,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<CommentThread>>, ApiError> {
  visible_chapter(store.as_ref(), id, viewer).await?;
  let flat = store.chapter_comments(id).await.map_err(ApiError::from_store)?;
  let request = PageRequest::new(parse_page(params.page.as_deref()), COMMENT_PAGE_SIZE);
  Ok(Json(Page::from_all(build_threads(flat), request)))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub content:   String,
  pub parent_id: Option<Uuid>,
}

/// `POST /chapters/{id}/comments`
pub async fn create<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let chapter = visible_chapter(store.as_ref(), id, Viewer(Some(identity))).await?;

  let comment = store
    .create_comment(NewComment {
      chapter_id: id,
      author_id:  identity.user_id,
      parent_id:  body.parent_id,
      content:    body.content,
    })
    .await
    .map_err(ApiError::from_store)?;

  let parent = match comment.parent_id {
    Some(parent_id) => found_parent(parent_id, store.get_comment(parent_id).await),
    None => None,
  };
  // A reply whose parent vanished in the meantime notifies nobody.
  if comment.parent_id.is_none() || parent.is_some() {
    if let Some((recipient, content)) =
      notification_for(&comment, parent.as_ref(), chapter.author_id, &chapter.title)
    {
      deliver(store.as_ref(), recipient, content).await;
    }
  }

  Ok((StatusCode::CREATED, Json(comment)))
}

/// The parent of a fresh reply, if it can still be loaded. Lookup failures
/// only cost the reply notification, so they are logged and dropped.
fn found_parent<E: std::fmt::Display>(
  parent_id: Uuid,
  lookup: Result<Option<Comment>, E>,
) -> Option<Comment> {
  match lookup {
    Ok(parent) => parent,
    Err(e) => {
      tracing::warn!(%parent_id, error = %e, "parent lookup failed; skipping reply notification");
      None
    }
  }
}

// ─── Update / delete ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub content: String,
}

/// `PATCH /comments/{id}`
pub async fn update<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Comment>, ApiError> {
  moderated_comment(store.as_ref(), id, identity).await?;
  let comment = store
    .update_comment(id, body.content)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(comment))
}

/// `DELETE /comments/{id}`
pub async fn delete<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  moderated_comment(store.as_ref(), id, identity).await?;
  store.delete_comment(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  #[test]
  fn failed_parent_lookup_skips_notification() {
    let parent_id = Uuid::new_v4();
    let lookup: Result<Option<Comment>, &str> = Err("connection closed");
    assert!(found_parent(parent_id, lookup).is_none());
  }

  #[test]
  fn loaded_parent_passes_through() {
    let parent = Comment {
      comment_id:  Uuid::new_v4(),
      chapter_id:  Uuid::new_v4(),
      author_id:   Uuid::new_v4(),
      author_name: "ada".into(),
      parent_id:   None,
      depth:       1,
      content:     "first".into(),
      created_at:  Utc::now(),
      updated_at:  Utc::now(),
    };
    let lookup: Result<Option<Comment>, &str> = Ok(Some(parent.clone()));
    let found = found_parent(parent.comment_id, lookup).unwrap();
    assert_eq!(found.comment_id, parent.comment_id);
  }
}
