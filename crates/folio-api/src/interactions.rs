//! Reads and chapter favorites, and the caller's favorites lists.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/chapters/{id}/read` | `{"recorded": bool}` |
//! | `DELETE` | `/chapters/{id}/read` | |
//! | `POST`   | `/chapters/{id}/favorite` | 409 until the chapter has been read |
//! | `DELETE` | `/chapters/{id}/favorite` | |
//! | `GET`    | `/me/favorites/chapters` | `?page=` |
//! | `GET`    | `/me/favorites/characters` | `?page=` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use folio_core::{
  chapter::ChapterSummary,
  character::CharacterSummary,
  interaction::FavoriteOutcome,
  notification::NotificationContent,
  pagination::{CHAPTER_PAGE_SIZE, CHARACTER_PAGE_SIZE, Page, PageRequest},
  store::ReadingStore,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  auth::{Authenticated, Viewer},
  chapters::visible_chapter,
  error::ApiError,
  notifications::deliver,
  parse_page,
};

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `POST /chapters/{id}/read`
pub async fn mark_read<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  visible_chapter(store.as_ref(), id, Viewer(Some(identity))).await?;
  let recorded = store
    .record_read(id, identity.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "recorded": recorded })))
}

/// `DELETE /chapters/{id}/read`
pub async fn unmark_read<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store
    .remove_read(id, identity.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Favorites ───────────────────────────────────────────────────────────────

/// `POST /chapters/{id}/favorite`
pub async fn favorite<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  let chapter = visible_chapter(store.as_ref(), id, Viewer(Some(identity))).await?;
  let outcome = store
    .favorite_chapter(id, identity.user_id)
    .await
    .map_err(ApiError::from_store)?;

  if outcome == FavoriteOutcome::Favorited && chapter.author_id != identity.user_id {
    let reader = match store.get_user(identity.user_id).await {
      Ok(Some(user)) => user.username,
      _ => "A reader".to_owned(),
    };
    let content = NotificationContent::new_favorite(id, &reader, &chapter.title);
    deliver(store.as_ref(), chapter.author_id, content).await;
  }

  Ok(Json(json!({ "status": outcome })))
}

/// `DELETE /chapters/{id}/favorite`
pub async fn unfavorite<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store
    .unfavorite_chapter(id, identity.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── My favorites ────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub page: Option<String>,
}

/// `GET /me/favorites/chapters`
pub async fn my_chapters<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<ChapterSummary>>, ApiError> {
  let request = PageRequest::new(parse_page(params.page.as_deref()), CHAPTER_PAGE_SIZE);
  let page = store
    .favorite_chapters(identity.user_id, request)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(page))
}

/// `GET /me/favorites/characters`
pub async fn my_characters<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<CharacterSummary>>, ApiError> {
  let request = PageRequest::new(parse_page(params.page.as_deref()), CHARACTER_PAGE_SIZE);
  let page = store
    .favorite_characters(identity.user_id, request)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(page))
}
