//! Handlers for `/chapters` and `/dashboard/chapters`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/chapters` | Published only. `?page=&q=&sort=&range=` |
//! | `GET`    | `/dashboard/chapters` | Admin. Adds `?status=draft,published` |
//! | `POST`   | `/chapters` | Admin |
//! | `GET`    | `/chapters/{id-or-slug}` | ETag / `If-None-Match` |
//! | `PATCH`  | `/chapters/{id}` | Chapter author or admin |
//! | `DELETE` | `/chapters/{id}` | Chapter author or admin |
//! | `PUT`    | `/chapters/{id}/characters/{character_id}` | Body: `{"appearanceType":"POV"}` |
//! | `DELETE` | `/chapters/{id}/characters/{character_id}` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::{HeaderMap, StatusCode},
  response::{IntoResponse, Response},
};
use folio_core::{
  chapter::{
    Chapter, ChapterCounts, ChapterPatch, ChapterStatus,
    ChapterSummary, Neighbors, NewChapter, ViewerState,
  },
  character::{Appearance, AppearanceType, AppearingCharacter},
  identity::Identity,
  notification::NotificationContent,
  pagination::{CHAPTER_PAGE_SIZE, Page, PageRequest},
  ranking::{DateRange, SortOrder},
  store::{ChapterQuery, ReadingStore, validate_query_text},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  auth::{Authenticated, Viewer},
  error::ApiError,
  etag::json_with_etag,
  notifications::broadcast,
  parse_page,
};

// ─── Lookup helpers ──────────────────────────────────────────────────────────

/// Fetch a chapter the viewer is allowed to see. Unpublished chapters are
/// reported as missing to everyone but their author and admins.
pub(crate) async fn visible_chapter<S: ReadingStore>(
  store: &S,
  chapter_id: Uuid,
  viewer: Viewer,
) -> Result<Chapter, ApiError> {
  store
    .get_chapter(chapter_id)
    .await
    .map_err(ApiError::from_store)?
    .filter(|c| c.is_published() || viewer.can_manage(c.author_id))
    .ok_or_else(ApiError::chapter_not_found)
}

/// Fetch a chapter the caller may edit: 404 if missing, 403 if not theirs.
async fn managed_chapter<S: ReadingStore>(
  store: &S,
  chapter_id: Uuid,
  identity: Identity,
) -> Result<Chapter, ApiError> {
  let chapter = store
    .get_chapter(chapter_id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(ApiError::chapter_not_found)?;
  if !identity.owns_or_admin(chapter.author_id) {
    return Err(ApiError::Forbidden("only the chapter's author may do that".into()));
  }
  Ok(chapter)
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub page:   Option<String>,
  pub q:      Option<String>,
  pub sort:   Option<String>,
  pub range:  Option<String>,
  /// Comma-separated; dashboard only.
  pub status: Option<String>,
}

impl ListParams {
  fn into_query(self, statuses: Option<Vec<ChapterStatus>>) -> Result<ChapterQuery, ApiError> {
    let text = self.q.filter(|q| !q.trim().is_empty());
    validate_query_text(text.as_deref())?;
    Ok(ChapterQuery {
      page: PageRequest::new(parse_page(self.page.as_deref()), CHAPTER_PAGE_SIZE),
      text,
      sort: SortOrder::parse_or_default(self.sort.as_deref()),
      range: DateRange::parse_or_default(self.range.as_deref()),
      statuses,
      as_of: None,
    })
  }
}

/// `None` (every status) when the filter is absent, empty or `all`; otherwise
/// the recognised statuses, which may be none at all.
pub fn parse_statuses(raw: Option<&str>) -> Option<Vec<ChapterStatus>> {
  let raw = raw.map(str::trim).filter(|s| !s.is_empty() && *s != "all")?;
  let mut statuses = Vec::new();
  for status in raw.split(',').filter_map(|s| ChapterStatus::parse(s.trim())) {
    if !statuses.contains(&status) {
      statuses.push(status);
    }
  }
  Some(statuses)
}

/// `GET /chapters`
pub async fn list<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<ChapterSummary>>, ApiError> {
  let query = params.into_query(Some(vec![ChapterStatus::Published]))?;
  let page = store.list_chapters(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(page))
}

/// `GET /dashboard/chapters`
pub async fn dashboard<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  auth: Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<ChapterSummary>>, ApiError> {
  auth.require_admin()?;
  let statuses = parse_statuses(params.status.as_deref());
  let query = params.into_query(statuses)?;
  let page = store.list_chapters(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(page))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:   String,
  pub content: String,
  pub order:   i64,
  #[serde(default)]
  pub status:  ChapterStatus,
}

/// `POST /chapters`
pub async fn create<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  auth: Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  auth.require_admin()?;
  let chapter = store
    .create_chapter(NewChapter {
      author_id: auth.0.user_id,
      order:     body.order,
      title:     body.title,
      content:   body.content,
      status:    body.status,
    })
    .await
    .map_err(ApiError::from_store)?;

  if chapter.is_published() {
    announce(store.as_ref(), &chapter).await;
  }
  Ok((StatusCode::CREATED, Json(chapter)))
}

async fn announce<S: ReadingStore>(store: &S, chapter: &Chapter) {
  let content = NotificationContent::new_chapter(chapter.chapter_id, &chapter.title);
  broadcast(store, chapter.author_id, content).await;
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// A chapter with everything the reader view shows alongside it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDetail {
  #[serde(flatten)]
  pub chapter:    Chapter,
  pub counts:     ChapterCounts,
  /// Absent for anonymous viewers.
  pub viewer:     Option<ViewerState>,
  #[serde(flatten)]
  pub neighbors:  Neighbors,
  pub characters: Vec<AppearingCharacter>,
}

/// `GET /chapters/{id-or-slug}`
pub async fn get_one<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Path(key): Path<String>,
  headers: HeaderMap,
) -> Result<Response, ApiError> {
  let by_id = match Uuid::parse_str(&key) {
    Ok(id) => store.get_chapter(id).await.map_err(ApiError::from_store)?,
    Err(_) => None,
  };
  // A slug may itself look like a UUID.
  let found = match by_id {
    Some(chapter) => Some(chapter),
    None => store.get_chapter_by_slug(key).await.map_err(ApiError::from_store)?,
  };

  let chapter = found
    .filter(|c| c.is_published() || viewer.can_manage(c.author_id))
    .ok_or_else(ApiError::chapter_not_found)?;
  let id = chapter.chapter_id;

  let counts = store.chapter_counts(id).await.map_err(ApiError::from_store)?;
  let viewer_state = match viewer.0 {
    Some(identity) => Some(
      store
        .viewer_state(id, identity.user_id)
        .await
        .map_err(ApiError::from_store)?,
    ),
    None => None,
  };
  let neighbors = store.neighbors(chapter.order).await.map_err(ApiError::from_store)?;
  let characters = store
    .chapter_characters(id, viewer.is_admin())
    .await
    .map_err(ApiError::from_store)?;

  json_with_etag(&headers, &ChapterDetail {
    chapter,
    counts,
    viewer: viewer_state,
    neighbors,
    characters,
  })
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
  pub title:   Option<String>,
  pub content: Option<String>,
  pub order:   Option<i64>,
  pub status:  Option<ChapterStatus>,
}

/// `PATCH /chapters/{id}`
pub async fn update<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Chapter>, ApiError> {
  managed_chapter(store.as_ref(), id, identity).await?;

  let update = store
    .update_chapter(id, ChapterPatch {
      title:   body.title,
      content: body.content,
      order:   body.order,
      status:  body.status,
    })
    .await
    .map_err(ApiError::from_store)?;

  if update.newly_published {
    announce(store.as_ref(), &update.chapter).await;
  }
  Ok(Json(update.chapter))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /chapters/{id}`
pub async fn delete<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  managed_chapter(store.as_ref(), id, identity).await?;
  store.delete_chapter(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Appearances ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearanceBody {
  pub appearance_type: AppearanceType,
}

/// `PUT /chapters/{id}/characters/{character_id}`
pub async fn set_appearance<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path((id, character_id)): Path<(Uuid, Uuid)>,
  Json(body): Json<AppearanceBody>,
) -> Result<Json<Appearance>, ApiError> {
  managed_chapter(store.as_ref(), id, identity).await?;
  let appearance = store
    .set_appearance(id, character_id, body.appearance_type)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(appearance))
}

/// `DELETE /chapters/{id}/characters/{character_id}`
pub async fn remove_appearance<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path((id, character_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
  managed_chapter(store.as_ref(), id, identity).await?;
  let removed = store
    .remove_appearance(id, character_id)
    .await
    .map_err(ApiError::from_store)?;
  if removed {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound("character does not appear in this chapter".into()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_filter_parsing() {
    assert_eq!(parse_statuses(None), None);
    assert_eq!(parse_statuses(Some("")), None);
    assert_eq!(parse_statuses(Some("all")), None);
    assert_eq!(
      parse_statuses(Some("draft, published")),
      Some(vec![ChapterStatus::Draft, ChapterStatus::Published])
    );
    // Unrecognised values filter everything out rather than erroring.
    assert_eq!(parse_statuses(Some("bogus")), Some(vec![]));
    assert_eq!(
      parse_statuses(Some("draft,published,draft")),
      Some(vec![ChapterStatus::Draft, ChapterStatus::Published])
    );
  }

  #[test]
  fn list_params_default_and_validate() {
    let query = ListParams::default().into_query(None).unwrap();
    assert_eq!(query.page.page, 1);
    assert_eq!(query.page.limit, CHAPTER_PAGE_SIZE);
    assert_eq!(query.sort, SortOrder::Newest);

    let query = ListParams {
      page: Some("-4".into()),
      sort: Some("sideways".into()),
      ..Default::default()
    }
    .into_query(None)
    .unwrap();
    assert_eq!(query.page.page, 1);
    assert_eq!(query.sort, SortOrder::Newest);

    let long = ListParams { q: Some("x".repeat(128)), ..Default::default() };
    assert!(matches!(long.into_query(None), Err(ApiError::BadRequest(_))));
  }
}
