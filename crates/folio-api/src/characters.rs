//! Handlers for the character wiki.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/characters` | `?page=&q=&sort=name\|newest\|most_viewed\|most_favorited` |
//! | `POST`   | `/characters` | Admin |
//! | `GET`    | `/characters/{id-or-slug}` | Unpublished entries are admin-only |
//! | `PATCH`  | `/characters/{id}` | Admin |
//! | `DELETE` | `/characters/{id}` | Admin |
//! | `POST`   | `/characters/{id}/view` | Idempotent per user |
//! | `POST`   | `/characters/{id}/favorite` | Idempotent |
//! | `DELETE` | `/characters/{id}/favorite` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use folio_core::{
  character::{
    AppearsIn, Character, CharacterCounts, CharacterPatch, CharacterSort,
    CharacterSummary, NewCharacter,
  },
  pagination::{CHARACTER_PAGE_SIZE, Page, PageRequest},
  store::{CharacterQuery, ReadingStore, validate_query_text},
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  auth::{Authenticated, Viewer},
  error::ApiError,
  parse_page,
};

async fn visible_character<S: ReadingStore>(
  store: &S,
  character_id: Uuid,
  viewer: Viewer,
) -> Result<Character, ApiError> {
  store
    .get_character(character_id)
    .await
    .map_err(ApiError::from_store)?
    .filter(|c| c.is_published || viewer.is_admin())
    .ok_or_else(ApiError::character_not_found)
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub page: Option<String>,
  pub q:    Option<String>,
  pub sort: Option<String>,
}

/// `GET /characters`
pub async fn list<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<CharacterSummary>>, ApiError> {
  let text = params.q.filter(|q| !q.trim().is_empty());
  validate_query_text(text.as_deref())?;

  let query = CharacterQuery {
    page: PageRequest::new(parse_page(params.page.as_deref()), CHARACTER_PAGE_SIZE),
    text,
    sort: CharacterSort::parse_or_default(params.sort.as_deref()),
    include_unpublished: viewer.is_admin(),
  };
  let page = store.list_characters(&query).await.map_err(ApiError::from_store)?;
  Ok(Json(page))
}

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub name:         String,
  #[serde(default)]
  pub summary:      String,
  #[serde(default)]
  pub biography:    String,
  pub image_url:    Option<String>,
  #[serde(default)]
  pub is_published: bool,
}

/// `POST /characters`
pub async fn create<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  auth: Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  auth.require_admin()?;
  let character = store
    .create_character(NewCharacter {
      name:         body.name,
      summary:      body.summary,
      biography:    body.biography,
      image_url:    body.image_url,
      is_published: body.is_published,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok((StatusCode::CREATED, Json(character)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterDetail {
  #[serde(flatten)]
  pub character:     Character,
  pub counts:        CharacterCounts,
  /// Absent for anonymous viewers.
  pub has_favorited: Option<bool>,
  pub chapters:      Vec<AppearsIn>,
}

/// `GET /characters/{id-or-slug}`
pub async fn get_one<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  viewer: Viewer,
  Path(key): Path<String>,
) -> Result<Json<CharacterDetail>, ApiError> {
  let by_id = match Uuid::parse_str(&key) {
    Ok(id) => store.get_character(id).await.map_err(ApiError::from_store)?,
    Err(_) => None,
  };
  let found = match by_id {
    Some(character) => Some(character),
    None => store.get_character_by_slug(key).await.map_err(ApiError::from_store)?,
  };

  let character = found
    .filter(|c| c.is_published || viewer.is_admin())
    .ok_or_else(ApiError::character_not_found)?;
  let id = character.character_id;

  let counts = store.character_counts(id).await.map_err(ApiError::from_store)?;
  let has_favorited = match viewer.0 {
    Some(identity) => Some(
      store
        .has_favorited_character(id, identity.user_id)
        .await
        .map_err(ApiError::from_store)?,
    ),
    None => None,
  };
  let chapters = store
    .character_chapters(id, viewer.is_admin())
    .await
    .map_err(ApiError::from_store)?;

  Ok(Json(CharacterDetail { character, counts, has_favorited, chapters }))
}

// ─── Update / delete ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
  pub name:         Option<String>,
  pub summary:      Option<String>,
  pub biography:    Option<String>,
  /// Absent leaves the portrait alone; `null` removes it.
  #[serde(default, deserialize_with = "present")]
  pub image_url:    Option<Option<String>>,
  pub is_published: Option<bool>,
}

/// Distinguish an explicit `null` from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

/// `PATCH /characters/{id}`
pub async fn update<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Character>, ApiError> {
  auth.require_admin()?;
  let character = store
    .update_character(id, CharacterPatch {
      name:         body.name,
      summary:      body.summary,
      biography:    body.biography,
      image_url:    body.image_url,
      is_published: body.is_published,
    })
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(character))
}

/// `DELETE /characters/{id}`
pub async fn delete<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  auth.require_admin()?;
  store.delete_character(id).await.map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Views & favorites ───────────────────────────────────────────────────────

/// `POST /characters/{id}/view`
pub async fn record_view<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  visible_character(store.as_ref(), id, Viewer(Some(auth.0))).await?;
  let recorded = store
    .record_character_view(id, auth.0.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "recorded": recorded })))
}

/// `POST /characters/{id}/favorite`
pub async fn favorite<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
  visible_character(store.as_ref(), id, Viewer(Some(auth.0))).await?;
  let outcome = store
    .favorite_character(id, auth.0.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "status": outcome })))
}

/// `DELETE /characters/{id}/favorite`
pub async fn unfavorite<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store
    .unfavorite_character(id, identity.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}
