//! Handlers for `/notifications`, plus the fire-and-forget delivery helpers
//! other handlers use.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/notifications` | `?page=`, `?unread=true`; includes `unreadCount` |
//! | `POST` | `/notifications/{id}/read` | 404 unless the caller owns it |
//! | `POST` | `/notifications/read-all` | |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use folio_core::{
  notification::{Notification, NotificationContent},
  pagination::{NOTIFICATION_PAGE_SIZE, Page, PageRequest},
  store::ReadingStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{auth::Authenticated, error::ApiError, parse_page};

// ─── Delivery ────────────────────────────────────────────────────────────────

/// Send one notification. Failures are logged and never reach the caller.
pub(crate) async fn deliver<S: ReadingStore>(
  store: &S,
  recipient: Uuid,
  content: NotificationContent,
) {
  let kind = content.kind;
  if let Err(e) = store.notify(recipient, content).await {
    tracing::warn!(%recipient, ?kind, error = %e, "failed to deliver notification");
  }
}

/// Send a notification to everyone except `except`. Failures are logged.
pub(crate) async fn broadcast<S: ReadingStore>(
  store: &S,
  except: Uuid,
  content: NotificationContent,
) {
  let kind = content.kind;
  match store.notify_all(except, content).await {
    Ok(sent) => tracing::info!(?kind, sent, "broadcast notification"),
    Err(e) => tracing::warn!(?kind, error = %e, "failed to broadcast notification"),
  }
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub page:   Option<String>,
  pub unread: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
  #[serde(flatten)]
  pub page:         Page<Notification>,
  pub unread_count: u64,
}

/// `GET /notifications[?page=&unread=true]`
pub async fn list<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<NotificationPage>, ApiError> {
  let request = PageRequest::new(parse_page(params.page.as_deref()), NOTIFICATION_PAGE_SIZE);
  let page = store
    .list_notifications(identity.user_id, params.unread.unwrap_or(false), request)
    .await
    .map_err(ApiError::from_store)?;
  let unread_count = store
    .unread_count(identity.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(NotificationPage { page, unread_count }))
}

// ─── Mark read ───────────────────────────────────────────────────────────────

/// `POST /notifications/{id}/read`
pub async fn mark_read<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  store
    .mark_notification_read(identity.user_id, id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /notifications/read-all`
pub async fn mark_all_read<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
) -> Result<Json<Value>, ApiError> {
  let updated = store
    .mark_all_read(identity.user_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(json!({ "updated": updated })))
}
