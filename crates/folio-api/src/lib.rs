//! JSON REST API for Folio.
//!
//! Exposes an axum [`Router`] backed by any [`folio_core::store::ReadingStore`].
//! Identity comes from HTTP Basic credentials checked against the store; TLS
//! and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", folio_api::api_router(store.clone()))
//! ```

pub mod auth;
pub mod chapters;
pub mod characters;
pub mod comments;
pub mod error;
pub mod etag;
pub mod interactions;
pub mod notifications;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use folio_core::store::ReadingStore;

pub use error::ApiError;

/// Lenient page parsing: anything that is not an integer counts as missing.
pub(crate) fn parse_page(raw: Option<&str>) -> Option<i64> {
  raw.and_then(|p| p.trim().parse().ok())
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ReadingStore + 'static,
{
  Router::new()
    // Accounts
    .route("/users", post(users::register::<S>))
    .route("/me", get(users::me::<S>))
    .route("/me/favorites/chapters", get(interactions::my_chapters::<S>))
    .route("/me/favorites/characters", get(interactions::my_characters::<S>))
    // Chapters
    .route("/chapters", get(chapters::list::<S>).post(chapters::create::<S>))
    .route("/dashboard/chapters", get(chapters::dashboard::<S>))
    .route(
      "/chapters/{id}",
      get(chapters::get_one::<S>)
        .patch(chapters::update::<S>)
        .delete(chapters::delete::<S>),
    )
    .route(
      "/chapters/{id}/characters/{character_id}",
      put(chapters::set_appearance::<S>).delete(chapters::remove_appearance::<S>),
    )
    .route(
      "/chapters/{id}/read",
      post(interactions::mark_read::<S>).delete(interactions::unmark_read::<S>),
    )
    .route(
      "/chapters/{id}/favorite",
      post(interactions::favorite::<S>).delete(interactions::unfavorite::<S>),
    )
    // Comments
    .route(
      "/chapters/{id}/comments",
      get(comments::list::<S>).post(comments::create::<S>),
    )
    .route(
      "/comments/{id}",
      axum::routing::patch(comments::update::<S>).delete(comments::delete::<S>),
    )
    // Characters
    .route("/characters", get(characters::list::<S>).post(characters::create::<S>))
    .route(
      "/characters/{id}",
      get(characters::get_one::<S>)
        .patch(characters::update::<S>)
        .delete(characters::delete::<S>),
    )
    .route("/characters/{id}/view", post(characters::record_view::<S>))
    .route(
      "/characters/{id}/favorite",
      post(characters::favorite::<S>).delete(characters::unfavorite::<S>),
    )
    // Notifications
    .route("/notifications", get(notifications::list::<S>))
    .route("/notifications/read-all", post(notifications::mark_all_read::<S>))
    .route("/notifications/{id}/read", post(notifications::mark_read::<S>))
    .with_state(store)
}

// ─── Integration tests ───────────────────────────────────────────────────────
