//! HTTP server composition for Folio.
//!
//! Mounts the JSON API from `folio-api` under `/api`, serves the Atom feed at
//! `/feed.xml`, and provides the configuration and admin bootstrap used by the
//! `folio-server` binary.

pub mod error;
pub mod feed;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use argon2::PasswordHash;
use axum::{Router, routing::get};
use folio_core::{identity::NewUser, store::ReadingStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FOLIO_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub base_url:            String,
  pub store_path:          PathBuf,
  pub site_title:          String,
  pub admin_username:      Option<String>,
  /// Argon2 PHC string, as printed by `folio-server --hash-password`.
  pub admin_password_hash: Option<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                "127.0.0.1".into(),
      port:                8080,
      base_url:            "http://localhost:8080".into(),
      store_path:          PathBuf::from("~/.local/share/folio/folio.db"),
      site_title:          "Folio".into(),
      admin_username:      None,
      admin_password_hash: None,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// State for the server-level routes. The API router carries its own
/// `Arc<S>` state.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), config: self.config.clone() }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the top-level axum [`Router`].
pub fn router<S: ReadingStore + 'static>(state: AppState<S>) -> Router {
  let api = folio_api::api_router(state.store.clone());

  Router::new()
    .route("/feed.xml", get(feed::handler::<S>))
    .with_state(state)
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Admin bootstrap ──────────────────────────────────────────────────────────

/// Ensure the configured admin account exists. Does nothing when no admin is
/// configured or the username is already registered.
pub async fn bootstrap_admin<S: ReadingStore>(
  store: &S,
  config: &ServerConfig,
) -> Result<(), Error> {
  let (Some(username), Some(hash)) =
    (&config.admin_username, &config.admin_password_hash)
  else {
    tracing::debug!("no admin configured");
    return Ok(());
  };

  PasswordHash::new(hash)
    .map_err(|e| Error::AdminHash(e.to_string()))?;

  let existing = store
    .find_credentials(username.clone())
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  match existing {
    Some(creds) if creds.user.is_admin => {
      tracing::debug!(%username, "admin account present");
    }
    Some(_) => {
      tracing::warn!(%username, "configured admin exists but is not an admin");
    }
    None => {
      let user = store
        .create_user(NewUser {
          username:      username.clone(),
          password_hash: hash.clone(),
          is_admin:      true,
        })
        .await
        .map_err(|e| Error::Store(Box::new(e)))?;
      tracing::info!(user_id = %user.user_id, %username, "created admin account");
    }
  }
  Ok(())
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use folio_api::auth::hash_password;
  use folio_core::chapter::{ChapterStatus, NewChapter};
  use folio_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  fn config() -> ServerConfig {
    ServerConfig {
      base_url: "https://folio.example".into(),
      site_title: "The Long Road".into(),
      admin_username: Some("editor".into()),
      admin_password_hash: Some(hash_password("editor-password").unwrap()),
      ..Default::default()
    }
  }

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let config = config();
    bootstrap_admin(&store, &config).await.unwrap();
    AppState { store: Arc::new(store), config: Arc::new(config) }
  }

  async fn get(state: &AppState<SqliteStore>, uri: &str, auth: Option<&str>) -> Response {
    let mut builder = Request::builder().uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, format!("Basic {}", B64.encode(auth)));
    }
    router(state.clone())
      .oneshot(builder.body(Body::empty()).unwrap())
      .await
      .unwrap()
  }

  async fn body_string(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  #[tokio::test]
  async fn bootstrap_is_idempotent() {
    let state = make_state().await;
    bootstrap_admin(state.store.as_ref(), &state.config).await.unwrap();

    let creds = state
      .store
      .find_credentials("editor".into())
      .await
      .unwrap()
      .unwrap();
    assert!(creds.user.is_admin);
  }

  #[tokio::test]
  async fn bootstrap_rejects_malformed_hash() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let config = ServerConfig {
      admin_username: Some("editor".into()),
      admin_password_hash: Some("hunter2".into()),
      ..Default::default()
    };
    assert!(matches!(bootstrap_admin(&store, &config).await, Err(Error::AdminHash(_))));
  }

  #[tokio::test]
  async fn api_is_mounted_with_admin_credentials() {
    let state = make_state().await;
    let resp = get(&state, "/api/me", Some("editor:editor-password")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_string(resp).await.contains("\"isAdmin\":true"));

    let resp = get(&state, "/api/chapters", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn feed_lists_published_chapters_only() {
    let state = make_state().await;
    let admin = state
      .store
      .find_credentials("editor".into())
      .await
      .unwrap()
      .unwrap()
      .user;

    for (order, title, status) in [
      (1, "Departure", ChapterStatus::Published),
      (2, "Unfinished Business", ChapterStatus::Draft),
    ] {
      state
        .store
        .create_chapter(NewChapter {
          author_id: admin.user_id,
          order,
          title: title.into(),
          content: "The road went on.".into(),
          status,
        })
        .await
        .unwrap();
    }

    let resp = get(&state, "/feed.xml", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ct = resp.headers().get(header::CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(ct.starts_with("application/atom+xml"), "Content-Type: {ct}");

    let xml = body_string(resp).await;
    assert!(xml.contains("<title>The Long Road</title>"), "{xml}");
    assert!(xml.contains("https://folio.example/chapters/departure"), "{xml}");
    assert!(!xml.contains("Unfinished Business"), "{xml}");
  }
}
