//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use folio_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error through the domain error it converts into.
  pub fn from_store<E: Into<CoreError>>(e: E) -> Self { Self::from(e.into()) }

  pub fn chapter_not_found() -> Self { Self::NotFound("chapter not found".into()) }

  pub fn character_not_found() -> Self {
    Self::NotFound("character not found".into())
  }
}

impl From<CoreError> for ApiError {
  fn from(e: CoreError) -> Self {
    match e {
      CoreError::ChapterNotFound(_)
      | CoreError::CharacterNotFound(_)
      | CoreError::CommentNotFound(_)
      | CoreError::NotificationNotFound(_)
      | CoreError::UserNotFound(_) => ApiError::NotFound(e.to_string()),

      CoreError::OrderTaken(_)
      | CoreError::PovTaken(_)
      | CoreError::MustReadFirst(_)
      | CoreError::UsernameTaken(_) => ApiError::Conflict(e.to_string()),

      CoreError::ParentMismatch { .. } | CoreError::Invalid(_) => {
        ApiError::BadRequest(e.to_string())
      }

      CoreError::Storage(e) => ApiError::Store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_owned()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
      }
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"folio\""),
      );
    }
    res
  }
}
