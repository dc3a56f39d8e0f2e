//! Registration and the caller's own account.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use folio_core::{
  identity::{MIN_PASSWORD_LEN, NewUser, User, validate_username},
  store::ReadingStore,
};
use serde::Deserialize;

use crate::{
  auth::{Authenticated, hash_password},
  error::ApiError,
};

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username: String,
  pub password: String,
}

/// `POST /users`
pub async fn register<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
  validate_username(&body.username)?;
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let user = store
    .create_user(NewUser {
      username:      body.username,
      password_hash: hash_password(&body.password)?,
      is_admin:      false,
    })
    .await
    .map_err(ApiError::from_store)?;

  tracing::info!(user_id = %user.user_id, username = %user.username, "user registered");
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /me`
pub async fn me<S: ReadingStore + 'static>(
  State(store): State<Arc<S>>,
  Authenticated(identity): Authenticated,
) -> Result<Json<User>, ApiError> {
  store
    .get_user(identity.user_id)
    .await
    .map_err(ApiError::from_store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("user not found".into()))
}
