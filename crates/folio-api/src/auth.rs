//! Identity resolution from HTTP Basic credentials.
//!
//! Handlers never look at headers themselves: they take a [`Viewer`] (anyone,
//! possibly anonymous) or an [`Authenticated`] (a verified user) and receive an
//! explicit [`Identity`].

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use folio_core::{identity::Identity, store::ReadingStore};
use rand_core::OsRng;

use crate::error::ApiError;

/// The caller's identity, if they sent credentials. Credentials that are sent
/// but do not verify are rejected rather than treated as anonymous.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<Identity>);

impl Viewer {
  pub fn is_admin(&self) -> bool { self.0.is_some_and(|i| i.is_admin) }

  /// Whether the viewer may see unpublished content owned by `owner_id`.
  pub fn can_manage(&self, owner_id: uuid::Uuid) -> bool {
    self.0.is_some_and(|i| i.owns_or_admin(owner_id))
  }
}

/// A verified caller. Extraction fails with 401 when credentials are missing.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Identity);

impl Authenticated {
  pub fn require_admin(&self) -> Result<(), ApiError> {
    if self.0.is_admin {
      Ok(())
    } else {
      Err(ApiError::Forbidden("administrator access required".into()))
    }
  }
}

/// Hash `password` into an argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))
}

/// Split a `Basic` authorization header into username and password.
fn basic_credentials(headers: &HeaderMap) -> Result<Option<(String, String)>, ApiError> {
  let Some(value) = headers.get(header::AUTHORIZATION) else {
    return Ok(None);
  };

  let encoded = value
    .to_str()
    .ok()
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| ApiError::Unauthorized)?;
  let creds   = String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok(Some((username.to_owned(), password.to_owned())))
}

/// Verify the request's credentials against the store.
pub async fn resolve_identity<S: ReadingStore>(
  headers: &HeaderMap,
  store: &S,
) -> Result<Option<Identity>, ApiError> {
  let Some((username, password)) = basic_credentials(headers)? else {
    return Ok(None);
  };

  let creds = store
    .find_credentials(username)
    .await
    .map_err(ApiError::from_store)?
    .ok_or(ApiError::Unauthorized)?;

  let parsed = PasswordHash::new(&creds.password_hash).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(Some(creds.user.identity()))
}

impl<S> FromRequestParts<Arc<S>> for Viewer
where
  S: ReadingStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    resolve_identity(&parts.headers, store.as_ref()).await.map(Viewer)
  }
}

impl<S> FromRequestParts<Arc<S>> for Authenticated
where
  S: ReadingStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    resolve_identity(&parts.headers, store.as_ref())
      .await?
      .map(Authenticated)
      .ok_or(ApiError::Unauthorized)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn missing_header_is_anonymous() {
    assert!(basic_credentials(&HeaderMap::new()).unwrap().is_none());
  }

  #[test]
  fn decodes_basic_credentials() {
    let value = format!("Basic {}", B64.encode("ada:pass:word"));
    let (user, pass) = basic_credentials(&headers(&value)).unwrap().unwrap();
    assert_eq!(user, "ada");
    assert_eq!(pass, "pass:word");
  }

  #[test]
  fn malformed_headers_are_rejected() {
    for value in ["Bearer abc", "Basic !!!not-base64!!!"] {
      assert!(matches!(
        basic_credentials(&headers(value)),
        Err(ApiError::Unauthorized)
      ));
    }
    let no_colon = format!("Basic {}", B64.encode("ada"));
    assert!(basic_credentials(&headers(&no_colon)).is_err());
  }

  #[test]
  fn hashes_verify() {
    let hash = hash_password("correct horse").unwrap();
    let parsed = PasswordHash::new(&hash).unwrap();
    assert!(Argon2::default().verify_password(b"correct horse", &parsed).is_ok());
    assert!(Argon2::default().verify_password(b"wrong", &parsed).is_err());
  }
}
