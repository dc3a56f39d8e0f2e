//! Strong ETags for JSON resources and `If-None-Match` handling.
//!
//! The ETag is the SHA-256 of the exact response body, so it changes whenever
//! anything the client would see changes, including viewer-specific flags.

use axum::{
  body::Body,
  http::{HeaderMap, HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::ApiError;

/// Quoted hex SHA-256 of `body`.
pub fn compute_etag(body: &[u8]) -> String {
  let hash = Sha256::digest(body);
  format!("\"{}\"", hex::encode(hash))
}

/// Whether an `If-None-Match` header matches `etag`. Accepts `*`, lists,
/// weak validators and bare (unquoted) tags.
pub fn if_none_match(headers: &HeaderMap, etag: &str) -> bool {
  let bare = etag.trim_matches('"');
  headers
    .get_all(header::IF_NONE_MATCH)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(','))
    .map(|tag| tag.trim().trim_start_matches("W/").trim_matches('"'))
    .any(|tag| tag == "*" || tag == bare)
}

/// Serialize `value` as JSON with an ETag, or answer 304 when the client's
/// copy is current.
pub fn json_with_etag<T: Serialize>(headers: &HeaderMap, value: &T) -> Result<Response, ApiError> {
  let body = serde_json::to_vec(value).map_err(|e| ApiError::Store(Box::new(e)))?;
  let etag = compute_etag(&body);
  let etag_value =
    HeaderValue::from_str(&etag).map_err(|e| ApiError::Store(Box::new(e)))?;

  if if_none_match(headers, &etag) {
    return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag_value)]).into_response());
  }

  Ok(
    (
      StatusCode::OK,
      [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
        (header::ETAG, etag_value),
      ],
      Body::from(body),
    )
      .into_response(),
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn with_inm(value: &str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(header::IF_NONE_MATCH, HeaderValue::from_str(value).unwrap());
    h
  }

  #[test]
  fn same_body_same_etag() {
    assert_eq!(compute_etag(b"{\"a\":1}"), compute_etag(b"{\"a\":1}"));
    assert_ne!(compute_etag(b"{\"a\":1}"), compute_etag(b"{\"a\":2}"));
  }

  #[test]
  fn if_none_match_forms() {
    let etag = compute_etag(b"x");
    let bare = etag.trim_matches('"').to_owned();

    assert!(if_none_match(&with_inm(&etag), &etag));
    assert!(if_none_match(&with_inm(&bare), &etag));
    assert!(if_none_match(&with_inm(&format!("W/{etag}")), &etag));
    assert!(if_none_match(&with_inm(&format!("\"other\", {etag}")), &etag));
    assert!(if_none_match(&with_inm("*"), &etag));
    assert!(!if_none_match(&with_inm("\"stale\""), &etag));
    assert!(!if_none_match(&HeaderMap::new(), &etag));
  }

  #[test]
  fn not_modified_has_no_body() {
    let value = serde_json::json!({ "title": "One" });
    let first = json_with_etag(&HeaderMap::new(), &value).unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let etag = first.headers()[header::ETAG].to_str().unwrap().to_owned();

    let second = json_with_etag(&with_inm(&etag), &value).unwrap();
    assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
  }
}
