//! Users and the request-scoped identity resolved from their credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who is making a request. Handlers receive `Option<Identity>`; there is no
/// ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
  pub user_id:  Uuid,
  pub is_admin: bool,
}

impl Identity {
  /// Whether this identity may moderate content owned by `owner_id`.
  pub fn owns_or_admin(&self, owner_id: Uuid) -> bool {
    self.is_admin || self.user_id == owner_id
  }
}

/// A registered account. The password hash never leaves the store layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub is_admin:   bool,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn identity(&self) -> Identity {
    Identity { user_id: self.user_id, is_admin: self.is_admin }
  }
}

/// A user row together with its argon2 PHC string, for credential checks.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: String,
}

/// Input to [`crate::store::ReadingStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub password_hash: String,
  pub is_admin:      bool,
}

/// Usernames are 3–32 characters of ASCII letters, digits, `_` or `-`.
pub fn validate_username(username: &str) -> crate::Result<()> {
  let len_ok = (3..=32).contains(&username.len());
  let chars_ok = username
    .chars()
    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
  if len_ok && chars_ok {
    Ok(())
  } else {
    Err(crate::Error::Invalid(format!(
      "username must be 3-32 characters of letters, digits, '_' or '-': {username:?}"
    )))
  }
}

pub const MIN_PASSWORD_LEN: usize = 8;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn admin_can_moderate_anything() {
    let admin = Identity { user_id: Uuid::new_v4(), is_admin: true };
    assert!(admin.owns_or_admin(Uuid::new_v4()));
  }

  #[test]
  fn reader_only_owns_their_own() {
    let me = Identity { user_id: Uuid::new_v4(), is_admin: false };
    assert!(me.owns_or_admin(me.user_id));
    assert!(!me.owns_or_admin(Uuid::new_v4()));
  }

  #[test]
  fn username_rules() {
    assert!(validate_username("ada_l").is_ok());
    assert!(validate_username("ab").is_err());
    assert!(validate_username("has space").is_err());
    assert!(validate_username(&"x".repeat(33)).is_err());
  }
}
