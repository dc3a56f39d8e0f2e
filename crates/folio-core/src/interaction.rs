//! Reader interactions: reads, favorites and character views.
//!
//! Each record is unique per (resource, user); writing one twice is a no-op
//! that reports the existing state instead of failing.

use serde::{Deserialize, Serialize};

/// Outcome of a favorite request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FavoriteOutcome {
  Favorited,
  AlreadyFavorited,
}

impl FavoriteOutcome {
  pub fn from_inserted(inserted: bool) -> Self {
    if inserted { Self::Favorited } else { Self::AlreadyFavorited }
  }
}
