//! Characters (the wiki entries) and their appearances in chapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MAX_NAME_LEN: usize = 120;

// ─── Character ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
  pub character_id: Uuid,
  pub name:         String,
  pub slug:         String,
  /// One-line teaser shown in listings.
  pub summary:      String,
  pub biography:    String,
  /// Externally hosted portrait.
  pub image_url:    Option<String>,
  pub is_published: bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCharacter {
  pub name:         String,
  pub summary:      String,
  pub biography:    String,
  pub image_url:    Option<String>,
  pub is_published: bool,
}

impl NewCharacter {
  pub fn validate(&self) -> Result<()> { validate_name(&self.name) }
}

#[derive(Debug, Clone, Default)]
pub struct CharacterPatch {
  pub name:         Option<String>,
  pub summary:      Option<String>,
  pub biography:    Option<String>,
  /// `Some(None)` clears the portrait; `None` leaves it unchanged.
  pub image_url:    Option<Option<String>>,
  pub is_published: Option<bool>,
}

impl CharacterPatch {
  pub fn validate(&self) -> Result<()> {
    match &self.name {
      Some(name) => validate_name(name),
      None => Ok(()),
    }
  }
}

fn validate_name(name: &str) -> Result<()> {
  let len = name.trim().chars().count();
  if len == 0 || len > MAX_NAME_LEN {
    return Err(Error::Invalid(format!(
      "name must be 1-{MAX_NAME_LEN} characters"
    )));
  }
  Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterCounts {
  pub views:     u64,
  pub favorites: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSummary {
  pub character_id: Uuid,
  pub name:         String,
  pub slug:         String,
  pub summary:      String,
  pub image_url:    Option<String>,
  pub is_published: bool,
  pub created_at:   DateTime<Utc>,
  #[serde(flatten)]
  pub counts:       CharacterCounts,
}

/// Listing orders for the character wiki.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterSort {
  #[default]
  Name,
  Newest,
  MostViewed,
  MostFavorited,
}

impl CharacterSort {
  /// Unknown or missing values fall back to [`CharacterSort::Name`].
  pub fn parse_or_default(s: Option<&str>) -> Self {
    match s.map(str::trim) {
      Some("newest") => Self::Newest,
      Some("most_viewed") => Self::MostViewed,
      Some("most_favorited") => Self::MostFavorited,
      _ => Self::Name,
    }
  }
}

// ─── Appearances ─────────────────────────────────────────────────────────────

/// A character's role in a chapter. A chapter has at most one POV character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppearanceType {
  Pov,
  Appearance,
  Mention,
}

impl AppearanceType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pov => "POV",
      Self::Appearance => "APPEARANCE",
      Self::Mention => "MENTION",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "POV" => Some(Self::Pov),
      "APPEARANCE" => Some(Self::Appearance),
      "MENTION" => Some(Self::Mention),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appearance {
  pub chapter_id:      Uuid,
  pub character_id:    Uuid,
  pub appearance_type: AppearanceType,
}

/// A character as listed on a chapter page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearingCharacter {
  pub character_id:    Uuid,
  pub name:            String,
  pub slug:            String,
  pub image_url:       Option<String>,
  pub appearance_type: AppearanceType,
}

/// A chapter as listed on a character page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppearsIn {
  pub chapter_id:      Uuid,
  pub order:           i64,
  pub title:           String,
  pub slug:            String,
  pub appearance_type: AppearanceType,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn appearance_type_wire_names() {
    let json = serde_json::to_string(&AppearanceType::Pov).unwrap();
    assert_eq!(json, "\"POV\"");
    for t in [AppearanceType::Pov, AppearanceType::Appearance, AppearanceType::Mention] {
      assert_eq!(AppearanceType::parse(t.as_str()), Some(t));
    }
  }

  #[test]
  fn unknown_character_sort_defaults_to_name() {
    assert_eq!(CharacterSort::parse_or_default(Some("loudest")), CharacterSort::Name);
    assert_eq!(CharacterSort::parse_or_default(None), CharacterSort::Name);
    assert_eq!(
      CharacterSort::parse_or_default(Some("most_viewed")),
      CharacterSort::MostViewed
    );
  }
}
