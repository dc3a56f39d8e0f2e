//! Feed ordering: sort orders, date ranges and the engagement score behind
//! `popular` and `rising`.
//!
//! Scores are computed here, away from the store. A backend supplies raw
//! counts and publish timestamps; [`rank`] does the rest.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::chapter::ChapterSummary;

pub const READ_WEIGHT: f64 = 1.0;
pub const FAVORITE_WEIGHT: f64 = 2.0;
pub const COMMENT_WEIGHT: f64 = 3.0;

/// Time scale of the `rising` recency decay, in seconds (one week).
pub const DECAY_SECONDS: f64 = 604_800.0;

// ─── Sort order ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
  #[default]
  Newest,
  Oldest,
  AlphabeticalAsc,
  AlphabeticalDesc,
  MostComments,
  MostRead,
  MostFavorited,
  Longest,
  Shortest,
  Popular,
  Rising,
}

impl SortOrder {
  /// Unknown or missing values fall back to [`SortOrder::Newest`].
  pub fn parse_or_default(s: Option<&str>) -> Self {
    match s.map(str::trim) {
      Some("oldest") => Self::Oldest,
      Some("alphabetical_asc") => Self::AlphabeticalAsc,
      Some("alphabetical_desc") => Self::AlphabeticalDesc,
      Some("most_comments") => Self::MostComments,
      Some("most_read") => Self::MostRead,
      Some("most_favorited") => Self::MostFavorited,
      Some("longest") => Self::Longest,
      Some("shortest") => Self::Shortest,
      Some("popular") => Self::Popular,
      Some("rising") => Self::Rising,
      _ => Self::Newest,
    }
  }

  /// Whether this order needs a computed score rather than a column sort.
  pub fn is_scored(self) -> bool { matches!(self, Self::Popular | Self::Rising) }
}

// ─── Date range ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
  #[default]
  All,
  Day,
  Week,
  Month,
  Year,
}

impl DateRange {
  /// Unknown or missing values fall back to [`DateRange::All`].
  pub fn parse_or_default(s: Option<&str>) -> Self {
    match s.map(str::trim) {
      Some("day") => Self::Day,
      Some("week") => Self::Week,
      Some("month") => Self::Month,
      Some("year") => Self::Year,
      _ => Self::All,
    }
  }

  /// Lower bound on `published_at`, if any.
  pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let span = match self {
      Self::All => return None,
      Self::Day => Duration::days(1),
      Self::Week => Duration::weeks(1),
      Self::Month => Duration::days(30),
      Self::Year => Duration::days(365),
    };
    Some(now - span)
  }

  /// The range actually applied under `order`. `rising` already encodes
  /// recency, so it always sees every chapter.
  pub fn effective_for(self, order: SortOrder) -> Self {
    if order == SortOrder::Rising { Self::All } else { self }
  }
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

/// Weighted engagement: reads ×1, favorites ×2, comments ×3.
pub fn engagement(reads: u64, favorites: u64, comments: u64) -> f64 {
  reads as f64 * READ_WEIGHT
    + favorites as f64 * FAVORITE_WEIGHT
    + comments as f64 * COMMENT_WEIGHT
}

/// `1 + e^(-age / 1 week)`: 2.0 for a chapter published this instant, tending
/// to 1.0 as it ages. Unpublished chapters get no boost; future timestamps
/// are treated as age zero.
pub fn recency_factor(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
  let Some(published_at) = published_at else {
    return 1.0;
  };
  let age_seconds = ((now - published_at).num_milliseconds() as f64 / 1000.0).max(0.0);
  1.0 + (-age_seconds / DECAY_SECONDS).exp()
}

/// The ranking score of a chapter under `order`. Only `rising` applies the
/// recency decay; every other order gets the plain engagement score.
pub fn score(
  reads: u64,
  favorites: u64,
  comments: u64,
  published_at: Option<DateTime<Utc>>,
  now: DateTime<Utc>,
  order: SortOrder,
) -> f64 {
  let base = engagement(reads, favorites, comments);
  match order {
    SortOrder::Rising => base * recency_factor(published_at, now),
    _ => base,
  }
}

/// Sort chapters by score descending, then by `order` descending.
pub fn rank(chapters: &mut [ChapterSummary], order: SortOrder, now: DateTime<Utc>) {
  let score_of = |c: &ChapterSummary| {
    score(
      c.counts.reads,
      c.counts.favorites,
      c.counts.comments,
      c.published_at,
      now,
      order,
    )
  };
  chapters.sort_by(|a, b| {
    score_of(b)
      .total_cmp(&score_of(a))
      .then_with(|| b.order.cmp(&a.order))
  });
}
