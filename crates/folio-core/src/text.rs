//! Small text helpers shared by chapters and characters: slugs, word counts
//! and excerpts.

/// Lowercase ASCII slug: alphanumerics kept, every other run of characters
/// collapsed into a single `-`. Falls back to `"untitled"` when nothing
/// survives.
pub fn slugify(input: &str) -> String {
  let mut slug = String::with_capacity(input.len());
  let mut pending_dash = false;

  for c in input.chars() {
    if c.is_ascii_alphanumeric() {
      if pending_dash && !slug.is_empty() {
        slug.push('-');
      }
      pending_dash = false;
      slug.push(c.to_ascii_lowercase());
    } else if c == '\'' || c == '\u{2019}' {
      // "Ada's" -> "adas"
    } else {
      pending_dash = true;
    }
  }

  if slug.is_empty() { "untitled".to_owned() } else { slug }
}

/// The `n`th candidate for a slug collision: `base`, `base-2`, `base-3`, ...
pub fn slug_candidate(base: &str, n: u32) -> String {
  if n <= 1 { base.to_owned() } else { format!("{base}-{n}") }
}

/// Whitespace-delimited word count.
pub fn word_count(content: &str) -> u32 {
  content.split_whitespace().count().try_into().unwrap_or(u32::MAX)
}

/// At most `max_chars` characters of `content`, cut at a word boundary and
/// suffixed with an ellipsis when shortened.
pub fn excerpt(content: &str, max_chars: usize) -> String {
  let trimmed = content.trim();
  if trimmed.chars().count() <= max_chars {
    return trimmed.to_owned();
  }

  let cut: String = trimmed.chars().take(max_chars).collect();
  let cut = match cut.rfind(char::is_whitespace) {
    Some(pos) if pos > 0 => &cut[..pos],
    _ => cut.as_str(),
  };
  format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn slugify_collapses_punctuation() {
    assert_eq!(slugify("Chapter 1: The Storm!"), "chapter-1-the-storm");
    assert_eq!(slugify("  --Ada's  Return-- "), "adas-return");
  }

  #[test]
  fn slugify_empty_falls_back() {
    assert_eq!(slugify("¿¡!"), "untitled");
  }

  #[test]
  fn slug_candidates_are_numbered_from_two() {
    assert_eq!(slug_candidate("storm", 1), "storm");
    assert_eq!(slug_candidate("storm", 2), "storm-2");
  }

  #[test]
  fn word_count_ignores_extra_whitespace() {
    assert_eq!(word_count("  one two\n\nthree\tfour "), 4);
    assert_eq!(word_count(""), 0);
  }

  #[test]
  fn excerpt_cuts_on_word_boundary() {
    assert_eq!(excerpt("short", 10), "short");
    assert_eq!(excerpt("the quick brown fox", 12), "the quick…");
  }
}
