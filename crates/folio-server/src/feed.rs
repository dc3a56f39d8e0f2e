//! Atom feed of recently published chapters.
//!
//! Generated with `quick-xml`'s writer API. Entry links point at the reader
//! view, `{base_url}/chapters/{slug}`.

use std::io::Cursor;

use axum::{
  extract::State,
  http::{HeaderValue, header},
  response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};
use folio_core::{chapter::Chapter, store::ReadingStore, text::excerpt};
use quick_xml::{
  Writer,
  events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::{AppState, error::Error};

pub const NS_ATOM: &str = "http://www.w3.org/2005/Atom";
pub const FEED_LENGTH: u32 = 20;
pub const SUMMARY_CHARS: usize = 280;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// `GET /feed.xml`
pub async fn handler<S: ReadingStore + 'static>(
  State(state): State<AppState<S>>,
) -> Result<Response, Error> {
  let chapters = state
    .store
    .recent_chapters(FEED_LENGTH)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  let body = render_atom(&state.config.site_title, &state.config.base_url, &chapters, Utc::now())?;

  let mut res = body.into_response();
  res.headers_mut().insert(
    header::CONTENT_TYPE,
    HeaderValue::from_static("application/atom+xml; charset=utf-8"),
  );
  Ok(res)
}

/// Render an Atom document for `chapters`, newest first. The feed's own
/// `updated` is the newest entry's, or `now` for an empty feed.
pub fn render_atom(
  site_title: &str,
  base_url: &str,
  chapters: &[Chapter],
  now: DateTime<Utc>,
) -> Result<Vec<u8>, Error> {
  let base = base_url.trim_end_matches('/');
  let mut w = Writer::new(Cursor::new(Vec::new()));

  w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
  let mut feed = BytesStart::new("feed");
  feed.push_attribute(("xmlns", NS_ATOM));
  w.write_event(Event::Start(feed))?;

  write_text_elem(&mut w, "title", site_title)?;
  write_text_elem(&mut w, "id", &format!("{base}/"))?;
  write_link(&mut w, &format!("{base}/feed.xml"), Some("self"))?;
  write_link(&mut w, &format!("{base}/"), None)?;
  let updated = chapters.iter().filter_map(|c| c.published_at).max().unwrap_or(now);
  write_text_elem(&mut w, "updated", &rfc3339(updated))?;

  for chapter in chapters {
    write_entry(&mut w, base, chapter)?;
  }

  w.write_event(Event::End(BytesEnd::new("feed")))?;
  Ok(w.into_inner().into_inner())
}

fn write_entry(w: &mut XmlWriter, base: &str, chapter: &Chapter) -> Result<(), Error> {
  let updated = chapter.published_at.unwrap_or(chapter.updated_at);

  w.write_event(Event::Start(BytesStart::new("entry")))?;
  write_text_elem(w, "title", &chapter.title)?;
  write_text_elem(w, "id", &format!("urn:uuid:{}", chapter.chapter_id))?;
  write_link(w, &format!("{base}/chapters/{}", chapter.slug), None)?;
  write_text_elem(w, "published", &rfc3339(updated))?;
  write_text_elem(w, "updated", &rfc3339(updated))?;
  write_text_elem(w, "summary", &excerpt(&chapter.content, SUMMARY_CHARS))?;
  w.write_event(Event::End(BytesEnd::new("entry")))?;
  Ok(())
}

// ─── XML writer helpers ──────────────────────────────────────────────────────

fn write_text_elem(w: &mut XmlWriter, tag: &str, text: &str) -> Result<(), Error> {
  w.write_event(Event::Start(BytesStart::new(tag)))?;
  w.write_event(Event::Text(BytesText::new(text)))?;
  w.write_event(Event::End(BytesEnd::new(tag)))?;
  Ok(())
}

fn write_link(w: &mut XmlWriter, href: &str, rel: Option<&str>) -> Result<(), Error> {
  let mut el = BytesStart::new("link");
  el.push_attribute(("href", href));
  if let Some(rel) = rel {
    el.push_attribute(("rel", rel));
  }
  w.write_event(Event::Empty(el))?;
  Ok(())
}

fn rfc3339(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Secs, true) }

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use folio_core::chapter::ChapterStatus;
  use uuid::Uuid;

  use super::*;

  fn chapter(title: &str, slug: &str, content: &str, secs: i64) -> Chapter {
    let at = Utc.timestamp_opt(secs, 0).unwrap();
    Chapter {
      chapter_id:   Uuid::new_v4(),
      author_id:    Uuid::nil(),
      order:        1,
      title:        title.into(),
      slug:         slug.into(),
      content:      content.into(),
      status:       ChapterStatus::Published,
      word_count:   0,
      published_at: Some(at),
      created_at:   at,
      updated_at:   at,
    }
  }

  fn render(chapters: &[Chapter]) -> String {
    let now = Utc.timestamp_opt(2_000_000_000, 0).unwrap();
    let bytes = render_atom("Folio & Friends", "https://example.com/", chapters, now).unwrap();
    String::from_utf8(bytes).unwrap()
  }

  #[test]
  fn entries_link_to_reader_view() {
    let xml = render(&[
      chapter("Two", "two", "Second.", 1_700_000_100),
      chapter("One", "one", "First.", 1_700_000_000),
    ]);
    assert!(xml.contains(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#), "{xml}");
    assert!(xml.contains(r#"<link href="https://example.com/chapters/two"/>"#), "{xml}");
    assert!(xml.contains("<summary>First.</summary>"), "{xml}");
    // Feed-level updated is the newest entry.
    assert!(xml.contains("<updated>2023-11-14T22:15:00Z</updated>"), "{xml}");
  }

  #[test]
  fn text_is_escaped() {
    let xml = render(&[chapter("Salt & <Smoke>", "salt-smoke", "a < b", 1_700_000_000)]);
    assert!(xml.contains("<title>Folio &amp; Friends</title>"), "{xml}");
    assert!(xml.contains("<title>Salt &amp; &lt;Smoke&gt;</title>"), "{xml}");
  }

  #[test]
  fn summary_is_truncated() {
    let long = "word ".repeat(200);
    let xml = render(&[chapter("Long", "long", &long, 1_700_000_000)]);
    let start = xml.find("<summary>").unwrap() + "<summary>".len();
    let end = xml.find("</summary>").unwrap();
    let summary = &xml[start..end];
    assert!(summary.ends_with('…'));
    assert!(summary.chars().count() <= SUMMARY_CHARS + 1);
  }

  #[test]
  fn empty_feed_uses_now() {
    let xml = render(&[]);
    assert!(xml.contains("<updated>2033-05-18T03:33:20Z</updated>"), "{xml}");
    assert!(!xml.contains("<entry>"));
  }
}
