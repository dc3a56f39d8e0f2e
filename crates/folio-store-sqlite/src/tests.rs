//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use folio_core::{
  Error as CoreError,
  chapter::{ChapterPatch, ChapterStatus, NewChapter},
  character::{AppearanceType, CharacterPatch, CharacterSort, NewCharacter},
  comment::{NewComment, build_threads},
  identity::{NewUser, User},
  interaction::FavoriteOutcome,
  notification::{NotificationContent, NotificationKind},
  pagination::{CHARACTER_PAGE_SIZE, PageRequest},
  ranking::{DateRange, SortOrder},
  store::{ChapterQuery, CharacterQuery, ReadingStore},
};
use uuid::Uuid;

use crate::{Error, SqliteStore, encode::encode_dt};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str) -> User {
  s.create_user(NewUser {
    username:      name.into(),
    password_hash: "$argon2id$stub".into(),
    is_admin:      false,
  })
  .await
  .unwrap()
}

fn chapter_input(author: Uuid, order: i64, title: &str, status: ChapterStatus) -> NewChapter {
  NewChapter {
    author_id: author,
    order,
    title: title.into(),
    content: format!("The text of {title}."),
    status,
  }
}

fn character_input(name: &str) -> NewCharacter {
  NewCharacter {
    name:         name.into(),
    summary:      format!("{name} in brief"),
    biography:    String::new(),
    image_url:    None,
    is_published: true,
  }
}

/// Move a chapter's publication timestamp into the past.
async fn backdate(s: &SqliteStore, chapter_id: Uuid, days: i64) {
  let at = encode_dt(Utc::now() - Duration::days(days));
  let id = chapter_id.to_string();
  s.conn
    .call(move |conn| {
      conn.execute(
        "UPDATE chapters SET published_at = ?1 WHERE chapter_id = ?2",
        rusqlite::params![at, id],
      )?;
      Ok(())
    })
    .await
    .unwrap();
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn usernames_are_unique_ignoring_case() {
  let s = store().await;
  user(&s, "Ada").await;

  let err = s
    .create_user(NewUser {
      username:      "ada".into(),
      password_hash: "x".into(),
      is_admin:      false,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UsernameTaken(_)));
}

#[tokio::test]
async fn credentials_lookup() {
  let s = store().await;
  let ada = user(&s, "ada").await;

  let creds = s.find_credentials("ada".into()).await.unwrap().unwrap();
  assert_eq!(creds.user.user_id, ada.user_id);
  assert_eq!(creds.password_hash, "$argon2id$stub");
  assert!(s.find_credentials("nobody".into()).await.unwrap().is_none());
}

// ─── Chapters ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chapter_order_is_unique() {
  let s = store().await;
  let author = user(&s, "author").await;

  s.create_chapter(chapter_input(author.user_id, 1, "One", ChapterStatus::Draft))
    .await
    .unwrap();
  let err = s
    .create_chapter(chapter_input(author.user_id, 1, "Other", ChapterStatus::Draft))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::OrderTaken(1)));

  let two = s
    .create_chapter(chapter_input(author.user_id, 2, "Two", ChapterStatus::Draft))
    .await
    .unwrap();
  let err = s
    .update_chapter(two.chapter_id, ChapterPatch { order: Some(1), ..Default::default() })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::OrderTaken(1)));

  // Keeping its own order is not a conflict.
  s.update_chapter(two.chapter_id, ChapterPatch { order: Some(2), ..Default::default() })
    .await
    .unwrap();
}

#[tokio::test]
async fn slugs_are_deduplicated() {
  let s = store().await;
  let author = user(&s, "author").await;

  let a = s
    .create_chapter(chapter_input(author.user_id, 1, "The Storm", ChapterStatus::Draft))
    .await
    .unwrap();
  let b = s
    .create_chapter(chapter_input(author.user_id, 2, "The Storm!", ChapterStatus::Draft))
    .await
    .unwrap();
  assert_eq!(a.slug, "the-storm");
  assert_eq!(b.slug, "the-storm-2");

  let by_slug = s.get_chapter_by_slug("the-storm-2".into()).await.unwrap().unwrap();
  assert_eq!(by_slug.chapter_id, b.chapter_id);
}

#[tokio::test]
async fn publish_timestamp_is_set_once() {
  let s = store().await;
  let author = user(&s, "author").await;

  let draft = s
    .create_chapter(chapter_input(author.user_id, 1, "One", ChapterStatus::Draft))
    .await
    .unwrap();
  assert!(draft.published_at.is_none());

  let published = s
    .update_chapter(draft.chapter_id, ChapterPatch {
      status: Some(ChapterStatus::Published),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(published.newly_published);
  let first = published.chapter.published_at.unwrap();

  s.update_chapter(draft.chapter_id, ChapterPatch {
    status: Some(ChapterStatus::Archived),
    ..Default::default()
  })
  .await
  .unwrap();
  let again = s
    .update_chapter(draft.chapter_id, ChapterPatch {
      status: Some(ChapterStatus::Published),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(!again.newly_published);
  assert_eq!(again.chapter.published_at, Some(first));
}

#[tokio::test]
async fn update_recomputes_derived_fields() {
  let s = store().await;
  let author = user(&s, "author").await;
  let chapter = s
    .create_chapter(chapter_input(author.user_id, 1, "Dawn", ChapterStatus::Draft))
    .await
    .unwrap();

  let updated = s
    .update_chapter(chapter.chapter_id, ChapterPatch {
      title: Some("Dusk".into()),
      content: Some("one two three four".into()),
      ..Default::default()
    })
    .await
    .unwrap()
    .chapter;
  assert_eq!(updated.slug, "dusk");
  assert_eq!(updated.word_count, 4);
  assert_eq!(updated.created_at, chapter.created_at);
}

#[tokio::test]
async fn deleting_a_chapter_cascades() {
  let s = store().await;
  let author = user(&s, "author").await;
  let reader = user(&s, "reader").await;
  let chapter = s
    .create_chapter(chapter_input(author.user_id, 1, "One", ChapterStatus::Published))
    .await
    .unwrap();
  let id = chapter.chapter_id;

  s.record_read(id, reader.user_id).await.unwrap();
  s.favorite_chapter(id, reader.user_id).await.unwrap();
  let root = s
    .create_comment(NewComment {
      chapter_id: id,
      author_id:  reader.user_id,
      parent_id:  None,
      content:    "first".into(),
    })
    .await
    .unwrap();

  s.delete_chapter(id).await.unwrap();

  assert!(s.get_chapter(id).await.unwrap().is_none());
  assert!(s.get_comment(root.comment_id).await.unwrap().is_none());
  let counts = s.chapter_counts(id).await.unwrap();
  assert_eq!((counts.reads, counts.favorites, counts.comments), (0, 0, 0));
  let favs = s
    .favorite_chapters(reader.user_id, PageRequest::default())
    .await
    .unwrap();
  assert_eq!(favs.pagination.total, 0);

  assert!(matches!(s.delete_chapter(id).await, Err(Error::ChapterNotFound(_))));
}

#[tokio::test]
async fn neighbors_skip_unpublished() {
  let s = store().await;
  let author = user(&s, "author").await;
  for (order, status) in [
    (1, ChapterStatus::Published),
    (2, ChapterStatus::Draft),
    (3, ChapterStatus::Published),
    (4, ChapterStatus::Published),
  ] {
    s.create_chapter(chapter_input(author.user_id, order, &format!("Ch {order}"), status))
      .await
      .unwrap();
  }

  let n = s.neighbors(3).await.unwrap();
  assert_eq!(n.previous.map(|l| l.order), Some(1));
  assert_eq!(n.next.map(|l| l.order), Some(4));

  let n = s.neighbors(4).await.unwrap();
  assert!(n.next.is_none());
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn second_page_of_fifteen() {
  let s = store().await;
  let author = user(&s, "author").await;
  for order in 1..=15 {
    s.create_chapter(chapter_input(
      author.user_id,
      order,
      &format!("Chapter {order}"),
      ChapterStatus::Published,
    ))
    .await
    .unwrap();
  }

  let query = ChapterQuery::published(PageRequest::new(Some(2), 10));
  let page = s.list_chapters(&query).await.unwrap();
  assert_eq!(page.items.len(), 5);
  assert_eq!(page.pagination.total, 15);
  assert_eq!(page.pagination.total_pages, 2);
  assert!(!page.pagination.has_next_page);
  assert!(page.pagination.has_previous_page);
  assert_eq!(page.pagination.previous_page, Some(1));
}

#[tokio::test]
async fn public_listing_hides_drafts() {
  let s = store().await;
  let author = user(&s, "author").await;
  s.create_chapter(chapter_input(author.user_id, 1, "Out", ChapterStatus::Published))
    .await
    .unwrap();
  s.create_chapter(chapter_input(author.user_id, 2, "Hidden", ChapterStatus::Draft))
    .await
    .unwrap();

  let public = s
    .list_chapters(&ChapterQuery::published(PageRequest::default()))
    .await
    .unwrap();
  assert_eq!(public.items.len(), 1);
  assert_eq!(public.items[0].title, "Out");

  let dashboard = s.list_chapters(&ChapterQuery::default()).await.unwrap();
  assert_eq!(dashboard.items.len(), 2);

  let nothing = s
    .list_chapters(&ChapterQuery { statuses: Some(vec![]), ..Default::default() })
    .await
    .unwrap();
  assert!(nothing.items.is_empty());
  assert_eq!(nothing.pagination.total, 0);
}

#[tokio::test]
async fn text_query_matches_title_and_content() {
  let s = store().await;
  let author = user(&s, "author").await;
  s.create_chapter(chapter_input(author.user_id, 1, "Harbor Lights", ChapterStatus::Published))
    .await
    .unwrap();
  s.create_chapter(chapter_input(author.user_id, 2, "Mountain", ChapterStatus::Published))
    .await
    .unwrap();

  let query = ChapterQuery {
    text: Some("harbor".into()),
    ..ChapterQuery::published(PageRequest::default())
  };
  let page = s.list_chapters(&query).await.unwrap();
  assert_eq!(page.items.len(), 1);
  assert_eq!(page.items[0].title, "Harbor Lights");

  // Wildcards are matched literally.
  let query = ChapterQuery {
    text: Some("%".into()),
    ..ChapterQuery::published(PageRequest::default())
  };
  assert!(s.list_chapters(&query).await.unwrap().items.is_empty());
}

#[tokio::test]
async fn rising_favors_recent_and_popular_does_not() {
  let s = store().await;
  let author = user(&s, "author").await;
  let a = s
    .create_chapter(chapter_input(author.user_id, 1, "Fresh", ChapterStatus::Published))
    .await
    .unwrap();
  let b = s
    .create_chapter(chapter_input(author.user_id, 2, "Old", ChapterStatus::Published))
    .await
    .unwrap();
  backdate(&s, b.chapter_id, 30).await;

  for i in 0..10 {
    let reader = user(&s, &format!("reader{i}")).await;
    s.record_read(a.chapter_id, reader.user_id).await.unwrap();
    s.record_read(b.chapter_id, reader.user_id).await.unwrap();
  }

  let rising = s
    .list_chapters(&ChapterQuery {
      sort: SortOrder::Rising,
      // Ignored under rising; B is older than a week.
      range: DateRange::Week,
      ..ChapterQuery::published(PageRequest::default())
    })
    .await
    .unwrap();
  let ids: Vec<_> = rising.items.iter().map(|c| c.chapter_id).collect();
  assert_eq!(ids, vec![a.chapter_id, b.chapter_id]);

  let popular = s
    .list_chapters(&ChapterQuery {
      sort: SortOrder::Popular,
      ..ChapterQuery::published(PageRequest::default())
    })
    .await
    .unwrap();
  let ids: Vec<_> = popular.items.iter().map(|c| c.chapter_id).collect();
  assert_eq!(ids, vec![b.chapter_id, a.chapter_id]);
  assert_eq!(popular.items[0].counts.reads, 10);
}

#[tokio::test]
async fn date_range_filters_on_publication() {
  let s = store().await;
  let author = user(&s, "author").await;
  s.create_chapter(chapter_input(author.user_id, 1, "Recent", ChapterStatus::Published))
    .await
    .unwrap();
  let old = s
    .create_chapter(chapter_input(author.user_id, 2, "Ancient", ChapterStatus::Published))
    .await
    .unwrap();
  backdate(&s, old.chapter_id, 40).await;

  let month = s
    .list_chapters(&ChapterQuery {
      range: DateRange::Month,
      ..ChapterQuery::published(PageRequest::default())
    })
    .await
    .unwrap();
  assert_eq!(month.items.len(), 1);
  assert_eq!(month.items[0].title, "Recent");

  let year = s
    .list_chapters(&ChapterQuery {
      range: DateRange::Year,
      ..ChapterQuery::published(PageRequest::default())
    })
    .await
    .unwrap();
  assert_eq!(year.items.len(), 2);
}

#[tokio::test]
async fn simple_orders_tiebreak_on_order() {
  let s = store().await;
  let author = user(&s, "author").await;
  for order in 1..=3 {
    // Identical word counts.
    s.create_chapter(NewChapter {
      author_id: author.user_id,
      order,
      title: format!("Part {order}"),
      content: "same length here".into(),
      status: ChapterStatus::Published,
    })
    .await
    .unwrap();
  }

  let page = s
    .list_chapters(&ChapterQuery {
      sort: SortOrder::Longest,
      ..ChapterQuery::published(PageRequest::default())
    })
    .await
    .unwrap();
  let orders: Vec<_> = page.items.iter().map(|c| c.order).collect();
  assert_eq!(orders, vec![3, 2, 1]);
}

#[tokio::test]
async fn recent_chapters_are_published_newest_first() {
  let s = store().await;
  let author = user(&s, "author").await;
  let old = s
    .create_chapter(chapter_input(author.user_id, 1, "Old", ChapterStatus::Published))
    .await
    .unwrap();
  backdate(&s, old.chapter_id, 3).await;
  s.create_chapter(chapter_input(author.user_id, 2, "New", ChapterStatus::Published))
    .await
    .unwrap();
  s.create_chapter(chapter_input(author.user_id, 3, "Draft", ChapterStatus::Draft))
    .await
    .unwrap();

  let recent = s.recent_chapters(20).await.unwrap();
  let titles: Vec<_> = recent.iter().map(|c| c.title.as_str()).collect();
  assert_eq!(titles, vec!["New", "Old"]);
}

// ─── Characters & appearances ────────────────────────────────────────────────

#[tokio::test]
async fn one_pov_per_chapter() {
  let s = store().await;
  let author = user(&s, "author").await;
  let chapter = s
    .create_chapter(chapter_input(author.user_id, 1, "One", ChapterStatus::Published))
    .await
    .unwrap();
  let mara = s.create_character(character_input("Mara")).await.unwrap();
  let tobin = s.create_character(character_input("Tobin")).await.unwrap();

  s.set_appearance(chapter.chapter_id, mara.character_id, AppearanceType::Pov)
    .await
    .unwrap();
  let err = s
    .set_appearance(chapter.chapter_id, tobin.character_id, AppearanceType::Pov)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PovTaken(_)));

  // Re-asserting the holder's own POV is fine; other types are unrestricted.
  s.set_appearance(chapter.chapter_id, mara.character_id, AppearanceType::Pov)
    .await
    .unwrap();
  s.set_appearance(chapter.chapter_id, tobin.character_id, AppearanceType::Mention)
    .await
    .unwrap();

  let cast = s.chapter_characters(chapter.chapter_id, false).await.unwrap();
  let names: Vec<_> = cast.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, vec!["Mara", "Tobin"]);
  assert_eq!(cast[0].appearance_type, AppearanceType::Pov);

  // Demoting the POV frees the slot.
  s.set_appearance(chapter.chapter_id, mara.character_id, AppearanceType::Appearance)
    .await
    .unwrap();
  s.set_appearance(chapter.chapter_id, tobin.character_id, AppearanceType::Pov)
    .await
    .unwrap();

  assert!(s.remove_appearance(chapter.chapter_id, tobin.character_id).await.unwrap());
  assert!(!s.remove_appearance(chapter.chapter_id, tobin.character_id).await.unwrap());
}

#[tokio::test]
async fn appearance_requires_both_sides() {
  let s = store().await;
  let mara = s.create_character(character_input("Mara")).await.unwrap();
  let err = s
    .set_appearance(Uuid::new_v4(), mara.character_id, AppearanceType::Mention)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ChapterNotFound(_)));
}

#[tokio::test]
async fn character_listing_and_counts() {
  let s = store().await;
  let reader = user(&s, "reader").await;
  let zed = s.create_character(character_input("Zed")).await.unwrap();
  s.create_character(character_input("Ana")).await.unwrap();
  s.create_character(NewCharacter {
    is_published: false,
    ..character_input("Secret")
  })
  .await
  .unwrap();

  assert!(s.record_character_view(zed.character_id, reader.user_id).await.unwrap());
  assert!(!s.record_character_view(zed.character_id, reader.user_id).await.unwrap());

  let page = PageRequest::new(None, CHARACTER_PAGE_SIZE);
  let by_name = s
    .list_characters(&CharacterQuery { page, ..Default::default() })
    .await
    .unwrap();
  let names: Vec<_> = by_name.items.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, vec!["Ana", "Zed"]);

  let by_views = s
    .list_characters(&CharacterQuery {
      page,
      sort: CharacterSort::MostViewed,
      include_unpublished: true,
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_views.items.len(), 3);
  assert_eq!(by_views.items[0].name, "Zed");
  assert_eq!(by_views.items[0].counts.views, 1);
}

#[tokio::test]
async fn character_update_and_favorites() {
  let s = store().await;
  let reader = user(&s, "reader").await;
  let mara = s.create_character(character_input("Mara")).await.unwrap();

  let renamed = s
    .update_character(mara.character_id, CharacterPatch {
      name: Some("Mara Vell".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(renamed.slug, "mara-vell");
  assert_eq!(renamed.summary, mara.summary);

  let portrait = s
    .update_character(mara.character_id, CharacterPatch {
      image_url: Some(Some("https://img.example/mara.png".into())),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(portrait.image_url.as_deref(), Some("https://img.example/mara.png"));

  let untouched = s
    .update_character(mara.character_id, CharacterPatch {
      summary: Some("Smuggler".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(untouched.image_url, portrait.image_url);

  let cleared = s
    .update_character(mara.character_id, CharacterPatch {
      image_url: Some(None),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(cleared.image_url, None);

  assert_eq!(
    s.favorite_character(mara.character_id, reader.user_id).await.unwrap(),
    FavoriteOutcome::Favorited
  );
  assert_eq!(
    s.favorite_character(mara.character_id, reader.user_id).await.unwrap(),
    FavoriteOutcome::AlreadyFavorited
  );
  assert!(s.has_favorited_character(mara.character_id, reader.user_id).await.unwrap());

  let favs = s
    .favorite_characters(reader.user_id, PageRequest::default())
    .await
    .unwrap();
  assert_eq!(favs.items.len(), 1);

  assert!(s.unfavorite_character(mara.character_id, reader.user_id).await.unwrap());
  assert_eq!(s.character_counts(mara.character_id).await.unwrap().favorites, 0);
}

// ─── Interactions ────────────────────────────────────────────────────────────

#[tokio::test]
async fn favorite_requires_read() {
  let s = store().await;
  let author = user(&s, "author").await;
  let reader = user(&s, "reader").await;
  let chapter = s
    .create_chapter(chapter_input(author.user_id, 1, "One", ChapterStatus::Published))
    .await
    .unwrap();
  let id = chapter.chapter_id;

  let err = s.favorite_chapter(id, reader.user_id).await.unwrap_err();
  assert!(matches!(err, Error::MustReadFirst(_)));
  assert!(matches!(CoreError::from(err), CoreError::MustReadFirst(_)));

  assert!(s.record_read(id, reader.user_id).await.unwrap());
  assert!(!s.record_read(id, reader.user_id).await.unwrap());

  assert_eq!(
    s.favorite_chapter(id, reader.user_id).await.unwrap(),
    FavoriteOutcome::Favorited
  );
  assert_eq!(
    s.favorite_chapter(id, reader.user_id).await.unwrap(),
    FavoriteOutcome::AlreadyFavorited
  );
  assert_eq!(s.chapter_counts(id).await.unwrap().favorites, 1);

  let state = s.viewer_state(id, reader.user_id).await.unwrap();
  assert!(state.has_read && state.has_favorited);

  assert!(s.unfavorite_chapter(id, reader.user_id).await.unwrap());
  assert!(s.remove_read(id, reader.user_id).await.unwrap());
  let state = s.viewer_state(id, reader.user_id).await.unwrap();
  assert!(!state.has_read && !state.has_favorited);
}

#[tokio::test]
async fn read_of_missing_chapter_is_not_found() {
  let s = store().await;
  let reader = user(&s, "reader").await;
  let err = s.record_read(Uuid::new_v4(), reader.user_id).await.unwrap_err();
  assert!(matches!(err, Error::ChapterNotFound(_)));
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reply_depth_follows_parent() {
  let s = store().await;
  let author = user(&s, "author").await;
  let reader = user(&s, "reader").await;
  let chapter = s
    .create_chapter(chapter_input(author.user_id, 1, "One", ChapterStatus::Published))
    .await
    .unwrap();

  let mut parent = None;
  let mut ids = Vec::new();
  for depth in 1..=6 {
    let c = s
      .create_comment(NewComment {
        chapter_id: chapter.chapter_id,
        author_id:  reader.user_id,
        parent_id:  parent,
        content:    format!("depth {depth}"),
      })
      .await
      .unwrap();
    assert_eq!(c.depth, depth);
    assert_eq!(c.author_name, "reader");
    parent = Some(c.comment_id);
    ids.push(c.comment_id);
  }

  let threads = build_threads(s.chapter_comments(chapter.chapter_id).await.unwrap());
  assert_eq!(threads.len(), 1);
  assert!(threads[0].can_reply);

  // Deleting the second level removes everything below it.
  s.delete_comment(ids[1]).await.unwrap();
  let remaining = s.chapter_comments(chapter.chapter_id).await.unwrap();
  assert_eq!(remaining.len(), 1);
  assert_eq!(remaining[0].comment_id, ids[0]);
}

#[tokio::test]
async fn reply_parent_must_share_chapter() {
  let s = store().await;
  let author = user(&s, "author").await;
  let one = s
    .create_chapter(chapter_input(author.user_id, 1, "One", ChapterStatus::Published))
    .await
    .unwrap();
  let two = s
    .create_chapter(chapter_input(author.user_id, 2, "Two", ChapterStatus::Published))
    .await
    .unwrap();
  let root = s
    .create_comment(NewComment {
      chapter_id: one.chapter_id,
      author_id:  author.user_id,
      parent_id:  None,
      content:    "hi".into(),
    })
    .await
    .unwrap();

  let err = s
    .create_comment(NewComment {
      chapter_id: two.chapter_id,
      author_id:  author.user_id,
      parent_id:  Some(root.comment_id),
      content:    "cross-thread".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ParentMismatch { .. }));

  let err = s
    .create_comment(NewComment {
      chapter_id: one.chapter_id,
      author_id:  author.user_id,
      parent_id:  Some(Uuid::new_v4()),
      content:    "orphan".into(),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::CommentNotFound(_)));
}

#[tokio::test]
async fn comment_edit_keeps_identity() {
  let s = store().await;
  let author = user(&s, "author").await;
  let chapter = s
    .create_chapter(chapter_input(author.user_id, 1, "One", ChapterStatus::Published))
    .await
    .unwrap();
  let c = s
    .create_comment(NewComment {
      chapter_id: chapter.chapter_id,
      author_id:  author.user_id,
      parent_id:  None,
      content:    "tpyo".into(),
    })
    .await
    .unwrap();

  let edited = s.update_comment(c.comment_id, "typo".into()).await.unwrap();
  assert_eq!(edited.content, "typo");
  assert_eq!(edited.comment_id, c.comment_id);
  assert_eq!(edited.created_at, c.created_at);

  let err = s.update_comment(Uuid::new_v4(), "x".into()).await.unwrap_err();
  assert!(matches!(err, Error::CommentNotFound(_)));
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_are_per_recipient() {
  let s = store().await;
  let author = user(&s, "author").await;
  let ada = user(&s, "ada").await;
  let bo = user(&s, "bo").await;
  let chapter_id = Uuid::new_v4();

  let sent = s
    .notify_all(author.user_id, NotificationContent::new_chapter(chapter_id, "One"))
    .await
    .unwrap();
  assert_eq!(sent, 2);
  assert_eq!(s.unread_count(author.user_id).await.unwrap(), 0);

  let n = s
    .notify(ada.user_id, NotificationContent::new_favorite(chapter_id, "bo", "One"))
    .await
    .unwrap();
  assert_eq!(s.unread_count(ada.user_id).await.unwrap(), 2);

  // Somebody else's notification is invisible.
  let err = s.mark_notification_read(bo.user_id, n.notification_id).await.unwrap_err();
  assert!(matches!(err, Error::NotificationNotFound(_)));

  s.mark_notification_read(ada.user_id, n.notification_id).await.unwrap();
  let unread = s
    .list_notifications(ada.user_id, true, PageRequest::default())
    .await
    .unwrap();
  assert_eq!(unread.items.len(), 1);
  assert_eq!(unread.items[0].kind, NotificationKind::NewChapter);

  let all = s
    .list_notifications(ada.user_id, false, PageRequest::default())
    .await
    .unwrap();
  assert_eq!(all.pagination.total, 2);
  assert_eq!(all.items[0].kind, NotificationKind::NewFavorite);

  assert_eq!(s.mark_all_read(ada.user_id).await.unwrap(), 1);
  assert_eq!(s.unread_count(ada.user_id).await.unwrap(), 0);
}
