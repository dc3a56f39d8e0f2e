//! [`SqliteStore`], the SQLite implementation of [`ReadingStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{
  Connection, OptionalExtension as _, params, params_from_iter, types::Value,
};
use uuid::Uuid;

use folio_core::{
  chapter::{
    Chapter, ChapterCounts, ChapterLink, ChapterPatch, ChapterSummary,
    ChapterUpdate, Neighbors, NewChapter, ViewerState, published_at_after,
  },
  character::{
    Appearance, AppearanceType, AppearingCharacter, AppearsIn, Character,
    CharacterCounts, CharacterPatch, CharacterSort, CharacterSummary,
    NewCharacter,
  },
  comment::{Comment, NewComment, child_depth, validate_content},
  identity::{Credentials, NewUser, User, validate_username},
  interaction::FavoriteOutcome,
  notification::{Notification, NotificationContent},
  pagination::{Page, PageRequest, Pagination},
  ranking::{SortOrder, rank},
  store::{ChapterQuery, CharacterQuery, ReadingStore},
  text::{slug_candidate, slugify, word_count},
};

use crate::{
  Error, Result,
  encode::{
    CHAPTER_COLUMNS, CHAPTER_SUMMARY_COLUMNS, CHARACTER_COLUMNS,
    CHARACTER_SUMMARY_COLUMNS, COMMENT_COLUMNS, NOTIFICATION_COLUMNS,
    RawChapter, RawChapterSummary, RawCharacter, RawCharacterSummary,
    RawComment, RawNotification, RawUser, USER_COLUMNS, decode_appearance_type,
    decode_uuid, encode_dt, encode_uuid, like_pattern,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Folio store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a paged listing: `count_sql` yields the total, `page_sql` one page
  /// of rows. Both share `args`; the page query additionally receives
  /// `LIMIT`/`OFFSET` as its last two parameters.
  async fn paged<R, F>(
    &self,
    count_sql: String,
    page_sql: String,
    args: Vec<Value>,
    page: PageRequest,
    map_row: F,
  ) -> Result<(u64, Vec<R>)>
  where
    R: Send + 'static,
    F: Fn(&rusqlite::Row<'_>) -> rusqlite::Result<R> + Send + 'static,
  {
    let limit = i64::from(page.limit);
    let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);

    let (total, rows) = self
      .conn
      .call(move |conn| {
        let total: i64 =
          conn.query_row(&count_sql, params_from_iter(args.iter()), |r| r.get(0))?;

        let mut page_args = args;
        page_args.push(Value::Integer(limit));
        page_args.push(Value::Integer(offset));

        let mut stmt = conn.prepare(&page_sql)?;
        let rows = stmt
          .query_map(params_from_iter(page_args.iter()), |row| map_row(row))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, rows))
      })
      .await?;

    Ok((u64::try_from(total).unwrap_or(0), rows))
  }
}

// ─── Synchronous helpers (run on the connection thread) ──────────────────────

fn exists(conn: &Connection, sql: &str, args: impl rusqlite::Params) -> rusqlite::Result<bool> {
  conn.prepare_cached(sql)?.exists(args)
}

fn chapter_exists(conn: &Connection, chapter_id: &str) -> rusqlite::Result<bool> {
  exists(conn, "SELECT 1 FROM chapters WHERE chapter_id = ?1", params![chapter_id])
}

fn character_exists(conn: &Connection, character_id: &str) -> rusqlite::Result<bool> {
  exists(
    conn,
    "SELECT 1 FROM characters WHERE character_id = ?1",
    params![character_id],
  )
}

fn order_taken(conn: &Connection, order: i64, own_id: &str) -> rusqlite::Result<bool> {
  exists(
    conn,
    "SELECT 1 FROM chapters WHERE sort_order = ?1 AND chapter_id != ?2",
    params![order, own_id],
  )
}

/// First free slug among `base`, `base-2`, `base-3`, ... in `table`,
/// ignoring the row identified by `own_id`.
fn unique_slug(
  conn: &Connection,
  table: &'static str,
  id_column: &'static str,
  base: &str,
  own_id: &str,
) -> rusqlite::Result<String> {
  let sql = format!("SELECT 1 FROM {table} WHERE slug = ?1 AND {id_column} != ?2");
  let mut stmt = conn.prepare(&sql)?;
  let mut n = 1;
  loop {
    let candidate = slug_candidate(base, n);
    if !stmt.exists(params![candidate, own_id])? {
      return Ok(candidate);
    }
    n += 1;
  }
}

fn load_chapter(conn: &Connection, chapter_id: &str) -> rusqlite::Result<Option<RawChapter>> {
  conn
    .query_row(
      &format!("SELECT {CHAPTER_COLUMNS} FROM chapters c WHERE c.chapter_id = ?1"),
      params![chapter_id],
      RawChapter::from_row,
    )
    .optional()
}

fn load_character(
  conn: &Connection,
  character_id: &str,
) -> rusqlite::Result<Option<RawCharacter>> {
  conn
    .query_row(
      &format!("SELECT {CHARACTER_COLUMNS} FROM characters ch WHERE ch.character_id = ?1"),
      params![character_id],
      RawCharacter::from_row,
    )
    .optional()
}

fn load_comment(conn: &Connection, comment_id: &str) -> rusqlite::Result<Option<RawComment>> {
  conn
    .query_row(
      &format!(
        "SELECT {COMMENT_COLUMNS}
         FROM comments m
         JOIN users u ON u.user_id = m.author_id
         WHERE m.comment_id = ?1"
      ),
      params![comment_id],
      RawComment::from_row,
    )
    .optional()
}

fn create_chapter_tx(
  conn: &mut Connection,
  input: NewChapter,
  now: DateTime<Utc>,
) -> Result<Chapter> {
  let tx = conn.transaction()?;
  let chapter_id = Uuid::new_v4();
  let id_str = encode_uuid(chapter_id);

  if order_taken(&tx, input.order, &id_str)? {
    return Err(Error::OrderTaken(input.order));
  }

  let title = input.title.trim().to_owned();
  let slug = unique_slug(&tx, "chapters", "chapter_id", &slugify(&title), &id_str)?;
  let chapter = Chapter {
    chapter_id,
    author_id: input.author_id,
    order: input.order,
    title,
    slug,
    word_count: word_count(&input.content),
    content: input.content,
    status: input.status,
    published_at: published_at_after(None, input.status, now),
    created_at: now,
    updated_at: now,
  };

  tx.execute(
    "INSERT INTO chapters (
       chapter_id, author_id, sort_order, title, slug, content, status,
       word_count, published_at, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    params![
      id_str,
      encode_uuid(chapter.author_id),
      chapter.order,
      chapter.title,
      chapter.slug,
      chapter.content,
      chapter.status.as_str(),
      chapter.word_count,
      chapter.published_at.map(encode_dt),
      encode_dt(now),
      encode_dt(now),
    ],
  )?;
  tx.commit()?;
  Ok(chapter)
}

fn update_chapter_tx(
  conn: &mut Connection,
  chapter_id: Uuid,
  patch: ChapterPatch,
  now: DateTime<Utc>,
) -> Result<ChapterUpdate> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(chapter_id);

  let current = load_chapter(&tx, &id_str)?
    .ok_or(Error::ChapterNotFound(chapter_id))?
    .into_chapter()?;

  if let Some(order) = patch.order {
    if order != current.order && order_taken(&tx, order, &id_str)? {
      return Err(Error::OrderTaken(order));
    }
  }

  let title = patch
    .title
    .map(|t| t.trim().to_owned())
    .unwrap_or_else(|| current.title.clone());
  let slug = if title == current.title {
    current.slug.clone()
  } else {
    unique_slug(&tx, "chapters", "chapter_id", &slugify(&title), &id_str)?
  };
  let content = patch.content.unwrap_or(current.content);
  let status = patch.status.unwrap_or(current.status);
  let published_at = published_at_after(current.published_at, status, now);

  let chapter = Chapter {
    chapter_id,
    author_id: current.author_id,
    order: patch.order.unwrap_or(current.order),
    title,
    slug,
    word_count: word_count(&content),
    content,
    status,
    published_at,
    created_at: current.created_at,
    updated_at: now,
  };

  tx.execute(
    "UPDATE chapters
     SET sort_order = ?2, title = ?3, slug = ?4, content = ?5, status = ?6,
         word_count = ?7, published_at = ?8, updated_at = ?9
     WHERE chapter_id = ?1",
    params![
      id_str,
      chapter.order,
      chapter.title,
      chapter.slug,
      chapter.content,
      chapter.status.as_str(),
      chapter.word_count,
      chapter.published_at.map(encode_dt),
      encode_dt(now),
    ],
  )?;
  tx.commit()?;

  Ok(ChapterUpdate {
    newly_published: current.published_at.is_none() && chapter.published_at.is_some(),
    chapter,
  })
}

fn create_character_tx(
  conn: &mut Connection,
  input: NewCharacter,
  now: DateTime<Utc>,
) -> Result<Character> {
  let tx = conn.transaction()?;
  let character_id = Uuid::new_v4();
  let id_str = encode_uuid(character_id);
  let name = input.name.trim().to_owned();
  let slug = unique_slug(&tx, "characters", "character_id", &slugify(&name), &id_str)?;

  let character = Character {
    character_id,
    name,
    slug,
    summary: input.summary,
    biography: input.biography,
    image_url: input.image_url,
    is_published: input.is_published,
    created_at: now,
    updated_at: now,
  };

  tx.execute(
    "INSERT INTO characters (
       character_id, name, slug, summary, biography, image_url,
       is_published, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    params![
      id_str,
      character.name,
      character.slug,
      character.summary,
      character.biography,
      character.image_url,
      character.is_published,
      encode_dt(now),
      encode_dt(now),
    ],
  )?;
  tx.commit()?;
  Ok(character)
}

fn update_character_tx(
  conn: &mut Connection,
  character_id: Uuid,
  patch: CharacterPatch,
  now: DateTime<Utc>,
) -> Result<Character> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(character_id);

  let current = load_character(&tx, &id_str)?
    .ok_or(Error::CharacterNotFound(character_id))?
    .into_character()?;

  let name = patch
    .name
    .map(|n| n.trim().to_owned())
    .unwrap_or_else(|| current.name.clone());
  let slug = if name == current.name {
    current.slug.clone()
  } else {
    unique_slug(&tx, "characters", "character_id", &slugify(&name), &id_str)?
  };

  let character = Character {
    character_id,
    name,
    slug,
    summary: patch.summary.unwrap_or(current.summary),
    biography: patch.biography.unwrap_or(current.biography),
    image_url: patch.image_url.unwrap_or(current.image_url),
    is_published: patch.is_published.unwrap_or(current.is_published),
    created_at: current.created_at,
    updated_at: now,
  };

  tx.execute(
    "UPDATE characters
     SET name = ?2, slug = ?3, summary = ?4, biography = ?5, image_url = ?6,
         is_published = ?7, updated_at = ?8
     WHERE character_id = ?1",
    params![
      id_str,
      character.name,
      character.slug,
      character.summary,
      character.biography,
      character.image_url,
      character.is_published,
      encode_dt(now),
    ],
  )?;
  tx.commit()?;
  Ok(character)
}

fn set_appearance_tx(
  conn: &mut Connection,
  chapter_id: Uuid,
  character_id: Uuid,
  appearance_type: AppearanceType,
) -> Result<Appearance> {
  let tx = conn.transaction()?;
  let chapter_str = encode_uuid(chapter_id);
  let character_str = encode_uuid(character_id);

  if !chapter_exists(&tx, &chapter_str)? {
    return Err(Error::ChapterNotFound(chapter_id));
  }
  if !character_exists(&tx, &character_str)? {
    return Err(Error::CharacterNotFound(character_id));
  }
  if appearance_type == AppearanceType::Pov
    && exists(
      &tx,
      "SELECT 1 FROM chapter_characters
       WHERE chapter_id = ?1 AND appearance_type = 'POV' AND character_id != ?2",
      params![chapter_str, character_str],
    )?
  {
    return Err(Error::PovTaken(chapter_id));
  }

  tx.execute(
    "INSERT INTO chapter_characters (chapter_id, character_id, appearance_type)
     VALUES (?1, ?2, ?3)
     ON CONFLICT (chapter_id, character_id)
     DO UPDATE SET appearance_type = excluded.appearance_type",
    params![chapter_str, character_str, appearance_type.as_str()],
  )?;
  tx.commit()?;

  Ok(Appearance { chapter_id, character_id, appearance_type })
}

fn favorite_chapter_tx(
  conn: &mut Connection,
  chapter_id: Uuid,
  user_id: Uuid,
  now: DateTime<Utc>,
) -> Result<FavoriteOutcome> {
  let tx = conn.transaction()?;
  let chapter_str = encode_uuid(chapter_id);
  let user_str = encode_uuid(user_id);

  if !chapter_exists(&tx, &chapter_str)? {
    return Err(Error::ChapterNotFound(chapter_id));
  }
  let has_read = exists(
    &tx,
    "SELECT 1 FROM reads WHERE chapter_id = ?1 AND user_id = ?2",
    params![chapter_str, user_str],
  )?;
  if !has_read {
    return Err(Error::MustReadFirst(chapter_id));
  }

  let inserted = tx.execute(
    "INSERT OR IGNORE INTO chapter_favorites (chapter_id, user_id, created_at)
     VALUES (?1, ?2, ?3)",
    params![chapter_str, user_str, encode_dt(now)],
  )?;
  tx.commit()?;
  Ok(FavoriteOutcome::from_inserted(inserted == 1))
}

/// Insert an interaction row for an existing character. `None` if the
/// character does not exist, otherwise whether a row was added.
fn insert_character_interaction(
  conn: &Connection,
  table: &'static str,
  character_id: &str,
  user_id: &str,
  now: DateTime<Utc>,
) -> rusqlite::Result<Option<bool>> {
  if !character_exists(conn, character_id)? {
    return Ok(None);
  }
  let inserted = conn.execute(
    &format!(
      "INSERT OR IGNORE INTO {table} (character_id, user_id, created_at) VALUES (?1, ?2, ?3)"
    ),
    params![character_id, user_id, encode_dt(now)],
  )?;
  Ok(Some(inserted == 1))
}

fn create_comment_tx(
  conn: &mut Connection,
  input: NewComment,
  now: DateTime<Utc>,
) -> Result<Comment> {
  let tx = conn.transaction()?;
  let chapter_str = encode_uuid(input.chapter_id);

  if !chapter_exists(&tx, &chapter_str)? {
    return Err(Error::ChapterNotFound(input.chapter_id));
  }

  let parent_depth = match input.parent_id {
    None => None,
    Some(parent_id) => {
      let (parent_chapter, depth): (String, i64) = tx
        .query_row(
          "SELECT chapter_id, depth FROM comments WHERE comment_id = ?1",
          params![encode_uuid(parent_id)],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?
        .ok_or(Error::CommentNotFound(parent_id))?;
      if parent_chapter != chapter_str {
        return Err(Error::ParentMismatch { parent: parent_id, chapter: input.chapter_id });
      }
      Some(u32::try_from(depth).unwrap_or(1))
    }
  };

  let comment_id = encode_uuid(Uuid::new_v4());
  tx.execute(
    "INSERT INTO comments (
       comment_id, chapter_id, author_id, parent_id, depth, content,
       created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    params![
      comment_id,
      chapter_str,
      encode_uuid(input.author_id),
      input.parent_id.map(encode_uuid),
      child_depth(parent_depth),
      input.content,
      encode_dt(now),
      encode_dt(now),
    ],
  )?;
  let raw = load_comment(&tx, &comment_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
  tx.commit()?;

  raw.into_comment()
}

fn notify_all_tx(
  conn: &mut Connection,
  except: Uuid,
  content: NotificationContent,
  now: DateTime<Utc>,
) -> Result<u64> {
  let tx = conn.transaction()?;
  let recipients: Vec<String> = {
    let mut stmt = tx.prepare("SELECT user_id FROM users WHERE user_id != ?1")?;
    stmt
      .query_map(params![encode_uuid(except)], |r| r.get(0))?
      .collect::<rusqlite::Result<_>>()?
  };

  let created_at = encode_dt(now);
  {
    let mut insert = tx.prepare(
      "INSERT INTO notifications (
         notification_id, recipient_id, kind, message, chapter_id, comment_id,
         is_read, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
    )?;
    for recipient in &recipients {
      insert.execute(params![
        encode_uuid(Uuid::new_v4()),
        recipient,
        content.kind.as_str(),
        content.message,
        content.chapter_id.map(encode_uuid),
        content.comment_id.map(encode_uuid),
        created_at,
      ])?;
    }
  }
  tx.commit()?;
  Ok(recipients.len() as u64)
}

fn chapter_order_by(sort: SortOrder) -> &'static str {
  match sort {
    SortOrder::Newest => "COALESCE(c.published_at, c.created_at) DESC",
    SortOrder::Oldest => "COALESCE(c.published_at, c.created_at) ASC",
    SortOrder::AlphabeticalAsc => "c.title COLLATE NOCASE ASC",
    SortOrder::AlphabeticalDesc => "c.title COLLATE NOCASE DESC",
    SortOrder::MostComments => "comment_count DESC",
    SortOrder::MostRead => "read_count DESC",
    SortOrder::MostFavorited => "favorite_count DESC",
    SortOrder::Longest => "c.word_count DESC",
    SortOrder::Shortest => "c.word_count ASC",
    // Scored orders are ranked after loading; this only fixes a stable
    // input order.
    SortOrder::Popular | SortOrder::Rising => "c.sort_order DESC",
  }
}

fn character_order_by(sort: CharacterSort) -> &'static str {
  match sort {
    CharacterSort::Name => "ch.name COLLATE NOCASE ASC",
    CharacterSort::Newest => "ch.created_at DESC, ch.name COLLATE NOCASE ASC",
    CharacterSort::MostViewed => "view_count DESC, ch.name COLLATE NOCASE ASC",
    CharacterSort::MostFavorited => "favorite_count DESC, ch.name COLLATE NOCASE ASC",
  }
}

fn where_clause(conds: &[String]) -> String {
  if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  }
}

// ─── ReadingStore impl ───────────────────────────────────────────────────────

impl ReadingStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    validate_username(&input.username)?;

    let user = User {
      user_id:    Uuid::new_v4(),
      username:   input.username,
      is_admin:   input.is_admin,
      created_at: Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let name     = user.username.clone();
    let at_str   = encode_dt(user.created_at);
    let is_admin = user.is_admin;
    let hash     = input.password_hash;

    let inserted = self
      .conn
      .call(move |conn| {
        if exists(conn, "SELECT 1 FROM users WHERE username = ?1", params![name])? {
          return Ok(false);
        }
        conn.execute(
          "INSERT INTO users (user_id, username, password_hash, is_admin, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![id_str, name, hash, is_admin, at_str],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::UsernameTaken(user.username));
    }
    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);

    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            params![id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_credentials(&self, username: String) -> Result<Option<Credentials>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = ?1"),
            params![username],
            |row| Ok((RawUser::from_row(row)?, row.get::<_, String>(4)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(user, password_hash)| {
        Ok(Credentials { user: user.into_user()?, password_hash })
      })
      .transpose()
  }

  // ── Chapters ──────────────────────────────────────────────────────────────

  async fn create_chapter(&self, input: NewChapter) -> Result<Chapter> {
    input.validate()?;
    let now = Utc::now();
    let chapter = self
      .conn
      .call(move |conn| Ok(create_chapter_tx(conn, input, now)))
      .await??;
    tracing::info!(chapter_id = %chapter.chapter_id, order = chapter.order, "chapter created");
    Ok(chapter)
  }

  async fn update_chapter(&self, chapter_id: Uuid, patch: ChapterPatch) -> Result<ChapterUpdate> {
    patch.validate()?;
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(update_chapter_tx(conn, chapter_id, patch, now)))
      .await?
  }

  async fn delete_chapter(&self, chapter_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(chapter_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM chapters WHERE chapter_id = ?1", params![id_str])?)
      })
      .await?;

    if removed == 0 {
      return Err(Error::ChapterNotFound(chapter_id));
    }
    tracing::info!(%chapter_id, "chapter deleted");
    Ok(())
  }

  async fn get_chapter(&self, chapter_id: Uuid) -> Result<Option<Chapter>> {
    let id_str = encode_uuid(chapter_id);
    let raw = self
      .conn
      .call(move |conn| Ok(load_chapter(conn, &id_str)?))
      .await?;
    raw.map(RawChapter::into_chapter).transpose()
  }

  async fn get_chapter_by_slug(&self, slug: String) -> Result<Option<Chapter>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CHAPTER_COLUMNS} FROM chapters c WHERE c.slug = ?1"),
            params![slug],
            RawChapter::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawChapter::into_chapter).transpose()
  }

  async fn chapter_counts(&self, chapter_id: Uuid) -> Result<ChapterCounts> {
    let id_str = encode_uuid(chapter_id);
    let (reads, favorites, comments): (i64, i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM reads WHERE chapter_id = ?1),
             (SELECT COUNT(*) FROM chapter_favorites WHERE chapter_id = ?1),
             (SELECT COUNT(*) FROM comments WHERE chapter_id = ?1)",
          params![id_str],
          |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )?)
      })
      .await?;

    Ok(ChapterCounts {
      reads:     u64::try_from(reads).unwrap_or(0),
      favorites: u64::try_from(favorites).unwrap_or(0),
      comments:  u64::try_from(comments).unwrap_or(0),
    })
  }

  async fn neighbors(&self, order: i64) -> Result<Neighbors> {
    type RawLink = (String, i64, String, String);

    let (previous, next): (Option<RawLink>, Option<RawLink>) = self
      .conn
      .call(move |conn| {
        let link = |sql: &str| -> rusqlite::Result<Option<RawLink>> {
          conn
            .query_row(sql, params![order], |r| {
              Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
            })
            .optional()
        };
        let previous = link(
          "SELECT chapter_id, sort_order, title, slug FROM chapters
           WHERE status = 'published' AND sort_order < ?1
           ORDER BY sort_order DESC LIMIT 1",
        )?;
        let next = link(
          "SELECT chapter_id, sort_order, title, slug FROM chapters
           WHERE status = 'published' AND sort_order > ?1
           ORDER BY sort_order ASC LIMIT 1",
        )?;
        Ok((previous, next))
      })
      .await?;

    let decode = |raw: Option<RawLink>| -> Result<Option<ChapterLink>> {
      raw
        .map(|(id, order, title, slug)| {
          Ok(ChapterLink { chapter_id: decode_uuid(&id)?, order, title, slug })
        })
        .transpose()
    };

    Ok(Neighbors { previous: decode(previous)?, next: decode(next)? })
  }

  async fn list_chapters<'a>(&'a self, query: &'a ChapterQuery) -> Result<Page<ChapterSummary>> {
    let now = query.as_of.unwrap_or_else(Utc::now);

    // An explicit but empty (or entirely unrecognised) status filter.
    if query.statuses.as_ref().is_some_and(Vec::is_empty) {
      return Ok(Page { items: Vec::new(), pagination: Pagination::new(0, query.page) });
    }

    let mut conds: Vec<String> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(text) = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
      args.push(Value::Text(like_pattern(text)));
      let n = args.len();
      conds.push(format!(
        "(c.title LIKE ?{n} ESCAPE '\\' OR c.content LIKE ?{n} ESCAPE '\\')"
      ));
    }

    if let Some(statuses) = &query.statuses {
      let mut placeholders = Vec::with_capacity(statuses.len());
      for status in statuses {
        args.push(Value::Text(status.as_str().to_owned()));
        placeholders.push(format!("?{}", args.len()));
      }
      conds.push(format!("c.status IN ({})", placeholders.join(", ")));
    }

    if let Some(since) = query.range.effective_for(query.sort).since(now) {
      args.push(Value::Text(encode_dt(since)));
      conds.push(format!("c.published_at >= ?{}", args.len()));
    }

    let where_sql = where_clause(&conds);
    let order_sql = chapter_order_by(query.sort);
    tracing::debug!(sort = ?query.sort, %where_sql, "listing chapters");

    if query.sort.is_scored() {
      let sql = format!(
        "SELECT {CHAPTER_SUMMARY_COLUMNS} FROM chapters c {where_sql}
         ORDER BY {order_sql}"
      );
      let raws: Vec<RawChapterSummary> = self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map(params_from_iter(args.iter()), RawChapterSummary::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?;

      let mut items = raws
        .into_iter()
        .map(RawChapterSummary::into_summary)
        .collect::<Result<Vec<_>>>()?;
      rank(&mut items, query.sort, now);
      return Ok(Page::from_all(items, query.page));
    }

    let n = args.len();
    let count_sql = format!("SELECT COUNT(*) FROM chapters c {where_sql}");
    let page_sql = format!(
      "SELECT {CHAPTER_SUMMARY_COLUMNS} FROM chapters c {where_sql}
       ORDER BY {order_sql}, c.sort_order DESC
       LIMIT ?{} OFFSET ?{}",
      n + 1,
      n + 2,
    );

    let (total, raws) = self
      .paged(count_sql, page_sql, args, query.page, RawChapterSummary::from_row)
      .await?;
    let items = raws
      .into_iter()
      .map(RawChapterSummary::into_summary)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page { items, pagination: Pagination::new(total, query.page) })
  }

  async fn recent_chapters(&self, limit: u32) -> Result<Vec<Chapter>> {
    let raws: Vec<RawChapter> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {CHAPTER_COLUMNS} FROM chapters c
           WHERE c.status = 'published'
           ORDER BY c.published_at DESC, c.sort_order DESC
           LIMIT ?1"
        ))?;
        let rows = stmt
          .query_map(params![limit], RawChapter::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChapter::into_chapter).collect()
  }

  // ── Characters ────────────────────────────────────────────────────────────

  async fn create_character(&self, input: NewCharacter) -> Result<Character> {
    input.validate()?;
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(create_character_tx(conn, input, now)))
      .await?
  }

  async fn update_character(
    &self,
    character_id: Uuid,
    patch: CharacterPatch,
  ) -> Result<Character> {
    patch.validate()?;
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(update_character_tx(conn, character_id, patch, now)))
      .await?
  }

  async fn delete_character(&self, character_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(character_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM characters WHERE character_id = ?1", params![id_str])?)
      })
      .await?;

    if removed == 0 {
      return Err(Error::CharacterNotFound(character_id));
    }
    Ok(())
  }

  async fn get_character(&self, character_id: Uuid) -> Result<Option<Character>> {
    let id_str = encode_uuid(character_id);
    let raw = self
      .conn
      .call(move |conn| Ok(load_character(conn, &id_str)?))
      .await?;
    raw.map(RawCharacter::into_character).transpose()
  }

  async fn get_character_by_slug(&self, slug: String) -> Result<Option<Character>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {CHARACTER_COLUMNS} FROM characters ch WHERE ch.slug = ?1"),
            params![slug],
            RawCharacter::from_row,
          )
          .optional()?)
      })
      .await?;
    raw.map(RawCharacter::into_character).transpose()
  }

  async fn character_counts(&self, character_id: Uuid) -> Result<CharacterCounts> {
    let id_str = encode_uuid(character_id);
    let (views, favorites): (i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT
             (SELECT COUNT(*) FROM character_views WHERE character_id = ?1),
             (SELECT COUNT(*) FROM character_favorites WHERE character_id = ?1)",
          params![id_str],
          |r| Ok((r.get(0)?, r.get(1)?)),
        )?)
      })
      .await?;

    Ok(CharacterCounts {
      views:     u64::try_from(views).unwrap_or(0),
      favorites: u64::try_from(favorites).unwrap_or(0),
    })
  }

  async fn list_characters<'a>(&'a self, query: &'a CharacterQuery) -> Result<Page<CharacterSummary>> {
    let mut conds: Vec<String> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if !query.include_unpublished {
      conds.push("ch.is_published = 1".to_owned());
    }
    if let Some(text) = query.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
      args.push(Value::Text(like_pattern(text)));
      let n = args.len();
      conds.push(format!(
        "(ch.name LIKE ?{n} ESCAPE '\\' OR ch.summary LIKE ?{n} ESCAPE '\\')"
      ));
    }

    let where_sql = where_clause(&conds);
    let n = args.len();
    let count_sql = format!("SELECT COUNT(*) FROM characters ch {where_sql}");
    let page_sql = format!(
      "SELECT {CHARACTER_SUMMARY_COLUMNS} FROM characters ch {where_sql}
       ORDER BY {}
       LIMIT ?{} OFFSET ?{}",
      character_order_by(query.sort),
      n + 1,
      n + 2,
    );

    let (total, raws) = self
      .paged(count_sql, page_sql, args, query.page, RawCharacterSummary::from_row)
      .await?;
    let items = raws
      .into_iter()
      .map(RawCharacterSummary::into_summary)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page { items, pagination: Pagination::new(total, query.page) })
  }

  // ── Appearances ───────────────────────────────────────────────────────────

  async fn set_appearance(
    &self,
    chapter_id: Uuid,
    character_id: Uuid,
    appearance_type: AppearanceType,
  ) -> Result<Appearance> {
    self
      .conn
      .call(move |conn| {
        Ok(set_appearance_tx(conn, chapter_id, character_id, appearance_type))
      })
      .await?
  }

  async fn remove_appearance(&self, chapter_id: Uuid, character_id: Uuid) -> Result<bool> {
    let chapter_str = encode_uuid(chapter_id);
    let character_str = encode_uuid(character_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM chapter_characters WHERE chapter_id = ?1 AND character_id = ?2",
          params![chapter_str, character_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn chapter_characters(
    &self,
    chapter_id: Uuid,
    include_unpublished: bool,
  ) -> Result<Vec<AppearingCharacter>> {
    let id_str = encode_uuid(chapter_id);
    let raws: Vec<(String, String, String, Option<String>, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT ch.character_id, ch.name, ch.slug, ch.image_url, cc.appearance_type
           FROM chapter_characters cc
           JOIN characters ch ON ch.character_id = cc.character_id
           WHERE cc.chapter_id = ?1 AND (?2 OR ch.is_published = 1)
           ORDER BY CASE cc.appearance_type
                      WHEN 'POV' THEN 0 WHEN 'APPEARANCE' THEN 1 ELSE 2
                    END,
                    ch.name COLLATE NOCASE",
        )?;
        let rows = stmt
          .query_map(params![id_str, include_unpublished], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(id, name, slug, image_url, kind)| {
        Ok(AppearingCharacter {
          character_id: decode_uuid(&id)?,
          name,
          slug,
          image_url,
          appearance_type: decode_appearance_type(&kind)?,
        })
      })
      .collect()
  }

  async fn character_chapters(
    &self,
    character_id: Uuid,
    include_unpublished: bool,
  ) -> Result<Vec<AppearsIn>> {
    let id_str = encode_uuid(character_id);
    let raws: Vec<(String, i64, String, String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT c.chapter_id, c.sort_order, c.title, c.slug, cc.appearance_type
           FROM chapter_characters cc
           JOIN chapters c ON c.chapter_id = cc.chapter_id
           WHERE cc.character_id = ?1 AND (?2 OR c.status = 'published')
           ORDER BY c.sort_order",
        )?;
        let rows = stmt
          .query_map(params![id_str, include_unpublished], |r| {
            Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(id, order, title, slug, kind)| {
        Ok(AppearsIn {
          chapter_id: decode_uuid(&id)?,
          order,
          title,
          slug,
          appearance_type: decode_appearance_type(&kind)?,
        })
      })
      .collect()
  }

  // ── Interactions ──────────────────────────────────────────────────────────

  async fn record_read(&self, chapter_id: Uuid, user_id: Uuid) -> Result<bool> {
    let chapter_str = encode_uuid(chapter_id);
    let user_str = encode_uuid(user_id);
    let at_str = encode_dt(Utc::now());

    let inserted: Option<bool> = self
      .conn
      .call(move |conn| {
        if !chapter_exists(conn, &chapter_str)? {
          return Ok(None);
        }
        let n = conn.execute(
          "INSERT OR IGNORE INTO reads (chapter_id, user_id, created_at) VALUES (?1, ?2, ?3)",
          params![chapter_str, user_str, at_str],
        )?;
        Ok(Some(n == 1))
      })
      .await?;

    inserted.ok_or(Error::ChapterNotFound(chapter_id))
  }

  async fn remove_read(&self, chapter_id: Uuid, user_id: Uuid) -> Result<bool> {
    let chapter_str = encode_uuid(chapter_id);
    let user_str = encode_uuid(user_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM reads WHERE chapter_id = ?1 AND user_id = ?2",
          params![chapter_str, user_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn favorite_chapter(&self, chapter_id: Uuid, user_id: Uuid) -> Result<FavoriteOutcome> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(favorite_chapter_tx(conn, chapter_id, user_id, now)))
      .await?
  }

  async fn unfavorite_chapter(&self, chapter_id: Uuid, user_id: Uuid) -> Result<bool> {
    let chapter_str = encode_uuid(chapter_id);
    let user_str = encode_uuid(user_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM chapter_favorites WHERE chapter_id = ?1 AND user_id = ?2",
          params![chapter_str, user_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn viewer_state(&self, chapter_id: Uuid, user_id: Uuid) -> Result<ViewerState> {
    let chapter_str = encode_uuid(chapter_id);
    let user_str = encode_uuid(user_id);
    let state = self
      .conn
      .call(move |conn| {
        let has_read = exists(
          conn,
          "SELECT 1 FROM reads WHERE chapter_id = ?1 AND user_id = ?2",
          params![chapter_str, user_str],
        )?;
        let has_favorited = exists(
          conn,
          "SELECT 1 FROM chapter_favorites WHERE chapter_id = ?1 AND user_id = ?2",
          params![chapter_str, user_str],
        )?;
        Ok(ViewerState { has_read, has_favorited })
      })
      .await?;
    Ok(state)
  }

  async fn favorite_character(
    &self,
    character_id: Uuid,
    user_id: Uuid,
  ) -> Result<FavoriteOutcome> {
    let character_str = encode_uuid(character_id);
    let user_str = encode_uuid(user_id);
    let now = Utc::now();
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(insert_character_interaction(
          conn,
          "character_favorites",
          &character_str,
          &user_str,
          now,
        )?)
      })
      .await?
      .ok_or(Error::CharacterNotFound(character_id))?;
    Ok(FavoriteOutcome::from_inserted(inserted))
  }

  async fn unfavorite_character(&self, character_id: Uuid, user_id: Uuid) -> Result<bool> {
    let character_str = encode_uuid(character_id);
    let user_str = encode_uuid(user_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM character_favorites WHERE character_id = ?1 AND user_id = ?2",
          params![character_str, user_str],
        )?)
      })
      .await?;
    Ok(removed > 0)
  }

  async fn has_favorited_character(&self, character_id: Uuid, user_id: Uuid) -> Result<bool> {
    let character_str = encode_uuid(character_id);
    let user_str = encode_uuid(user_id);
    let found = self
      .conn
      .call(move |conn| {
        Ok(exists(
          conn,
          "SELECT 1 FROM character_favorites WHERE character_id = ?1 AND user_id = ?2",
          params![character_str, user_str],
        )?)
      })
      .await?;
    Ok(found)
  }

  async fn record_character_view(&self, character_id: Uuid, user_id: Uuid) -> Result<bool> {
    let character_str = encode_uuid(character_id);
    let user_str = encode_uuid(user_id);
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        Ok(insert_character_interaction(
          conn,
          "character_views",
          &character_str,
          &user_str,
          now,
        )?)
      })
      .await?
      .ok_or(Error::CharacterNotFound(character_id))
  }

  async fn favorite_chapters(
    &self,
    user_id: Uuid,
    page: PageRequest,
  ) -> Result<Page<ChapterSummary>> {
    let count_sql = "SELECT COUNT(*)
       FROM chapter_favorites uf
       JOIN chapters c ON c.chapter_id = uf.chapter_id
       WHERE uf.user_id = ?1 AND c.status = 'published'"
      .to_owned();
    let page_sql = format!(
      "SELECT {CHAPTER_SUMMARY_COLUMNS}
       FROM chapter_favorites uf
       JOIN chapters c ON c.chapter_id = uf.chapter_id
       WHERE uf.user_id = ?1 AND c.status = 'published'
       ORDER BY uf.created_at DESC, c.sort_order DESC
       LIMIT ?2 OFFSET ?3"
    );

    let args = vec![Value::Text(encode_uuid(user_id))];
    let (total, raws) = self
      .paged(count_sql, page_sql, args, page, RawChapterSummary::from_row)
      .await?;
    let items = raws
      .into_iter()
      .map(RawChapterSummary::into_summary)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page { items, pagination: Pagination::new(total, page) })
  }

  async fn favorite_characters(
    &self,
    user_id: Uuid,
    page: PageRequest,
  ) -> Result<Page<CharacterSummary>> {
    let count_sql = "SELECT COUNT(*)
       FROM character_favorites ucf
       JOIN characters ch ON ch.character_id = ucf.character_id
       WHERE ucf.user_id = ?1 AND ch.is_published = 1"
      .to_owned();
    let page_sql = format!(
      "SELECT {CHARACTER_SUMMARY_COLUMNS}
       FROM character_favorites ucf
       JOIN characters ch ON ch.character_id = ucf.character_id
       WHERE ucf.user_id = ?1 AND ch.is_published = 1
       ORDER BY ucf.created_at DESC, ch.name COLLATE NOCASE
       LIMIT ?2 OFFSET ?3"
    );

    let args = vec![Value::Text(encode_uuid(user_id))];
    let (total, raws) = self
      .paged(count_sql, page_sql, args, page, RawCharacterSummary::from_row)
      .await?;
    let items = raws
      .into_iter()
      .map(RawCharacterSummary::into_summary)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page { items, pagination: Pagination::new(total, page) })
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn create_comment(&self, input: NewComment) -> Result<Comment> {
    validate_content(&input.content)?;
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(create_comment_tx(conn, input, now)))
      .await?
  }

  async fn get_comment(&self, comment_id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(comment_id);
    let raw = self
      .conn
      .call(move |conn| Ok(load_comment(conn, &id_str)?))
      .await?;
    raw.map(RawComment::into_comment).transpose()
  }

  async fn update_comment(&self, comment_id: Uuid, content: String) -> Result<Comment> {
    validate_content(&content)?;
    let id_str = encode_uuid(comment_id);
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE comments SET content = ?2, updated_at = ?3 WHERE comment_id = ?1",
          params![id_str, content, at_str],
        )?;
        if n == 0 {
          return Ok(None);
        }
        Ok(load_comment(conn, &id_str)?)
      })
      .await?;

    raw
      .ok_or(Error::CommentNotFound(comment_id))?
      .into_comment()
  }

  async fn delete_comment(&self, comment_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(comment_id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM comments WHERE comment_id = ?1", params![id_str])?)
      })
      .await?;

    if removed == 0 {
      return Err(Error::CommentNotFound(comment_id));
    }
    Ok(())
  }

  async fn chapter_comments(&self, chapter_id: Uuid) -> Result<Vec<Comment>> {
    let id_str = encode_uuid(chapter_id);
    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS}
           FROM comments m
           JOIN users u ON u.user_id = m.author_id
           WHERE m.chapter_id = ?1
           ORDER BY m.created_at, m.rowid"
        ))?;
        let rows = stmt
          .query_map(params![id_str], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn notify(
    &self,
    recipient_id: Uuid,
    content: NotificationContent,
  ) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      recipient_id,
      kind:            content.kind,
      message:         content.message,
      chapter_id:      content.chapter_id,
      comment_id:      content.comment_id,
      is_read:         false,
      created_at:      Utc::now(),
    };

    let id_str        = encode_uuid(notification.notification_id);
    let recipient_str = encode_uuid(recipient_id);
    let kind          = notification.kind.as_str();
    let message       = notification.message.clone();
    let chapter_str   = notification.chapter_id.map(encode_uuid);
    let comment_str   = notification.comment_id.map(encode_uuid);
    let at_str        = encode_dt(notification.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (
             notification_id, recipient_id, kind, message, chapter_id,
             comment_id, is_read, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
          params![id_str, recipient_str, kind, message, chapter_str, comment_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn notify_all(&self, except: Uuid, content: NotificationContent) -> Result<u64> {
    let now = Utc::now();
    self
      .conn
      .call(move |conn| Ok(notify_all_tx(conn, except, content, now)))
      .await?
  }

  async fn list_notifications(
    &self,
    user_id: Uuid,
    unread_only: bool,
    page: PageRequest,
  ) -> Result<Page<Notification>> {
    let count_sql = "SELECT COUNT(*) FROM notifications
       WHERE recipient_id = ?1 AND (?2 = 0 OR is_read = 0)"
      .to_owned();
    let page_sql = format!(
      "SELECT {NOTIFICATION_COLUMNS} FROM notifications
       WHERE recipient_id = ?1 AND (?2 = 0 OR is_read = 0)
       ORDER BY created_at DESC, rowid DESC
       LIMIT ?3 OFFSET ?4"
    );

    let args = vec![
      Value::Text(encode_uuid(user_id)),
      Value::Integer(i64::from(unread_only)),
    ];
    let (total, raws) = self
      .paged(count_sql, page_sql, args, page, RawNotification::from_row)
      .await?;
    let items = raws
      .into_iter()
      .map(RawNotification::into_notification)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page { items, pagination: Pagination::new(total, page) })
  }

  async fn unread_count(&self, user_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(user_id);
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
          params![id_str],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(u64::try_from(n).unwrap_or(0))
  }

  async fn mark_notification_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<()> {
    let user_str = encode_uuid(user_id);
    let id_str = encode_uuid(notification_id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1
           WHERE notification_id = ?1 AND recipient_id = ?2",
          params![id_str, user_str],
        )?)
      })
      .await?;

    if n == 0 {
      return Err(Error::NotificationNotFound(notification_id));
    }
    Ok(())
  }

  async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
    let user_str = encode_uuid(user_id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1 WHERE recipient_id = ?1 AND is_read = 0",
          params![user_str],
        )?)
      })
      .await?;
    Ok(n as u64)
  }
}
