//! SQL schema for the Folio SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    is_admin      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chapters (
    chapter_id   TEXT PRIMARY KEY,
    author_id    TEXT NOT NULL REFERENCES users(user_id),
    sort_order   INTEGER NOT NULL UNIQUE,
    title        TEXT NOT NULL,
    slug         TEXT NOT NULL UNIQUE,
    content      TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'draft',   -- 'draft' | 'published' | 'archived'
    word_count   INTEGER NOT NULL DEFAULT 0,
    published_at TEXT,                            -- set once, on first publish
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS characters (
    character_id TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    slug         TEXT NOT NULL UNIQUE,
    summary      TEXT NOT NULL DEFAULT '',
    biography    TEXT NOT NULL DEFAULT '',
    image_url    TEXT,
    is_published INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chapter_characters (
    chapter_id      TEXT NOT NULL REFERENCES chapters(chapter_id) ON DELETE CASCADE,
    character_id    TEXT NOT NULL REFERENCES characters(character_id) ON DELETE CASCADE,
    appearance_type TEXT NOT NULL CHECK (appearance_type IN ('POV', 'APPEARANCE', 'MENTION')),
    PRIMARY KEY (chapter_id, character_id)
);

-- At most one POV character per chapter.
CREATE UNIQUE INDEX IF NOT EXISTS chapter_characters_pov_idx
    ON chapter_characters(chapter_id) WHERE appearance_type = 'POV';

-- Interaction records: one row per (resource, user).
CREATE TABLE IF NOT EXISTS reads (
    chapter_id TEXT NOT NULL REFERENCES chapters(chapter_id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (chapter_id, user_id)
);

CREATE TABLE IF NOT EXISTS chapter_favorites (
    chapter_id TEXT NOT NULL REFERENCES chapters(chapter_id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    PRIMARY KEY (chapter_id, user_id)
);

CREATE TABLE IF NOT EXISTS character_favorites (
    character_id TEXT NOT NULL REFERENCES characters(character_id) ON DELETE CASCADE,
    user_id      TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at   TEXT NOT NULL,
    PRIMARY KEY (character_id, user_id)
);

CREATE TABLE IF NOT EXISTS character_views (
    character_id TEXT NOT NULL REFERENCES characters(character_id) ON DELETE CASCADE,
    user_id      TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at   TEXT NOT NULL,
    PRIMARY KEY (character_id, user_id)
);

-- Replies cascade with their parent.
CREATE TABLE IF NOT EXISTS comments (
    comment_id TEXT PRIMARY KEY,
    chapter_id TEXT NOT NULL REFERENCES chapters(chapter_id) ON DELETE CASCADE,
    author_id  TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    parent_id  TEXT REFERENCES comments(comment_id) ON DELETE CASCADE,
    depth      INTEGER NOT NULL CHECK (depth >= 1),
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Links are informational; a deleted chapter leaves its notifications behind.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    recipient_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    kind            TEXT NOT NULL,
    message         TEXT NOT NULL,
    chapter_id      TEXT,
    comment_id      TEXT,
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS chapters_published_idx     ON chapters(published_at);
CREATE INDEX IF NOT EXISTS comments_chapter_idx       ON comments(chapter_id);
CREATE INDEX IF NOT EXISTS comments_parent_idx        ON comments(parent_id);
CREATE INDEX IF NOT EXISTS reads_user_idx             ON reads(user_id);
CREATE INDEX IF NOT EXISTS chapter_favorites_user_idx ON chapter_favorites(user_id);
CREATE INDEX IF NOT EXISTS notifications_recipient_idx
    ON notifications(recipient_id, created_at);

PRAGMA user_version = 1;
";
