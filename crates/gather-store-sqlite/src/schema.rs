//! SQL schema for the Gather SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,  -- trimmed + lowercased
    password_hash TEXT NOT NULL,         -- argon2 PHC string
    role          TEXT NOT NULL,         -- 'student' | 'organizer'
    photo         TEXT,                  -- stored name in the content directory
    created_at    TEXT NOT NULL
);

-- One row per event document. Likes and comments are embedded JSON arrays
-- and are rewritten together with the row.
CREATE TABLE IF NOT EXISTS events (
    event_id    TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    location    TEXT NOT NULL,
    starts_at   TEXT NOT NULL,
    category    TEXT,
    likes       TEXT NOT NULL DEFAULT '[]',  -- JSON array of user ids
    comments    TEXT NOT NULL DEFAULT '[]',  -- JSON array of Comment
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS users_role_idx    ON users(role);
CREATE INDEX IF NOT EXISTS events_owner_idx  ON events(owner_id);
CREATE INDEX IF NOT EXISTS events_starts_idx ON events(starts_at);

PRAGMA user_version = 1;
";
