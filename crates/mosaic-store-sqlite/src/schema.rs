//! SQL schema for the Memory Mosaic SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id         TEXT PRIMARY KEY,
    external_id     TEXT NOT NULL UNIQUE,   -- provider subject id
    name            TEXT NOT NULL,
    email           TEXT NOT NULL,
    profile_picture TEXT,
    created_at      TEXT NOT NULL
);

-- One row per person document. Memories and their comments are embedded in
-- `document`; they have no rows of their own.
-- `seq` preserves insertion order for listings.
CREATE TABLE IF NOT EXISTS people (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id  TEXT NOT NULL UNIQUE,
    user_id    TEXT NOT NULL REFERENCES users(user_id),
    document   TEXT NOT NULL        -- JSON-encoded Person
);

CREATE INDEX IF NOT EXISTS people_user_idx ON people(user_id, seq);

PRAGMA user_version = 1;
";
