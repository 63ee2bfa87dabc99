//! SQL schema for the Rolodex SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,   -- case-sensitive
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- Only the SHA-256 digest of a session token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

-- AUTOINCREMENT keeps ids of deleted clients from being reused.
CREATE TABLE IF NOT EXISTS clients (
    client_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id   TEXT NOT NULL REFERENCES users(user_id),
    first_name TEXT NOT NULL,
    last_name  TEXT NOT NULL,
    email      TEXT NOT NULL,
    phone      TEXT NOT NULL,
    street     TEXT NOT NULL,
    city       TEXT NOT NULL,
    province   TEXT NOT NULL,
    country    TEXT NOT NULL,
    created_at TEXT NOT NULL,   -- ISO 8601 UTC; set once
    updated_at TEXT NOT NULL    -- ISO 8601 UTC; refreshed on update
);

CREATE INDEX IF NOT EXISTS clients_owner_idx    ON clients(owner_id);
CREATE INDEX IF NOT EXISTS sessions_expires_idx ON sessions(expires_at);

PRAGMA user_version = 1;
";
