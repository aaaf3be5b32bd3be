//! SQL DDL for the `users` and `startups` tables.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `users.email` and `users.auth_id` UNIQUE
/// - `users.role` free text, defaulting to `user`
/// - `startups.user_id` TEXT holding the owner's provider identity
/// - timestamps stored as RFC3339 text, dates as `YYYY-MM-DD`
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    auth_id TEXT NOT NULL UNIQUE,
    role TEXT NOT NULL DEFAULT 'user'
);

CREATE TABLE IF NOT EXISTS startups (
    startup_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT NULL,
    founder TEXT NULL,
    industry TEXT NULL,
    founded_date TEXT NULL, -- YYYY-MM-DD
    status TEXT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NULL, -- RFC3339
    user_id TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_startups_user_id ON startups(user_id);
"#;
