//! Database schema and migrations for newsgrab.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded. The schema_version table tracks which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Chat users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    chat_id     TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: Tracked groups, one row per (owner, source, remote group)
    r#"
CREATE TABLE feed_groups (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    source_name     TEXT NOT NULL,
    remote_name     TEXT NOT NULL,
    last_sync_at    TEXT NOT NULL,           -- RFC3339, high-water mark for a cold cursor
    created_at      TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at      TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (user_id, source_name, remote_name)
);

CREATE INDEX idx_feed_groups_source_name ON feed_groups(source_name);
"#,
    // v3: Items already delivered; the unique key is what absorbs racing sweeps
    r#"
CREATE TABLE feed_items (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id        INTEGER NOT NULL REFERENCES feed_groups(id) ON DELETE CASCADE,
    remote_item_id  TEXT NOT NULL,
    source_name     TEXT NOT NULL,
    published_at    TEXT NOT NULL,           -- RFC3339, fixed width
    created_at      TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (group_id, remote_item_id)
);

CREATE INDEX idx_feed_items_group_published ON feed_items(group_id, published_at);
"#,
];
