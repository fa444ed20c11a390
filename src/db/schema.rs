//! Database schema and migrations for Folo-Lite.
//!
//! Migrations are applied in order by [`Database::migrate`](super::Database::migrate);
//! the `schema_version` table records which ones have run. Timestamps are
//! stored as RFC 3339 UTC text on both backends so that lexical order matches
//! chronological order.

/// Database migrations (SQLite).
#[cfg(feature = "sqlite")]
pub const MIGRATIONS: &[&str] = &[
    // v1: feeds and articles
    r#"
CREATE TABLE feeds (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    url             TEXT NOT NULL UNIQUE,
    title           TEXT NOT NULL,
    site_link       TEXT NOT NULL DEFAULT '',
    last_fetched_at TEXT,
    created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
);

CREATE TABLE articles (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    feed_id      INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    external_id  TEXT NOT NULL,
    title        TEXT NOT NULL,
    content      TEXT NOT NULL DEFAULT '',
    url          TEXT NOT NULL DEFAULT '',
    published_at TEXT NOT NULL,
    created_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    UNIQUE (feed_id, external_id)
);

CREATE INDEX idx_articles_feed_published ON articles(feed_id, published_at DESC);
"#,
    // v2: per-user subscriptions and article state
    r#"
CREATE TABLE subscriptions (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    TEXT NOT NULL,
    feed_id    INTEGER NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    UNIQUE (user_id, feed_id)
);

CREATE TABLE user_article_states (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    TEXT NOT NULL,
    article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    is_read    INTEGER NOT NULL DEFAULT 0,
    is_saved   INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    UNIQUE (user_id, article_id)
);

CREATE INDEX idx_subscriptions_user ON subscriptions(user_id);
"#,
    // v3: fetch error tracking for the sweep worker
    r#"
ALTER TABLE feeds ADD COLUMN error_count INTEGER NOT NULL DEFAULT 0;
ALTER TABLE feeds ADD COLUMN last_error TEXT;
"#,
];

/// Database migrations (PostgreSQL).
#[cfg(feature = "postgres")]
pub const MIGRATIONS: &[&str] = &[
    // v1: feeds and articles
    r#"
CREATE TABLE feeds (
    id              BIGSERIAL PRIMARY KEY,
    url             TEXT NOT NULL UNIQUE,
    title           TEXT NOT NULL,
    site_link       TEXT NOT NULL DEFAULT '',
    last_fetched_at TEXT,
    created_at      TEXT NOT NULL DEFAULT to_char(NOW() AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"')
);

CREATE TABLE articles (
    id           BIGSERIAL PRIMARY KEY,
    feed_id      BIGINT NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    external_id  TEXT NOT NULL,
    title        TEXT NOT NULL,
    content      TEXT NOT NULL DEFAULT '',
    url          TEXT NOT NULL DEFAULT '',
    published_at TEXT NOT NULL,
    created_at   TEXT NOT NULL DEFAULT to_char(NOW() AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"'),
    UNIQUE (feed_id, external_id)
);

CREATE INDEX idx_articles_feed_published ON articles(feed_id, published_at DESC);
"#,
    // v2: per-user subscriptions and article state
    r#"
CREATE TABLE subscriptions (
    id         BIGSERIAL PRIMARY KEY,
    user_id    TEXT NOT NULL,
    feed_id    BIGINT NOT NULL REFERENCES feeds(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL DEFAULT to_char(NOW() AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"'),
    UNIQUE (user_id, feed_id)
);

CREATE TABLE user_article_states (
    id         BIGSERIAL PRIMARY KEY,
    user_id    TEXT NOT NULL,
    article_id BIGINT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    is_read    BOOLEAN NOT NULL DEFAULT FALSE,
    is_saved   BOOLEAN NOT NULL DEFAULT FALSE,
    updated_at TEXT NOT NULL,
    UNIQUE (user_id, article_id)
);

CREATE INDEX idx_subscriptions_user ON subscriptions(user_id);
"#,
    // v3: fetch error tracking for the sweep worker
    r#"
ALTER TABLE feeds ADD COLUMN error_count INTEGER NOT NULL DEFAULT 0;
ALTER TABLE feeds ADD COLUMN last_error TEXT;
"#,
];
