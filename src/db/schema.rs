pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- languages table
CREATE TABLE IF NOT EXISTS languages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name TEXT NOT NULL UNIQUE,
    short_code TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_languages_short_code ON languages(short_code);

-- series table
CREATE TABLE IF NOT EXISTS series (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE
);

-- updates table (one row per ingested feed entry)
CREATE TABLE IF NOT EXISTS updates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    series_id INTEGER NOT NULL REFERENCES series(id),
    language_id INTEGER NOT NULL REFERENCES languages(id),
    fingerprint TEXT NOT NULL UNIQUE,
    published_at TEXT,
    chapter TEXT NOT NULL,
    chapter_title TEXT NOT NULL,
    link TEXT NOT NULL,
    creation_time TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_updates_creation_time ON updates(creation_time DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_updates_series_language ON updates(series_id, language_id);
CREATE INDEX IF NOT EXISTS idx_updates_published_at ON updates(published_at);
"#;
