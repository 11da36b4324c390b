use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{Language, NewUpdate, Resolved, Series, UpdateView};

use super::schema::SCHEMA;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SQLite store for series, languages and updates.
///
/// Every method is one `call` on the connection thread and commits on its
/// own; there is no transaction spanning a whole ingestion run.
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::with_schema(conn).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::with_schema(conn).await
    }

    async fn with_schema(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Reference entities

    /// Get-or-create a series by title. Insert-or-ignore followed by a
    /// lookup on the natural key, so there is no window between the two.
    pub async fn resolve_series(&self, title: &str) -> Result<Resolved> {
        let title = title.to_string();
        let resolved = self
            .conn
            .call(move |conn| {
                let inserted = conn.execute(
                    "INSERT INTO series (title) VALUES (?1) ON CONFLICT(title) DO NOTHING",
                    params![title],
                )?;
                let id = conn.query_row(
                    "SELECT id FROM series WHERE title = ?1",
                    params![title],
                    |row| row.get(0),
                )?;
                Ok(Resolved {
                    id,
                    created: inserted > 0,
                })
            })
            .await?;
        Ok(resolved)
    }

    /// Get-or-create a language by full name. The short code is derived
    /// here and only ever written by the insert.
    pub async fn resolve_language(&self, full_name: &str) -> Result<Resolved> {
        let full_name = full_name.to_string();
        let short_code = Language::short_code_for(&full_name);
        let resolved = self
            .conn
            .call(move |conn| {
                let inserted = conn.execute(
                    r#"INSERT INTO languages (full_name, short_code) VALUES (?1, ?2)
                       ON CONFLICT(full_name) DO NOTHING"#,
                    params![full_name, short_code],
                )?;
                let id = conn.query_row(
                    "SELECT id FROM languages WHERE full_name = ?1",
                    params![full_name],
                    |row| row.get(0),
                )?;
                Ok(Resolved {
                    id,
                    created: inserted > 0,
                })
            })
            .await?;
        Ok(resolved)
    }

    pub async fn find_series(&self, title: &str) -> Result<Option<Series>> {
        let title = title.to_string();
        let series = self
            .conn
            .call(move |conn| {
                let series = conn
                    .query_row(
                        "SELECT id, title FROM series WHERE title = ?1",
                        params![title],
                        series_from_row,
                    )
                    .optional()?;
                Ok(series)
            })
            .await?;
        Ok(series)
    }

    pub async fn find_language(&self, full_name: &str) -> Result<Option<Language>> {
        let full_name = full_name.to_string();
        let language = self
            .conn
            .call(move |conn| {
                let language = conn
                    .query_row(
                        "SELECT id, full_name, short_code FROM languages WHERE full_name = ?1",
                        params![full_name],
                        language_from_row,
                    )
                    .optional()?;
                Ok(language)
            })
            .await?;
        Ok(language)
    }

    // Update operations

    /// Insert the fact row unless its fingerprint is already stored.
    /// Returns whether a row was written.
    pub async fn insert_update_if_absent(&self, update: NewUpdate) -> Result<bool> {
        let inserted = self
            .conn
            .call(move |conn| {
                let changed = conn.execute(
                    r#"INSERT INTO updates (series_id, language_id, fingerprint, published_at,
                                            chapter, chapter_title, link)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                       ON CONFLICT(fingerprint) DO NOTHING"#,
                    params![
                        update.series_id,
                        update.language_id,
                        update.fingerprint,
                        update.published_at.map(format_timestamp),
                        update.chapter,
                        update.chapter_title,
                        update.link,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await?;
        Ok(inserted)
    }

    /// Fingerprint of the most recently stored update. Ordered by rowid,
    /// which only grows, so wall clock changes cannot move the cursor.
    pub async fn latest_fingerprint(&self) -> Result<Option<String>> {
        let fingerprint = self
            .conn
            .call(|conn| {
                let fingerprint = conn
                    .query_row(
                        "SELECT fingerprint FROM updates ORDER BY id DESC LIMIT 1",
                        [],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(fingerprint)
            })
            .await?;
        Ok(fingerprint)
    }

    pub async fn contains_fingerprint(&self, fingerprint: &str) -> Result<bool> {
        let fingerprint = fingerprint.to_string();
        let exists = self
            .conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM updates WHERE fingerprint = ?1",
                    params![fingerprint],
                    |row| row.get(0),
                )?;
                Ok(count > 0)
            })
            .await?;
        Ok(exists)
    }

    /// Most recent updates of one series in one language, newest stored
    /// first, joined with the names a renderer needs.
    pub async fn recent_updates(
        &self,
        language_short_code: &str,
        series_id: i64,
        limit: usize,
    ) -> Result<Vec<UpdateView>> {
        let short_code = language_short_code.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let updates = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    r#"SELECT u.id, u.series_id, s.title, l.full_name, l.short_code, u.fingerprint,
                              u.published_at, u.chapter, u.chapter_title, u.link, u.creation_time
                       FROM updates u
                       JOIN series s ON u.series_id = s.id
                       JOIN languages l ON u.language_id = l.id
                       WHERE l.short_code = ?1 AND u.series_id = ?2
                       ORDER BY u.creation_time DESC, u.id DESC
                       LIMIT ?3"#,
                )?;
                let updates = stmt
                    .query_map(params![short_code, series_id, limit], update_view_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(updates)
            })
            .await?;
        Ok(updates)
    }

    /// Retention: drop updates published before `cutoff`. Rows without a
    /// published time age by their creation time instead.
    pub async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let cutoff = format_timestamp(cutoff);
        let deleted = self
            .conn
            .call(move |conn| {
                let deleted = conn.execute(
                    "DELETE FROM updates WHERE DATETIME(COALESCE(published_at, creation_time)) < DATETIME(?1)",
                    params![cutoff],
                )?;
                Ok(deleted)
            })
            .await?;
        Ok(deleted)
    }

    // Counts

    pub async fn update_count(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM updates").await
    }

    pub async fn series_count(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM series").await
    }

    pub async fn language_count(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM languages").await
    }

    async fn count(&self, sql: &'static str) -> Result<i64> {
        let count = self
            .conn
            .call(move |conn| {
                let count = conn.query_row(sql, [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count)
    }
}

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // SQLite datetime, optionally with fractional seconds (e.g., "2026-01-11 12:34:56.789")
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    // Try RFC3339 (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(s) => parse_datetime(&s).map(Some).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Text,
                format!("invalid timestamp {:?}", s).into(),
            )
        }),
    }
}

fn series_from_row(row: &Row) -> rusqlite::Result<Series> {
    Ok(Series {
        id: row.get(0)?,
        title: row.get(1)?,
    })
}

fn language_from_row(row: &Row) -> rusqlite::Result<Language> {
    Ok(Language {
        id: row.get(0)?,
        full_name: row.get(1)?,
        short_code: row.get(2)?,
    })
}

fn update_view_from_row(row: &Row) -> rusqlite::Result<UpdateView> {
    Ok(UpdateView {
        id: row.get(0)?,
        series_id: row.get(1)?,
        series_title: row.get(2)?,
        language: row.get(3)?,
        language_short_code: row.get(4)?,
        fingerprint: row.get(5)?,
        published_at: timestamp_column(row, 6)?,
        chapter: row.get(7)?,
        chapter_title: row.get(8)?,
        link: row.get(9)?,
        creation_time: timestamp_column(row, 10)?
            .ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(10, "creation_time".to_string(), Type::Null)
            })?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    use super::*;

    fn new_update(fingerprint: &str, series_id: i64, language_id: i64) -> NewUpdate {
        NewUpdate {
            fingerprint: fingerprint.to_string(),
            series_id,
            language_id,
            published_at: None,
            chapter: "Ch.1".to_string(),
            chapter_title: "Start".to_string(),
            link: "http://example.com/1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolve_series_is_stable() {
        let repo = Repository::open_in_memory().await.unwrap();

        let first = repo.resolve_series("One Piece").await.unwrap();
        let second = repo.resolve_series("One Piece").await.unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.id, second.id);
        assert_eq!(repo.series_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_resolve_series_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("updates.db");
        let db_path = db_path.to_str().unwrap();

        let id = {
            let repo = Repository::new(db_path).await.unwrap();
            repo.resolve_series("Berserk").await.unwrap().id
        };

        let repo = Repository::new(db_path).await.unwrap();
        let resolved = repo.resolve_series("Berserk").await.unwrap();
        assert_eq!(resolved.id, id);
        assert!(!resolved.created);
    }

    #[tokio::test]
    async fn test_resolve_language_derives_short_code_once() {
        let repo = Repository::open_in_memory().await.unwrap();

        let resolved = repo.resolve_language("English").await.unwrap();
        assert!(resolved.created);

        let language = repo.find_language("English").await.unwrap().unwrap();
        assert_eq!(language.id, resolved.id);
        assert_eq!(language.short_code, "eng");

        let again = repo.resolve_language("English").await.unwrap();
        assert_eq!(again, Resolved { id: resolved.id, created: false });
        assert_eq!(repo.language_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_insert_update_if_absent() {
        let repo = Repository::open_in_memory().await.unwrap();
        let series = repo.resolve_series("One Piece").await.unwrap();
        let language = repo.resolve_language("English").await.unwrap();

        let inserted = repo
            .insert_update_if_absent(new_update("abc", series.id, language.id))
            .await
            .unwrap();
        assert!(inserted);

        let inserted = repo
            .insert_update_if_absent(new_update("abc", series.id, language.id))
            .await
            .unwrap();
        assert!(!inserted);
        assert_eq!(repo.update_count().await.unwrap(), 1);
        assert!(repo.contains_fingerprint("abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_update_requires_existing_series() {
        let repo = Repository::open_in_memory().await.unwrap();
        let language = repo.resolve_language("English").await.unwrap();

        let err = repo
            .insert_update_if_absent(new_update("abc", 999, language.id))
            .await
            .unwrap_err();
        assert!(err.is_storage_failure());
        assert_eq!(repo.update_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_latest_fingerprint_follows_insert_order() {
        let repo = Repository::open_in_memory().await.unwrap();
        assert_eq!(repo.latest_fingerprint().await.unwrap(), None);

        let series = repo.resolve_series("One Piece").await.unwrap();
        let language = repo.resolve_language("English").await.unwrap();

        // published_at is deliberately reversed against insert order
        let mut older = new_update("first", series.id, language.id);
        older.published_at = Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
        let mut newer = new_update("second", series.id, language.id);
        newer.published_at = Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());

        repo.insert_update_if_absent(older).await.unwrap();
        repo.insert_update_if_absent(newer).await.unwrap();

        assert_eq!(
            repo.latest_fingerprint().await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_cursor_ignores_clock_going_backwards() {
        let repo = Repository::open_in_memory().await.unwrap();
        let series = repo.resolve_series("One Piece").await.unwrap();
        let language = repo.resolve_language("English").await.unwrap();

        repo.insert_update_if_absent(new_update("first", series.id, language.id))
            .await
            .unwrap();
        repo.insert_update_if_absent(new_update("second", series.id, language.id))
            .await
            .unwrap();

        repo.conn
            .call(|conn| {
                conn.execute(
                    "UPDATE updates SET creation_time = '2001-01-01 00:00:00.000' WHERE fingerprint = 'second'",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(
            repo.latest_fingerprint().await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_unreadable_timestamp_is_a_storage_error() {
        let repo = Repository::open_in_memory().await.unwrap();
        let series = repo.resolve_series("One Piece").await.unwrap();
        let language = repo.resolve_language("English").await.unwrap();
        repo.insert_update_if_absent(new_update("abc", series.id, language.id))
            .await
            .unwrap();

        repo.conn
            .call(|conn| {
                conn.execute("UPDATE updates SET creation_time = 'yesterday'", [])?;
                Ok(())
            })
            .await
            .unwrap();

        let err = repo.recent_updates("eng", series.id, 10).await.unwrap_err();
        assert!(err.is_storage_failure());
    }

    #[tokio::test]
    async fn test_recent_updates_filters_and_orders() {
        let repo = Repository::open_in_memory().await.unwrap();
        let one_piece = repo.resolve_series("One Piece").await.unwrap();
        let berserk = repo.resolve_series("Berserk").await.unwrap();
        let english = repo.resolve_language("English").await.unwrap();
        let spanish = repo.resolve_language("Spanish").await.unwrap();

        for (fp, series, language) in [
            ("a", one_piece.id, english.id),
            ("b", one_piece.id, spanish.id),
            ("c", berserk.id, english.id),
            ("d", one_piece.id, english.id),
            ("e", one_piece.id, english.id),
        ] {
            repo.insert_update_if_absent(new_update(fp, series, language))
                .await
                .unwrap();
        }

        let recent = repo.recent_updates("eng", one_piece.id, 2).await.unwrap();
        let fingerprints: Vec<_> = recent.iter().map(|u| u.fingerprint.as_str()).collect();
        assert_eq!(fingerprints, vec!["e", "d"]);
        assert!(recent.iter().all(|u| u.series_title == "One Piece"));
        assert!(recent.iter().all(|u| u.language == "English"));

        let all = repo.recent_updates("eng", one_piece.id, 10).await.unwrap();
        assert_eq!(all.len(), 3);

        let none = repo.recent_updates("fre", one_piece.id, 10).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_published_at_round_trips() {
        let repo = Repository::open_in_memory().await.unwrap();
        let series = repo.resolve_series("One Piece").await.unwrap();
        let language = repo.resolve_language("English").await.unwrap();
        let published = Utc.with_ymd_and_hms(2026, 3, 14, 15, 9, 26).unwrap();

        let mut update = new_update("abc", series.id, language.id);
        update.published_at = Some(published);
        repo.insert_update_if_absent(update).await.unwrap();

        let recent = repo.recent_updates("eng", series.id, 1).await.unwrap();
        assert_eq!(recent[0].published_at, Some(published));
    }

    #[tokio::test]
    async fn test_prune_older_than() {
        let repo = Repository::open_in_memory().await.unwrap();
        let series = repo.resolve_series("One Piece").await.unwrap();
        let language = repo.resolve_language("English").await.unwrap();
        let now = Utc::now();

        let mut old = new_update("old", series.id, language.id);
        old.published_at = Some(now - Duration::days(45));
        let mut fresh = new_update("fresh", series.id, language.id);
        fresh.published_at = Some(now - Duration::days(2));
        let undated = new_update("undated", series.id, language.id);

        for update in [old, fresh, undated] {
            repo.insert_update_if_absent(update).await.unwrap();
        }

        let deleted = repo.prune_older_than(now - Duration::days(30)).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(!repo.contains_fingerprint("old").await.unwrap());
        assert!(repo.contains_fingerprint("fresh").await.unwrap());
        assert!(repo.contains_fingerprint("undated").await.unwrap());
        // reference rows are never pruned
        assert_eq!(repo.series_count().await.unwrap(), 1);
    }
}
