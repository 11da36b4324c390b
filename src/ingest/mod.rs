//! Feed ingestion: entries in, series/language/update rows out.
//!
//! A run reads the cursor, fetches the feed, walks it newest-first until
//! the cursor entry (incremental mode) or the end (force mode), and then
//! writes the accepted entries oldest-first. Writing in that order makes
//! the newest entry of the feed the most recently stored row, i.e. the
//! next run's cursor, and means an interrupted run leaves only older
//! entries behind it.

mod fingerprint;

use serde::Serialize;

use crate::db::Repository;
use crate::error::Result;
use crate::feed::FeedSource;
use crate::models::{FeedEntry, NewUpdate, ReleaseTitle};
use crate::parser::TitleParser;

pub use fingerprint::Fingerprinter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestMode {
    /// Stop at the most recently stored entry.
    #[default]
    Incremental,
    /// Evaluate every entry; only the fingerprint constraint dedups.
    Force,
}

/// What a run did. Counts are per run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub entries_seen: usize,
    pub skipped_unparsed: usize,
    pub reached_cursor: bool,
    pub inserted: usize,
    pub duplicates: usize,
    pub series_created: usize,
    pub languages_created: usize,
}

struct Accepted {
    entry: FeedEntry,
    release: ReleaseTitle,
    fingerprint: String,
}

pub struct Ingestor<'a, P: TitleParser> {
    repository: &'a Repository,
    parser: P,
    fingerprinter: Fingerprinter,
}

impl<'a, P: TitleParser> Ingestor<'a, P> {
    pub fn new(repository: &'a Repository, parser: P, fingerprinter: Fingerprinter) -> Self {
        Self {
            repository,
            parser,
            fingerprinter,
        }
    }

    /// Fetch `location` from `source` and ingest it.
    pub async fn run<S: FeedSource>(
        &self,
        source: &S,
        location: &str,
        mode: IngestMode,
    ) -> Result<IngestReport> {
        let cursor = match mode {
            IngestMode::Incremental => self.repository.latest_fingerprint().await?,
            IngestMode::Force => None,
        };
        let entries = source.fetch(location).await?;

        let report = self.ingest_entries(entries, cursor.as_deref()).await?;
        tracing::info!(
            "Ingested {}: {} new, {} duplicate, {} skipped, {} seen{}",
            location,
            report.inserted,
            report.duplicates,
            report.skipped_unparsed,
            report.entries_seen,
            if report.reached_cursor { " (stopped at cursor)" } else { "" }
        );
        Ok(report)
    }

    /// Ingest already fetched entries, given in feed order. `cursor` is
    /// the boundary fingerprint, if any.
    pub async fn ingest_entries(
        &self,
        entries: Vec<FeedEntry>,
        cursor: Option<&str>,
    ) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut accepted = Vec::new();

        for entry in entries {
            report.entries_seen += 1;

            let release = match self.parser.parse(&entry.title) {
                Ok(release) => release,
                Err(failure) => {
                    tracing::warn!("Skipping entry {}: {}", entry.guid, failure);
                    report.skipped_unparsed += 1;
                    continue;
                }
            };

            let fingerprint = self.fingerprinter.fingerprint(&entry);
            if cursor == Some(fingerprint.as_str()) {
                tracing::debug!("Reached cursor at entry {}", entry.guid);
                report.reached_cursor = true;
                break;
            }

            accepted.push(Accepted {
                entry,
                release,
                fingerprint,
            });
        }

        for item in accepted.into_iter().rev() {
            self.store(item, &mut report).await?;
        }

        Ok(report)
    }

    async fn store(&self, item: Accepted, report: &mut IngestReport) -> Result<()> {
        let Accepted {
            entry,
            release,
            fingerprint,
        } = item;

        let series = self.repository.resolve_series(&release.series).await?;
        if series.created {
            tracing::info!("New series {:?} (id {})", release.series, series.id);
            report.series_created += 1;
        }

        let language = self.repository.resolve_language(&release.language).await?;
        if language.created {
            tracing::info!("New language {:?} (id {})", release.language, language.id);
            report.languages_created += 1;
        }

        let inserted = self
            .repository
            .insert_update_if_absent(NewUpdate {
                fingerprint,
                series_id: series.id,
                language_id: language.id,
                published_at: entry.published_at,
                chapter: release.chapter,
                chapter_title: release.chapter_title,
                link: entry.link,
            })
            .await?;

        if inserted {
            tracing::debug!("Stored entry {}", entry.guid);
            report.inserted += 1;
        } else {
            tracing::debug!("Entry {} already stored", entry.guid);
            report.duplicates += 1;
        }
        Ok(())
    }
}
