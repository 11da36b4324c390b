use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields captured from a release title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseTitle {
    pub series: String,
    pub language: String,
    pub chapter: String,
    pub chapter_title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: i64,
    pub full_name: String,
    pub short_code: String,
}

impl Language {
    /// Lower-cased name cut to three characters. Only computed when the
    /// row is created.
    pub fn short_code_for(full_name: &str) -> String {
        full_name.to_lowercase().chars().take(3).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub id: i64,
    pub title: String,
}

/// Outcome of a get-or-create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub id: i64,
    pub created: bool,
}

/// Fact row about to be written.
#[derive(Debug, Clone)]
pub struct NewUpdate {
    pub fingerprint: String,
    pub series_id: i64,
    pub language_id: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub chapter: String,
    pub chapter_title: String,
    pub link: String,
}

/// A stored update joined with its series title and language name, as
/// handed to feed renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateView {
    pub id: i64,
    pub series_id: i64,
    pub series_title: String,
    pub language: String,
    pub language_short_code: String,
    pub fingerprint: String,
    pub published_at: Option<DateTime<Utc>>,
    pub chapter: String,
    pub chapter_title: String,
    pub link: String,
    pub creation_time: DateTime<Utc>,
}
