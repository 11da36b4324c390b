use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw item of the upstream feed, in the shape the ingestor consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    pub guid: String,
    pub link: String,
    /// Upstream supplied; never used for ordering.
    pub published_at: Option<DateTime<Utc>>,
}

impl FeedEntry {
    pub fn new(title: impl Into<String>, guid: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            guid: guid.into(),
            link: String::new(),
            published_at: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}
