use std::path::PathBuf;

use feed_rs::parser;
use reqwest::Client;
use url::Url;

use crate::error::Result;
use crate::models::FeedEntry;

pub const DEFAULT_USER_AGENT: &str = "splitter/1.0";

/// Anything that can produce the upstream entries, newest first.
///
/// Implementations must fail rather than return a short list: an empty
/// result means "nothing in the feed", not "could not read the feed".
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    async fn fetch(&self, location: &str) -> Result<Vec<FeedEntry>>;
}

/// Reads feeds over HTTP(S), or from disk for `file://` URLs and plain
/// paths. No timeout or retry: that is up to whoever schedules the run.
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed {}: HTTP {}", url, response.status()).into());
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn fetch_file(&self, path: PathBuf) -> Result<Vec<u8>> {
        let bytes = tokio::fs::read(&path).await?;
        Ok(bytes)
    }
}

impl FeedSource for FeedFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<FeedEntry>> {
        let bytes = match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => self.fetch_http(location).await?,
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| anyhow::anyhow!("Not a local path: {}", location))?;
                self.fetch_file(path).await?
            }
            // Windows drive letters parse as one-letter schemes
            Ok(url) if url.scheme().len() == 1 => self.fetch_file(PathBuf::from(location)).await?,
            Ok(url) => {
                return Err(anyhow::anyhow!("Unsupported feed scheme: {}", url.scheme()).into())
            }
            Err(_) => self.fetch_file(PathBuf::from(location)).await?,
        };

        let entries = parse_entries(&bytes)?;
        tracing::debug!("Fetched {} entries from {}", entries.len(), location);
        Ok(entries)
    }
}

/// Decode an RSS/Atom document, keeping the document's entry order.
pub fn parse_entries(bytes: &[u8]) -> Result<Vec<FeedEntry>> {
    let feed = parser::parse(bytes)?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| FeedEntry {
            guid: entry.id,
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            link: entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default(),
            published_at: entry.published.or(entry.updated),
        })
        .collect();

    Ok(entries)
}
