mod fetcher;

pub use fetcher::{parse_entries, FeedFetcher, FeedSource, DEFAULT_USER_AGENT};
