use thiserror::Error;

/// Fatal errors of a run. Title parse failures are not in here, see
/// [`crate::parser::ParseFailure`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Storage errors surfaced by the connection thread
    #[error("Storage error: {0}")]
    Storage(#[from] tokio_rusqlite::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    FeedParse(#[from] feed_rs::parser::ParseFeedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Feed could not be retrieved (bad status, unsupported location)
    #[error("Fetch error: {0}")]
    Fetch(#[from] anyhow::Error),
}

impl AppError {
    /// True for failures that happened while obtaining the feed.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            AppError::Http(_) | AppError::Fetch(_) | AppError::FeedParse(_) | AppError::Io(_)
        )
    }

    /// True for failures raised by the store.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, AppError::Storage(_) | AppError::Database(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
