use std::path::PathBuf;

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};

use splitter::config::Config;
use splitter::db::Repository;
use splitter::error::{AppError, Result};
use splitter::feed::FeedFetcher;
use splitter::ingest::{Fingerprinter, IngestMode, Ingestor};
use splitter::parser::ReleaseTitleParser;

/// Ingest a release announcement feed into per-series, per-language updates.
#[derive(Parser, Debug)]
#[command(name = "splitter", version, about)]
struct Cli {
    /// Config file (defaults to the user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database path, overriding the config file.
    #[arg(long, global = true, env = "SPLITTER_DB")]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the feed and store new updates.
    Ingest {
        /// Feed URL or local file, overriding BATOTO_FEED_URL and the config file.
        #[arg(long, env = "SPLITTER_FEED_URL")]
        feed: Option<String>,

        /// Evaluate every entry instead of stopping at the last stored one.
        #[arg(long)]
        force: bool,
    },
    /// Delete updates older than the retention period.
    Prune {
        /// Age in days, overriding the config file.
        #[arg(long)]
        older_than: Option<u32>,
    },
    /// Print the most recent updates of one series in one language as JSON.
    Recent {
        /// Language short code, e.g. "eng".
        #[arg(long)]
        lang: String,

        #[arg(long)]
        series: i64,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    let repository = Repository::new(&config.db_path).await?;

    match cli.command {
        Command::Ingest { feed, force } => {
            let location = config.feed_location(feed);
            let mode = if force {
                IngestMode::Force
            } else {
                IngestMode::Incremental
            };

            let fetcher = FeedFetcher::new(&config.user_agent)?;
            let ingestor = Ingestor::new(
                &repository,
                ReleaseTitleParser::new(),
                Fingerprinter::new(config.fingerprint_salt.clone()),
            );

            let report = match ingestor.run(&fetcher, &location, mode).await {
                Ok(report) => report,
                Err(e) => {
                    tracing::error!("Ingestion of {} failed: {}", location, e);
                    return Err(e);
                }
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Prune { older_than } => {
            let days = older_than.unwrap_or(config.retention_days);
            let cutoff = Utc::now()
                .checked_sub_signed(Duration::days(i64::from(days)))
                .ok_or_else(|| AppError::Config(format!("Retention of {} days is out of range", days)))?;

            let deleted = repository.prune_older_than(cutoff).await?;
            tracing::info!("Pruned {} updates older than {} days", deleted, days);
            println!("Deleted {} updates", deleted);
        }
        Command::Recent {
            lang,
            series,
            limit,
        } => {
            let updates = repository.recent_updates(&lang, series, limit).await?;
            println!("{}", serde_json::to_string_pretty(&updates)?);
        }
    }

    Ok(())
}
