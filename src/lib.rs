//! Splits a release announcement feed into normalized series, language and
//! update rows.
//!
//! ```text
//! FeedSource -> TitleParser -> Fingerprinter -> Repository
//!                      \___________ Ingestor ___________/
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod models;
pub mod parser;
