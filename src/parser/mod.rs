//! Release title grammars.
//!
//! The ingestor only sees the [`TitleParser`] trait, so a different
//! upstream title format is a new implementation here and nothing else.

mod release_title;

use thiserror::Error;

use crate::models::ReleaseTitle;

pub use release_title::ReleaseTitleParser;

/// The title did not match the grammar. Not fatal: the entry is skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("title does not match release grammar: {title:?}")]
pub struct ParseFailure {
    pub title: String,
}

pub trait TitleParser {
    fn parse(&self, title: &str) -> std::result::Result<ReleaseTitle, ParseFailure>;
}
