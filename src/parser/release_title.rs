use regex::Regex;

use crate::models::ReleaseTitle;

use super::{ParseFailure, TitleParser};

// <series> - <Language> - [Vol.<tok> ]Ch.<tok>[ <num>][:] <chapter title>
const RELEASE_TITLE_PATTERN: &str = r"^(?P<series>.*) - (?P<lang>[A-Z][a-z]+) - (?P<chapter>(?:Vol\.[\w.]+ )?Ch\.[\w.]+(?: [\d.]+)?):? (?P<chapter_title>.*)$";

/// Parser for `"<series> - <language> - <chapter-spec>: <chapter-title>"`.
pub struct ReleaseTitleParser {
    pattern: Regex,
}

impl ReleaseTitleParser {
    pub fn new() -> Self {
        let pattern = Regex::new(RELEASE_TITLE_PATTERN).expect("release title pattern is valid");
        Self { pattern }
    }
}

impl Default for ReleaseTitleParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TitleParser for ReleaseTitleParser {
    fn parse(&self, title: &str) -> Result<ReleaseTitle, ParseFailure> {
        let caps = self.pattern.captures(title).ok_or_else(|| ParseFailure {
            title: title.to_string(),
        })?;

        Ok(ReleaseTitle {
            series: caps["series"].to_string(),
            language: caps["lang"].to_string(),
            chapter: caps["chapter"].to_string(),
            chapter_title: caps["chapter_title"].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(title: &str) -> Result<ReleaseTitle, ParseFailure> {
        ReleaseTitleParser::new().parse(title)
    }

    #[test]
    fn test_volume_and_chapter() {
        let release = parse("One Piece - English - Vol.90 Ch.1043: Arrival").unwrap();
        assert_eq!(release.series, "One Piece");
        assert_eq!(release.language, "English");
        assert_eq!(release.chapter, "Vol.90 Ch.1043");
        assert_eq!(release.chapter_title, "Arrival");
    }

    #[test]
    fn test_dotted_chapter_without_volume() {
        let release = parse("Berserk - Spanish - Ch.12.5: Interlude").unwrap();
        assert_eq!(release.chapter, "Ch.12.5");
        assert_eq!(release.chapter_title, "Interlude");
    }

    #[test]
    fn test_volume_with_dotted_chapter() {
        let release = parse("Vagabond - French - Vol.3 Ch.12.5: The Duel").unwrap();
        assert_eq!(release.chapter, "Vol.3 Ch.12.5");
        assert_eq!(release.chapter_title, "The Duel");
    }

    #[test]
    fn test_part_suffix() {
        let release = parse("Monster - English - Ch.Part 4: Ruhenheim").unwrap();
        assert_eq!(release.chapter, "Ch.Part 4");
        assert_eq!(release.chapter_title, "Ruhenheim");
    }

    #[test]
    fn test_alphanumeric_chapter() {
        let release = parse("Blame - English - Ch.7a: Extra").unwrap();
        assert_eq!(release.chapter, "Ch.7a");
    }

    #[test]
    fn test_colon_is_optional() {
        let release = parse("Akira - English - Ch.3 Tetsuo").unwrap();
        assert_eq!(release.chapter, "Ch.3");
        assert_eq!(release.chapter_title, "Tetsuo");
    }

    #[test]
    fn test_empty_chapter_title() {
        let release = parse("Akira - English - Ch.4: ").unwrap();
        assert_eq!(release.chapter, "Ch.4");
        assert_eq!(release.chapter_title, "");
    }

    #[test]
    fn test_series_containing_separator() {
        let release = parse("Re:Zero - Arc 2 - English - Ch.10: Loop").unwrap();
        assert_eq!(release.series, "Re:Zero - Arc 2");
        assert_eq!(release.language, "English");
    }

    #[test]
    fn test_fields_are_not_trimmed() {
        let release = parse(" Spaced  - English - Ch.1:  Two spaces").unwrap();
        assert_eq!(release.series, " Spaced ");
        assert_eq!(release.chapter_title, " Two spaces");
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = parse("garbage text").unwrap_err();
        assert_eq!(err.title, "garbage text");
    }

    #[test]
    fn test_lowercase_language_is_rejected() {
        assert!(parse("One Piece - english - Ch.1: Start").is_err());
    }

    #[test]
    fn test_missing_chapter_marker_is_rejected() {
        assert!(parse("One Piece - English - Vol.90: Arrival").is_err());
        assert!(parse("One Piece - English - Episode 3: Arrival").is_err());
    }

    #[test]
    fn test_empty_title_is_rejected() {
        assert!(parse("").is_err());
    }
}
