//! Media types and language tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::Quality;
use crate::syntax::grammar::exact_type_pair;
use crate::Error;

/// A `major/minor` media type.
///
/// Spelling is kept as declared; comparisons are case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    pub major: String,
    pub minor: String,
}

impl MediaType {
    pub fn new(major: impl Into<String>, minor: impl Into<String>) -> Self {
        Self { major: major.into(), minor: minor.into() }
    }

    /// Lowercased `major/minor`, the form used for lookups.
    pub fn key(&self) -> String {
        format!("{}/{}", self.major, self.minor).to_ascii_lowercase()
    }
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        self.major.eq_ignore_ascii_case(&other.major)
            && self.minor.eq_ignore_ascii_case(&other.minor)
    }
}

impl Eq for MediaType {}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.major, self.minor)
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        exact_type_pair(s)
            .map(|(major, minor)| MediaType::new(major, minor))
            .ok_or_else(|| Error::SyntaxError {
                position: 0,
                message: format!("Expected type/subtype, got '{s}'"),
            })
    }
}

/// A language tag carried by a variant, with its declared quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    pub tag: String,
    pub quality: Quality,
}

impl Language {
    pub fn new(tag: impl Into<String>, quality: Quality) -> Self {
        Self { tag: tag.into(), quality }
    }
}

/// Languages of one variant, in the order they were declared.
pub type LanguageSet = SmallVec<[Language; 2]>;

/// Insert `lang`, replacing the quality of an existing tag that matches
/// case-insensitively.
pub fn add_language(set: &mut LanguageSet, lang: Language) {
    match set.iter_mut().find(|l| l.tag.eq_ignore_ascii_case(&lang.tag)) {
        Some(existing) => existing.quality = lang.quality,
        None => set.push(lang),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_parse() {
        let t: MediaType = "text/HTML".parse().unwrap();
        assert_eq!(t.to_string(), "text/HTML");
        assert_eq!(t.key(), "text/html");
        assert_eq!(t, MediaType::new("TEXT", "html"));
        assert!("texthtml".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_add_language_replaces() {
        let mut set = LanguageSet::new();
        add_language(&mut set, Language::new("en", Quality::ONE));
        add_language(&mut set, Language::new("fr", Quality::new(0.7)));
        add_language(&mut set, Language::new("EN", Quality::new(0.2)));
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].tag, "en");
        assert_eq!(set[0].quality, Quality::new(0.2));
    }
}
