//! # Client Preferences
//!
//! Parses `Accept`, `Accept-Charset` and `Accept-Language` into
//! [`PreferenceTable`]s, and `Negotiate` into a directive set.
//!
//! Tables hold only what the client sent. Wildcard fallback happens at
//! lookup time: exact → `major/*` → `*/*` for types, exact → `major` → `*`
//! for languages, exact → `*` for charsets.

use std::fmt;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{MediaType, Quality};
use crate::syntax::{grammar, Cursor, Parsed};

/// A negotiation axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Type,
    Charset,
    Language,
}

impl Dimension {
    /// The table key that matches everything.
    pub fn wildcard(self) -> &'static str {
        match self {
            Dimension::Type => "*/*",
            Dimension::Charset | Dimension::Language => "*",
        }
    }

    /// The request header carrying this dimension.
    pub fn header_name(self) -> &'static str {
        match self {
            Dimension::Type => "Accept",
            Dimension::Charset => "Accept-Charset",
            Dimension::Language => "Accept-Language",
        }
    }

    /// Entry value parser for this dimension's header.
    fn value<'a>(self, c: Cursor<'a>) -> Parsed<'a, String> {
        match self {
            Dimension::Type => c
                .loose_type_pair()
                .map(|(c, (major, minor))| (c, format!("{major}/{minor}"))),
            Dimension::Charset | Dimension::Language => {
                c.token_or_quoted().map(|(c, v)| (c, v.into_owned()))
            }
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dimension::Type => "type",
            Dimension::Charset => "charset",
            Dimension::Language => "language",
        })
    }
}

// ============================================================================
// PreferenceTable
// ============================================================================

/// Client weights for one dimension, keyed by lowercased value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceTable {
    dimension: Dimension,
    entries: HashMap<String, Quality>,
}

impl PreferenceTable {
    /// A table holding only the dimension's wildcard at 1.0.
    pub fn wildcard(dimension: Dimension) -> Self {
        let mut entries = HashMap::new();
        entries.insert(dimension.wildcard().to_string(), Quality::ONE);
        Self { dimension, entries }
    }

    /// Parse a raw header value. `None` (header absent) and a header with
    /// no parseable entry both yield [`PreferenceTable::wildcard`].
    pub fn parse(dimension: Dimension, header: Option<&str>) -> Self {
        let Some(text) = header else {
            return Self::wildcard(dimension);
        };

        let parsed = grammar::list(text, |c| dimension.value(c));
        let mut entries = HashMap::new();
        let mut skipped = parsed.skipped;
        for entry in parsed.entries {
            let quality = match entry.param("q") {
                None => Quality::ONE,
                Some(raw) => match Quality::parse(raw) {
                    Some(q) => q,
                    None => {
                        debug!(header = dimension.header_name(), value = %entry.value, q = raw, "skipping entry with bad q");
                        skipped += 1;
                        continue;
                    }
                },
            };
            entries.insert(entry.value.to_ascii_lowercase(), quality);
        }

        if skipped > 0 {
            debug!(header = dimension.header_name(), skipped, "skipped malformed entries");
        }
        if entries.is_empty() {
            debug!(header = dimension.header_name(), text, "unparseable header, assuming wildcard");
            return Self::wildcard(dimension);
        }
        Self { dimension, entries }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Raw lookup of one key, without fallback.
    pub fn get(&self, key: &str) -> Option<Quality> {
        self.entries.get(key.to_ascii_lowercase().as_str()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Quality)> {
        self.entries.iter().map(|(k, q)| (k.as_str(), *q))
    }

    fn first_of<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> Quality {
        keys.into_iter()
            .find_map(|k| self.entries.get(k).copied())
            .unwrap_or(Quality::ZERO)
    }

    /// Client weight for a media type: exact, `major/*`, `*/*`, else 0.
    pub fn type_quality(&self, media_type: &MediaType) -> Quality {
        let major = media_type.major.to_ascii_lowercase();
        let exact = media_type.key();
        let partial = format!("{major}/*");
        self.first_of([exact.as_str(), partial.as_str(), "*/*"])
    }

    /// Client weight for a charset: exact, `*`, else 0.
    pub fn charset_quality(&self, charset: &str) -> Quality {
        let exact = charset.to_ascii_lowercase();
        self.first_of([exact.as_str(), "*"])
    }

    /// Client weight for a language tag: exact `major-region`, bare
    /// `major`, `*`, else 0.
    pub fn language_quality(&self, tag: &str) -> Quality {
        let exact = tag.to_ascii_lowercase();
        let major = exact.split_once('-').map_or(exact.as_str(), |(major, _)| major);
        self.first_of([exact.as_str(), major, "*"])
    }
}

// ============================================================================
// Negotiate directives
// ============================================================================

/// Directives from the `Negotiate` request header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Negotiate {
    directives: HashSet<String>,
}

impl Negotiate {
    /// Directive requesting a variant list instead of a choice.
    pub const TRANS: &'static str = "trans";

    /// Split on runs of whitespace and commas.
    pub fn parse(header: Option<&str>) -> Self {
        let directives = header
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|d| !d.is_empty())
            .map(str::to_ascii_lowercase)
            .collect();
        Self { directives }
    }

    pub fn contains(&self, directive: &str) -> bool {
        self.directives.contains(directive.to_ascii_lowercase().as_str())
    }

    /// Whether the client asked for list mode.
    pub fn wants_list(&self) -> bool {
        self.contains(Self::TRANS)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.directives.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

// ============================================================================
// Request bundle
// ============================================================================

/// Raw negotiation-relevant request headers. `None` means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeaders {
    pub accept: Option<String>,
    pub accept_charset: Option<String>,
    pub accept_language: Option<String>,
    pub negotiate: Option<String>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(mut self, value: impl Into<String>) -> Self {
        self.accept = Some(value.into());
        self
    }

    pub fn accept_charset(mut self, value: impl Into<String>) -> Self {
        self.accept_charset = Some(value.into());
        self
    }

    pub fn accept_language(mut self, value: impl Into<String>) -> Self {
        self.accept_language = Some(value.into());
        self
    }

    pub fn negotiate(mut self, value: impl Into<String>) -> Self {
        self.negotiate = Some(value.into());
        self
    }
}

/// Everything the engine needs to know about the client.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPreferences {
    pub types: PreferenceTable,
    pub charsets: PreferenceTable,
    pub languages: PreferenceTable,
    pub negotiate: Negotiate,
}

impl RequestPreferences {
    pub fn from_headers(headers: &RequestHeaders) -> Self {
        Self {
            types: PreferenceTable::parse(Dimension::Type, headers.accept.as_deref()),
            charsets: PreferenceTable::parse(Dimension::Charset, headers.accept_charset.as_deref()),
            languages: PreferenceTable::parse(Dimension::Language, headers.accept_language.as_deref()),
            negotiate: Negotiate::parse(headers.negotiate.as_deref()),
        }
    }
}

impl Default for RequestPreferences {
    /// A client that accepts anything and does not ask for a list.
    fn default() -> Self {
        Self::from_headers(&RequestHeaders::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(v: f64) -> Quality {
        Quality::new(v)
    }

    #[test]
    fn test_parse_accept() {
        let t = PreferenceTable::parse(Dimension::Type, Some("text/html;q=0.8, text/plain;q=0.5"));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("text/html"), Some(q(0.8)));
        assert_eq!(t.get("text/plain"), Some(q(0.5)));
        assert_eq!(t.get("*/*"), None);
    }

    #[test]
    fn test_missing_q_defaults_to_one() {
        let t = PreferenceTable::parse(Dimension::Language, Some("en, fr;q=0.3"));
        assert_eq!(t.get("en"), Some(Quality::ONE));
        assert_eq!(t.get("fr"), Some(q(0.3)));
    }

    #[test]
    fn test_absent_header_is_wildcard() {
        for dim in [Dimension::Type, Dimension::Charset, Dimension::Language] {
            let t = PreferenceTable::parse(dim, None);
            assert_eq!(t, PreferenceTable::wildcard(dim));
            assert_eq!(t.get(dim.wildcard()), Some(Quality::ONE));
        }
    }

    #[test]
    fn test_unparseable_header_is_wildcard() {
        let t = PreferenceTable::parse(Dimension::Type, Some(";;;, ==="));
        assert_eq!(t, PreferenceTable::wildcard(Dimension::Type));
        let t = PreferenceTable::parse(Dimension::Charset, Some(""));
        assert_eq!(t, PreferenceTable::wildcard(Dimension::Charset));
    }

    #[test]
    fn test_malformed_entry_skipped() {
        let t = PreferenceTable::parse(Dimension::Type, Some("text/html, bogus, image/png;q=0.2"));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get("image/png"), Some(q(0.2)));
    }

    #[test]
    fn test_bad_q_skips_entry() {
        let t = PreferenceTable::parse(Dimension::Charset, Some("utf-8;q=high, latin1"));
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("latin1"), Some(Quality::ONE));
    }

    #[test]
    fn test_star_accept_form() {
        let t = PreferenceTable::parse(Dimension::Type, Some("*; q=0.1"));
        assert_eq!(t.get("*/*"), Some(q(0.1)));
    }

    #[test]
    fn test_type_fallback_order() {
        let t = PreferenceTable::parse(Dimension::Type, Some("text/html;q=0.9, text/*;q=0.5, */*;q=0.1"));
        assert_eq!(t.type_quality(&MediaType::new("text", "html")), q(0.9));
        assert_eq!(t.type_quality(&MediaType::new("Text", "Plain")), q(0.5));
        assert_eq!(t.type_quality(&MediaType::new("image", "png")), q(0.1));

        let strict = PreferenceTable::parse(Dimension::Type, Some("text/html"));
        assert_eq!(strict.type_quality(&MediaType::new("image", "png")), Quality::ZERO);
    }

    #[test]
    fn test_language_fallback_order() {
        let t = PreferenceTable::parse(Dimension::Language, Some("en-gb;q=0.9, en;q=0.6, *;q=0.1"));
        assert_eq!(t.language_quality("en-GB"), q(0.9));
        assert_eq!(t.language_quality("en-US"), q(0.6));
        assert_eq!(t.language_quality("de"), q(0.1));

        let strict = PreferenceTable::parse(Dimension::Language, Some("fr"));
        assert_eq!(strict.language_quality("de"), Quality::ZERO);
        assert_eq!(strict.language_quality("fr-CA"), Quality::ONE);
    }

    #[test]
    fn test_charset_fallback_order() {
        let t = PreferenceTable::parse(Dimension::Charset, Some("utf-8, *;q=0.2"));
        assert_eq!(t.charset_quality("UTF-8"), Quality::ONE);
        assert_eq!(t.charset_quality("ISO-8859-1"), q(0.2));

        let strict = PreferenceTable::parse(Dimension::Charset, Some("utf-8"));
        assert_eq!(strict.charset_quality("ISO-8859-1"), Quality::ZERO);
    }

    #[test]
    fn test_negotiate_directives() {
        let n = Negotiate::parse(Some("vlist, Trans  guess-small"));
        assert!(n.wants_list());
        assert!(n.contains("vlist"));
        assert!(n.contains("guess-small"));
        assert!(!Negotiate::parse(None).wants_list());
        assert!(Negotiate::parse(Some(" , ")).is_empty());
    }
}
