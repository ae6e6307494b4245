//! # Suffix Metadata Catalog
//!
//! Parses the line-oriented suffix document shipped in a bundle:
//!
//! ```text
//! .html: t=text/html
//! .txt:  t=text/plain;q=0.8
//! .en:   l=en
//! .fr:   l=fr;q=0.7
//! .l1:   c=ISO-8859-1;q=0.5
//! ```
//!
//! `t` sets a type, `c` a charset, `l` adds a language. Each assignment
//! may carry `;q=` for its own quality. A synthetic first line defines the
//! `DEFAULT` rule, so the catalog is never without one.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::model::{add_language, Language, LanguageSet, MediaType, Quality};
use crate::syntax::{grammar, Cursor, Param};

/// Suffix key of the fallback rule.
pub const DEFAULT_SUFFIX: &str = "DEFAULT";

pub const DEFAULT_TYPE: &str = "text/plain";
pub const DEFAULT_CHARSET: &str = "UTF-8";

/// A declared value together with its source quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment<T> {
    pub value: T,
    pub quality: Quality,
}

/// Everything one suffix declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRule {
    pub media_type: Option<Assignment<MediaType>>,
    pub charset: Option<Assignment<String>>,
    pub languages: LanguageSet,
}

impl MetadataRule {
    pub fn is_empty(&self) -> bool {
        self.media_type.is_none() && self.charset.is_none() && self.languages.is_empty()
    }
}

/// Immutable suffix → rule mapping. Always holds a `DEFAULT` rule with a
/// type and a charset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataCatalog {
    rules: HashMap<String, MetadataRule>,
    default_type: Assignment<MediaType>,
    default_charset: Assignment<String>,
}

impl MetadataCatalog {
    /// Parse a catalog document with the standard `DEFAULT` rule
    /// (`t=text/plain c=UTF-8`).
    pub fn parse(text: &str) -> Self {
        Self::with_defaults(&MediaType::new("text", "plain"), DEFAULT_CHARSET, text)
    }

    /// Parse a catalog document behind a synthetic
    /// `DEFAULT: t=<media_type> c=<charset>` line.
    pub fn with_defaults(media_type: &MediaType, charset: &str, text: &str) -> Self {
        let mut rules: HashMap<String, MetadataRule> = HashMap::new();
        let synthetic = format!("{DEFAULT_SUFFIX}: t={media_type} c={charset}");

        for (number, line) in std::iter::once(synthetic.as_str())
            .chain(text.lines())
            .enumerate()
        {
            if line.trim().is_empty() {
                continue;
            }
            if !parse_line(line, &mut rules) {
                debug!(line = number, text = line, "skipping unparseable catalog line");
            }
        }

        let default = rules.entry(DEFAULT_SUFFIX.to_string()).or_default();
        let default_type = default.media_type.clone().unwrap_or_else(|| Assignment {
            value: media_type.clone(),
            quality: Quality::ONE,
        });
        let default_charset = default.charset.clone().unwrap_or_else(|| Assignment {
            value: charset.to_string(),
            quality: Quality::ONE,
        });

        Self { rules, default_type, default_charset }
    }

    /// A catalog holding only the `DEFAULT` rule.
    pub fn empty() -> Self {
        Self::parse("")
    }

    pub fn rule(&self, suffix: &str) -> Option<&MetadataRule> {
        self.rules.get(suffix)
    }

    pub fn default_rule(&self) -> Option<&MetadataRule> {
        self.rules.get(DEFAULT_SUFFIX)
    }

    /// Type of the `DEFAULT` rule.
    pub fn default_type(&self) -> &Assignment<MediaType> {
        &self.default_type
    }

    /// Charset of the `DEFAULT` rule.
    pub fn default_charset(&self) -> &Assignment<String> {
        &self.default_charset
    }

    /// Language of the `DEFAULT` rule, if the document declared one.
    pub fn default_language(&self) -> Option<&Language> {
        self.default_rule().and_then(|rule| rule.languages.first())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn suffixes(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

impl Default for MetadataCatalog {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// Line parser
// ============================================================================

/// `suffix ":" *(key "=" value *(";" param))`. Returns false when the line
/// has no `suffix:` head.
fn parse_line(line: &str, rules: &mut HashMap<String, MetadataRule>) -> bool {
    let Some((c, suffix)) = Cursor::new(line).ws_token() else {
        return false;
    };
    let Some((mut c, ())) = c.ws_delim(':') else {
        return false;
    };
    let rule = rules.entry(suffix.to_string()).or_default();

    while let Some((next, key)) = c.ws_token() {
        let Some((next, ())) = next.ws_delim('=') else { break };
        let Some(next) = parse_assignment(next, suffix, key, rule) else {
            debug!(suffix, key, "skipping malformed catalog assignment");
            break;
        };
        c = next;
    }

    if c.ws_end().is_none() {
        debug!(suffix, rest = c.rest(), "ignoring trailing catalog text");
    }
    true
}

/// Parse one assignment value and its parameters into `rule`. Returns the
/// advanced cursor, or `None` when the value itself is malformed.
fn parse_assignment<'a>(
    c: Cursor<'a>,
    suffix: &str,
    key: &str,
    rule: &mut MetadataRule,
) -> Option<Cursor<'a>> {
    match key {
        "t" => {
            let (c, (major, minor)) = c.ws_type_pair()?;
            let (c, params) = grammar::parameters(c);
            if let Some(quality) = assignment_quality(suffix, key, &params) {
                rule.media_type = Some(Assignment { value: MediaType::new(major, minor), quality });
            }
            Some(c)
        }
        "c" => {
            let (c, value) = c.ws_token_or_quoted()?;
            let (c, params) = grammar::parameters(c);
            if let Some(quality) = assignment_quality(suffix, key, &params) {
                rule.charset = Some(Assignment { value: value.into_owned(), quality });
            }
            Some(c)
        }
        "l" => {
            let (c, value) = c.ws_token_or_quoted()?;
            let (c, params) = grammar::parameters(c);
            if let Some(quality) = assignment_quality(suffix, key, &params) {
                add_language(&mut rule.languages, Language::new(value.into_owned(), quality));
            }
            Some(c)
        }
        other => {
            // Unknown key: consume its value so later keys still apply.
            let (c, _) = c
                .ws_type_pair()
                .map(|(c, _)| (c, ()))
                .or_else(|| c.ws_token_or_quoted().map(|(c, _)| (c, ())))?;
            let (c, _) = grammar::parameters(c);
            trace!(suffix, key = other, "ignoring unknown catalog key");
            Some(c)
        }
    }
}

/// The `q` (or `qs`) sub-parameter, defaulting to 1.0. `None` when the
/// value is not a number.
fn assignment_quality(suffix: &str, key: &str, params: &[Param<'_>]) -> Option<Quality> {
    let raw = params
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("q") || k.eq_ignore_ascii_case("qs"))
        .map(|(_, v)| v.as_ref());
    match raw {
        None => Some(Quality::ONE),
        Some(raw) => {
            let quality = Quality::parse(raw);
            if quality.is_none() {
                debug!(suffix, key, q = raw, "dropping assignment with bad quality");
            }
            quality
        }
    }
}
