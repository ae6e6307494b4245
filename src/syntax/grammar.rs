//! Composite parsers built from cursor primitives.
//!
//! ```text
//! list   := entry ("," entry)*
//! entry  := value *( ";" param )
//! param  := token "=" (token | quoted-string)
//! ```

use std::borrow::Cow;

use super::cursor::{Cursor, Parsed};

/// A `key=value` parameter attached to a list entry or catalog assignment.
pub type Param<'a> = (&'a str, Cow<'a, str>);

/// One successfully parsed list entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry<'a, V> {
    pub value: V,
    pub params: Vec<Param<'a>>,
}

impl<'a, V> ListEntry<'a, V> {
    /// First parameter with the given name (case-insensitive).
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_ref())
    }
}

/// Outcome of parsing a comma-separated list.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedList<'a, V> {
    pub entries: Vec<ListEntry<'a, V>>,
    /// Number of malformed elements that were skipped.
    pub skipped: usize,
}

/// Zero or more whitespace-prefixed parameters. Always succeeds.
pub fn parameters<'a>(mut c: Cursor<'a>) -> (Cursor<'a>, Vec<Param<'a>>) {
    let mut params = Vec::new();
    while let Some((next, param)) = c.ws_parameter() {
        params.push(param);
        c = next;
    }
    (c, params)
}

/// `value *(";" param)`.
pub fn entry<'a, V>(
    c: Cursor<'a>,
    value: &impl Fn(Cursor<'a>) -> Parsed<'a, V>,
) -> Parsed<'a, ListEntry<'a, V>> {
    let (c, v) = value(c)?;
    let (c, params) = parameters(c);
    Some((c, ListEntry { value: v, params }))
}

/// Parse a comma-separated list of entries.
///
/// A malformed element is skipped up to the next top-level comma and
/// counted in `skipped`; parsing resumes with the following element.
pub fn list<'a, V>(
    text: &'a str,
    value: impl Fn(Cursor<'a>) -> Parsed<'a, V>,
) -> ParsedList<'a, V> {
    let mut entries = Vec::new();
    let mut skipped = 0;
    let mut cursor = Cursor::new(text);

    loop {
        let Some((c, _)) = cursor.whitespace() else { break };
        if c.end().is_some() {
            break;
        }

        let parsed = entry(c, &value).and_then(|(c, e)| {
            if let Some((c, ())) = c.ws_delim(',') {
                Some((c, e, false))
            } else {
                c.ws_end().map(|(c, ())| (c, e, true))
            }
        });

        match parsed {
            Some((next, e, done)) => {
                entries.push(e);
                cursor = next;
                if done {
                    break;
                }
            }
            None => {
                skipped += 1;
                cursor = c.skip_past(',');
            }
        }
    }

    ParsedList { entries, skipped }
}

/// A complete `type/subtype` with optional surrounding whitespace and
/// nothing else.
pub fn exact_type_pair(text: &str) -> Option<(&str, &str)> {
    let (c, pair) = Cursor::new(text).ws_type_pair()?;
    c.ws_end()?;
    Some(pair)
}
