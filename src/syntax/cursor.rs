//! Cursor over a header value: the parse primitives.
//!
//! A `Cursor` is a cheap `Copy` value. Every primitive takes the cursor by
//! value and either returns `Some((advanced, value))` or `None`. On `None`
//! the caller still holds the original cursor, so a failed primitive never
//! consumes anything and no backtracking bookkeeping is needed.

use std::borrow::Cow;

/// Result of a parse primitive: the advanced cursor and the consumed value.
pub type Parsed<'a, T> = Option<(Cursor<'a>, T)>;

/// Characters that may not appear in a MIME token (RFC 2045 tspecials).
const SPECIALS: &[char] = &[
    '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', '{', '}',
];

/// Linear whitespace inside a header line.
fn is_ws(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_token_char(c: char) -> bool {
    !is_ws(c) && !c.is_control() && !SPECIALS.contains(&c)
}

/// Position in a text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    /// Byte offset into the original text.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Unconsumed remainder.
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn advance(self, bytes: usize) -> Self {
        Self { text: self.text, pos: self.pos + bytes }
    }

    /// Consume the longest prefix whose chars satisfy `pred`.
    fn take_while(self, pred: impl Fn(char) -> bool) -> (Self, &'a str) {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        (self.advance(len), &rest[..len])
    }

    // ========================================================================
    // Primitives
    // ========================================================================

    /// A run of spaces and tabs, possibly empty. Always succeeds.
    pub fn whitespace(self) -> Parsed<'a, &'a str> {
        self.whitespace_min(0)
    }

    /// A run of at least `min` spaces and tabs.
    pub fn whitespace_min(self, min: usize) -> Parsed<'a, &'a str> {
        let (next, run) = self.take_while(is_ws);
        (run.len() >= min).then_some((next, run))
    }

    /// A single literal delimiter.
    pub fn delim(self, delim: char) -> Parsed<'a, ()> {
        self.rest()
            .starts_with(delim)
            .then(|| (self.advance(delim.len_utf8()), ()))
    }

    /// A maximal run of token characters (at least one).
    pub fn token(self) -> Parsed<'a, &'a str> {
        let (next, tok) = self.take_while(is_token_char);
        (!tok.is_empty()).then_some((next, tok))
    }

    /// A double-quoted string with backslash escapes; yields the unescaped
    /// contents.
    pub fn quoted_string(self) -> Parsed<'a, String> {
        let rest = self.rest();
        let mut chars = rest.char_indices();
        if !matches!(chars.next(), Some((_, '"'))) {
            return None;
        }
        let mut value = String::new();
        loop {
            match chars.next()? {
                (_, '\\') => {
                    let (_, escaped) = chars.next()?;
                    value.push(escaped);
                }
                (end, '"') => return Some((self.advance(end + 1), value)),
                (_, c) => value.push(c),
            }
        }
    }

    /// Either a quoted string or a token.
    pub fn token_or_quoted(self) -> Parsed<'a, Cow<'a, str>> {
        if let Some((next, s)) = self.quoted_string() {
            return Some((next, Cow::Owned(s)));
        }
        self.token().map(|(next, t)| (next, Cow::Borrowed(t)))
    }

    /// `token "/" token`.
    pub fn type_pair(self) -> Parsed<'a, (&'a str, &'a str)> {
        let (c, major) = self.token()?;
        let (c, ()) = c.delim('/')?;
        let (c, minor) = c.token()?;
        Some((c, (major, minor)))
    }

    /// A type pair, or a lone `*` standing for `*/*`.
    pub fn loose_type_pair(self) -> Parsed<'a, (&'a str, &'a str)> {
        if let Some(found) = self.type_pair() {
            return Some(found);
        }
        let (c, ()) = self.delim('*')?;
        Some((c, ("*", "*")))
    }

    /// `";" ws token ws "=" ws (token | quoted-string)`.
    pub fn parameter(self) -> Parsed<'a, (&'a str, Cow<'a, str>)> {
        let (c, ()) = self.delim(';')?;
        let (c, key) = c.ws_token()?;
        let (c, ()) = c.ws_delim('=')?;
        let (c, value) = c.ws_token_or_quoted()?;
        Some((c, (key, value)))
    }

    /// Succeeds, consuming nothing, only at the end of the text.
    pub fn end(self) -> Parsed<'a, ()> {
        self.is_at_end().then_some((self, ()))
    }

    // ========================================================================
    // Whitespace-prefixed forms
    // ========================================================================

    pub fn ws_delim(self, delim: char) -> Parsed<'a, ()> {
        let (c, _) = self.whitespace()?;
        c.delim(delim)
    }

    pub fn ws_token(self) -> Parsed<'a, &'a str> {
        let (c, _) = self.whitespace()?;
        c.token()
    }

    pub fn ws_token_or_quoted(self) -> Parsed<'a, Cow<'a, str>> {
        let (c, _) = self.whitespace()?;
        c.token_or_quoted()
    }

    pub fn ws_type_pair(self) -> Parsed<'a, (&'a str, &'a str)> {
        let (c, _) = self.whitespace()?;
        c.type_pair()
    }

    pub fn ws_parameter(self) -> Parsed<'a, (&'a str, Cow<'a, str>)> {
        let (c, _) = self.whitespace()?;
        c.parameter()
    }

    pub fn ws_end(self) -> Parsed<'a, ()> {
        let (c, _) = self.whitespace()?;
        c.end()
    }

    /// Skip up to and including the next `delim` that is not inside a quoted
    /// string, or to the end of the text. Used for error recovery only.
    pub fn skip_past(self, delim: char) -> Self {
        let rest = self.rest();
        let mut in_quotes = false;
        let mut escaped = false;
        for (i, c) in rest.char_indices() {
            if escaped {
                escaped = false;
            } else if in_quotes && c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_quotes = !in_quotes;
            } else if !in_quotes && c == delim {
                return self.advance(i + c.len_utf8());
            }
        }
        self.advance(rest.len())
    }
}
