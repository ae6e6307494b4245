//! Candidates and resolved variants.

use std::fmt;
use std::io::Read;
use std::sync::Arc;

use serde::Serialize;

use super::{LanguageSet, MediaType, Quality};
use crate::{Error, Result};

/// Something that can lazily produce the bytes of one bundle entry.
pub trait StreamSource: Send + Sync {
    fn open(&self) -> std::io::Result<Box<dyn Read + Send>>;
}

/// Shared handle to an externally owned byte stream.
#[derive(Clone)]
pub struct StreamHandle(Arc<dyn StreamSource>);

impl StreamHandle {
    pub fn new(source: impl StreamSource + 'static) -> Self {
        Self(Arc::new(source))
    }

    pub fn open(&self) -> std::io::Result<Box<dyn Read + Send>> {
        self.0.open()
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StreamHandle(..)")
    }
}

/// Last path segment of a `/`-separated entry name.
pub fn leaf_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// One physical file offered for a request, before resolution.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub size: u64,
    pub stream: Option<StreamHandle>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self { name: name.into(), size, stream: None }
    }

    pub fn with_stream(mut self, stream: StreamHandle) -> Self {
        self.stream = Some(stream);
        self
    }
}

/// Metadata derived from a candidate's suffix chain.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantMetadata {
    pub media_type: MediaType,
    pub type_quality: Quality,
    pub charset: String,
    pub charset_quality: Quality,
    /// Accumulated languages, or the default language when none were
    /// declared. May be empty when no default language exists.
    pub languages: LanguageSet,
}

impl VariantMetadata {
    /// Product of the declared type, charset and best language weights.
    pub fn source_quality(&self) -> Quality {
        let best_language = self
            .languages
            .iter()
            .map(|l| l.quality)
            .reduce(|a, b| if b > a { b } else { a })
            .unwrap_or(Quality::ONE);
        self.type_quality * self.charset_quality * best_language
    }
}

/// A resolved variant: one candidate plus its effective metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Variant {
    pub name: String,
    pub size: u64,
    pub media_type: MediaType,
    pub type_quality: Quality,
    pub charset: String,
    pub charset_quality: Quality,
    pub languages: LanguageSet,
    /// Client-independent quality.
    pub source_quality: Quality,
    negotiated_quality: Option<Quality>,
    #[serde(skip)]
    stream: Option<StreamHandle>,
}

impl Variant {
    pub fn new(candidate: Candidate, meta: VariantMetadata) -> Self {
        let source_quality = meta.source_quality();
        Self {
            name: candidate.name,
            size: candidate.size,
            media_type: meta.media_type,
            type_quality: meta.type_quality,
            charset: meta.charset,
            charset_quality: meta.charset_quality,
            languages: meta.languages,
            source_quality,
            negotiated_quality: None,
            stream: candidate.stream,
        }
    }

    /// File name without its directory part.
    pub fn leaf_name(&self) -> &str {
        leaf_name(&self.name)
    }

    /// Set by the negotiation engine; `None` before negotiation.
    pub fn negotiated_quality(&self) -> Option<Quality> {
        self.negotiated_quality
    }

    pub(crate) fn set_negotiated_quality(&mut self, quality: Quality) {
        debug_assert!(self.negotiated_quality.is_none(), "negotiated twice");
        self.negotiated_quality = Some(quality);
    }

    pub fn language_tags(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|l| l.tag.as_str())
    }

    /// Open the variant's byte stream.
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| Error::ResourceError(format!("No stream for '{}'", self.name)))?;
        stream
            .open()
            .map_err(|e| Error::ResourceError(format!("Cannot open '{}': {e}", self.name)))
    }
}
