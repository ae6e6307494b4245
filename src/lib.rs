//! # webzip-rs — Transparent Content Negotiation for Document Bundles
//!
//! Serves pre-built documentation bundles in which one logical resource
//! exists as several files, distinguished by suffix chains:
//!
//! ```text
//! intro.html.en   intro.html.fr   intro.txt.en
//! ```
//!
//! For each request the negotiator picks the variant that best fits the
//! client's `Accept`, `Accept-Charset` and `Accept-Language` headers, or
//! lists the alternatives when the client sends `Negotiate: trans`.
//!
//! ## Design Principles
//!
//! 1. **Parsers own nothing**: header and catalog parsing are pure functions
//!    over an explicit cursor
//! 2. **Recover, don't fail**: malformed header entries and catalog lines
//!    are skipped; only missing resources are errors
//! 3. **Bounded work**: suffix walking runs under an explicit step budget
//! 4. **Trait-first storage**: `BundleStore` is the contract with whatever
//!    holds the files
//!
//! ## Quick Start
//!
//! ```rust
//! use webzip_rs::{Negotiator, RequestHeaders, storage::MemoryStore};
//!
//! # fn example() -> webzip_rs::Result<()> {
//! let store = MemoryStore::new()
//!     .with("content-types.tab", ".html: t=text/html\n.en: l=en\n.fr: l=fr;q=0.7\n")
//!     .with("intro.html.en", "<p>Hello</p>")
//!     .with("intro.html.fr", "<p>Bonjour</p>");
//!
//! let negotiator = Negotiator::new(store);
//! let headers = RequestHeaders::new().accept_language("fr, en;q=0.3");
//! let result = negotiator.negotiate("intro", &headers)?;
//!
//! assert_eq!(result.winner().unwrap().name, "intro.html.fr");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod syntax;
pub mod model;
pub mod preference;
pub mod catalog;
pub mod resolver;
pub mod negotiation;
pub mod protocol;
pub mod storage;
pub mod config;

use tracing::debug;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{Quality, MediaType, Language, Candidate, Variant};
pub use preference::{Dimension, PreferenceTable, Negotiate, RequestHeaders, RequestPreferences};
pub use catalog::{MetadataCatalog, MetadataRule};
pub use resolver::{VariantResolver, StepBudget};
pub use negotiation::{NegotiationEngine, Negotiation, NegotiationOutcome, VarySet, Alternate};
pub use storage::{BundleStore, Entry};
pub use config::NegotiatorConfig;

// ============================================================================
// Top-level Negotiator handle
// ============================================================================

/// The primary entry point. A `Negotiator` wraps a bundle store and runs
/// the full pipeline for one request at a time.
pub struct Negotiator<B: BundleStore> {
    store: B,
    config: NegotiatorConfig,
}

impl<B: BundleStore> Negotiator<B> {
    /// Create a negotiator with the default configuration.
    pub fn new(store: B) -> Self {
        Self { store, config: NegotiatorConfig::default() }
    }

    /// Create a negotiator with a validated configuration.
    pub fn with_config(store: B, config: NegotiatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Load and parse the bundle's suffix catalog. A bundle without one
    /// gets a catalog holding only the `DEFAULT` rule.
    pub fn catalog(&self) -> Result<MetadataCatalog> {
        let default_type = self.config.default_media_type()?;
        let text = match self.store.read(&self.config.catalog_entry)? {
            Some(data) => String::from_utf8_lossy(&data).into_owned(),
            None => {
                debug!(entry = %self.config.catalog_entry, "bundle has no catalog");
                String::new()
            }
        };
        Ok(MetadataCatalog::with_defaults(&default_type, &self.config.default_charset, &text))
    }

    /// Negotiate a request for `path` against the bundle.
    ///
    /// Fails with [`Error::NotFound`] when no entry answers `path`.
    pub fn negotiate(&self, path: &str, headers: &RequestHeaders) -> Result<Negotiation> {
        // Phase 1: Candidates
        let catalog_entry = self.config.catalog_entry.as_str();
        let candidates: Vec<Candidate> = self
            .store
            .candidates(path)?
            .into_iter()
            .filter(|c| c.name.trim_start_matches('/') != catalog_entry)
            .collect();
        if candidates.is_empty() {
            return Err(Error::NotFound(path.to_string()));
        }

        // Phase 2: Resolve
        let catalog = self.catalog()?;
        let mut resolver = VariantResolver::new(&catalog, self.config.budget());
        let variants = resolver.resolve_all(candidates);

        // Phase 3: Negotiate
        let prefs = RequestPreferences::from_headers(headers);
        NegotiationEngine::new(&prefs)
            .negotiate(variants)
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    /// Response header values for a negotiation result, including the
    /// bundle's `Last-Modified`.
    pub fn response_headers(&self, negotiation: &Negotiation) -> Result<Vec<(&'static str, String)>> {
        let last_modified = self.store.last_modified()?;
        Ok(protocol::response_headers(negotiation, last_modified))
    }

    /// Open the byte stream of a resolved variant.
    pub fn open(&self, variant: &Variant) -> Result<Box<dyn std::io::Read + Send>> {
        variant.open()
    }

    /// The configuration this negotiator runs with.
    pub fn config(&self) -> &NegotiatorConfig {
        &self.config
    }

    /// Access the underlying store.
    pub fn store(&self) -> &B {
        &self.store
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Resource error: {0}")]
    ResourceError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
