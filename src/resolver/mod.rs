//! # Variant Resolver
//!
//! Derives a candidate's type, charset and languages from the suffix chain
//! of its file name.
//!
//! The candidate `intro.html.en` has the chain `[".html", ".en"]`, whether
//! it was requested as `intro` or `intro.html`. Suffixes are applied left to right: a type or
//! charset replaces the running value, a language is added to the set.
//! Dimensions the chain never mentions fall back to the `DEFAULT` rule.

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::catalog::MetadataCatalog;
use crate::model::{add_language, leaf_name, Candidate, LanguageSet, Variant, VariantMetadata};

/// Steps per request unless configured otherwise.
pub const DEFAULT_STEP_BUDGET: usize = 40;

/// Termination bound shared by every candidate of one request.
///
/// Each candidate costs one step, and each suffix applied costs one more.
/// Once spent, no further suffixes are applied for the rest of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepBudget {
    remaining: usize,
}

impl StepBudget {
    pub fn new(steps: usize) -> Self {
        Self { remaining: steps }
    }

    /// Spend one step. Returns false, spending nothing, when exhausted.
    pub fn take(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

impl Default for StepBudget {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_BUDGET)
    }
}

// ============================================================================
// Base-name matching
// ============================================================================

/// Whether `name` answers a request for `base`: an exact match, or `base`
/// followed by a `.`. Leading slashes on either side are ignored.
pub fn matches_base(name: &str, base: &str) -> bool {
    let name = name.trim_start_matches('/');
    let base = base.trim_start_matches('/');
    name.strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
}

/// The dot-delimited suffixes of `name`'s last path segment, from its
/// first `.` onward, each with its leading dot. A request for
/// `Foo.html` still applies `.html` to `Foo.html.en`.
pub fn suffix_chain(name: &str) -> Vec<&str> {
    let leaf = leaf_name(name);
    let Some(first) = leaf.find('.') else {
        return Vec::new();
    };
    let rest = &leaf[first..];
    let starts: Vec<usize> = rest.match_indices('.').map(|(i, _)| i).collect();
    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(rest.len());
            &rest[start..end]
        })
        .collect()
}

/// Keep the candidates that answer a request for `base`, in their
/// original order.
pub fn select_candidates(candidates: impl IntoIterator<Item = Candidate>, base: &str) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| matches_base(&c.name, base))
        .collect()
}

// ============================================================================
// VariantResolver
// ============================================================================

/// Resolves candidates against one catalog under one step budget.
pub struct VariantResolver<'c> {
    catalog: &'c MetadataCatalog,
    budget: StepBudget,
}

impl<'c> VariantResolver<'c> {
    pub fn new(catalog: &'c MetadataCatalog, budget: StepBudget) -> Self {
        Self { catalog, budget }
    }

    /// Steps left for the rest of the request.
    pub fn budget(&self) -> StepBudget {
        self.budget
    }

    /// Walk the suffix chain of `name`.
    pub fn metadata(&mut self, name: &str) -> VariantMetadata {
        let default_type = self.catalog.default_type();
        let default_charset = self.catalog.default_charset();
        let mut media_type = default_type.value.clone();
        let mut type_quality = default_type.quality;
        let mut charset = default_charset.value.clone();
        let mut charset_quality = default_charset.quality;
        let mut languages = LanguageSet::new();

        if self.budget.take() {
            for suffix in suffix_chain(name) {
                if !self.budget.take() {
                    warn!(candidate = name, suffix, "suffix step budget exhausted");
                    break;
                }
                let Some(rule) = self.catalog.rule(suffix) else { continue };
                trace!(candidate = name, suffix, "applying suffix rule");
                if let Some(t) = &rule.media_type {
                    media_type = t.value.clone();
                    type_quality = t.quality;
                }
                if let Some(c) = &rule.charset {
                    charset = c.value.clone();
                    charset_quality = c.quality;
                }
                for lang in &rule.languages {
                    add_language(&mut languages, lang.clone());
                }
            }
        } else {
            warn!(candidate = name, "suffix step budget exhausted, using defaults");
        }

        if languages.is_empty() {
            if let Some(lang) = self.catalog.default_language() {
                languages.push(lang.clone());
            }
        }

        VariantMetadata { media_type, type_quality, charset, charset_quality, languages }
    }

    pub fn resolve(&mut self, candidate: Candidate) -> Variant {
        let meta = self.metadata(&candidate.name);
        Variant::new(candidate, meta)
    }

    /// Resolve every candidate in order.
    pub fn resolve_all(&mut self, candidates: Vec<Candidate>) -> Vec<Variant> {
        candidates
            .into_iter()
            .map(|c| self.resolve(c))
            .collect()
    }
}
