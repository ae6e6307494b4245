//! # Negotiation Engine
//!
//! Scores resolved variants against client preferences and picks an
//! outcome:
//!
//! - `Ambiguous` when the client sent `Negotiate: trans` and more than one
//!   variant exists (list mode);
//! - `Unacceptable` when every variant scores zero;
//! - `Unique` otherwise, with the highest-scoring variant. Ties keep the
//!   earliest candidate.

use std::fmt;

use hashbrown::HashSet;
use serde::Serialize;
use tracing::debug;

use crate::model::{Quality, Variant};
use crate::preference::{Dimension, RequestPreferences};

/// What the response layer should render.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "variants")]
pub enum NegotiationOutcome {
    Unique(Variant),
    Ambiguous(Vec<Variant>),
    Unacceptable(Vec<Variant>),
}

/// Dimensions that discriminate among the available variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VarySet {
    pub media_type: bool,
    pub charset: bool,
    pub language: bool,
}

impl VarySet {
    /// A dimension varies when more than one distinct value exists for it
    /// across `variants`. A variant without languages counts as its own
    /// language value.
    pub fn of(variants: &[Variant]) -> Self {
        let mut types = HashSet::new();
        let mut charsets = HashSet::new();
        let mut languages = HashSet::new();
        for v in variants {
            types.insert(v.media_type.key());
            charsets.insert(v.charset.to_ascii_lowercase());
            if v.languages.is_empty() {
                languages.insert(String::new());
            }
            languages.extend(v.language_tags().map(str::to_ascii_lowercase));
        }
        Self {
            media_type: types.len() > 1,
            charset: charsets.len() > 1,
            language: languages.len() > 1,
        }
    }

    pub fn contains(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Type => self.media_type,
            Dimension::Charset => self.charset,
            Dimension::Language => self.language,
        }
    }

    /// Varying dimensions, charset first, then language, then type.
    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        [Dimension::Charset, Dimension::Language, Dimension::Type]
            .into_iter()
            .filter(|d| self.contains(*d))
    }

    pub fn is_empty(&self) -> bool {
        !(self.media_type || self.charset || self.language)
    }
}

/// One entry of a variant list, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alternate {
    pub name: String,
    /// Source quality with five decimals.
    pub source_quality: String,
    pub media_type: String,
    pub charset: String,
    pub languages: Vec<String>,
}

impl Alternate {
    pub fn of(variant: &Variant) -> Self {
        Self {
            name: variant.leaf_name().to_string(),
            source_quality: variant.source_quality.format_fixed(),
            media_type: variant.media_type.to_string(),
            charset: variant.charset.clone(),
            languages: variant.language_tags().map(String::from).collect(),
        }
    }
}

impl fmt::Display for Alternate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"{}\" {}}} {{type {}}} {{charset {}}} {{language {}}}",
            self.name,
            self.source_quality,
            self.media_type,
            self.charset,
            self.languages.join(","),
        )
    }
}

/// Result of negotiating one request.
#[derive(Debug, Clone, Serialize)]
pub struct Negotiation {
    pub outcome: NegotiationOutcome,
    /// Varying dimensions; `None` when only one candidate existed.
    pub vary: Option<VarySet>,
    /// Number of candidates that took part.
    pub candidate_count: usize,
    /// Variant list for list-mode and diagnostic rendering, in candidate
    /// order.
    pub alternates: Vec<Alternate>,
}

impl Negotiation {
    pub fn is_unique(&self) -> bool {
        matches!(self.outcome, NegotiationOutcome::Unique(_))
    }

    /// The chosen variant, for `Unique` outcomes.
    pub fn winner(&self) -> Option<&Variant> {
        match &self.outcome {
            NegotiationOutcome::Unique(v) => Some(v),
            _ => None,
        }
    }

    /// Alternates rendered as one header value.
    pub fn alternates_value(&self) -> String {
        self.alternates
            .iter()
            .map(Alternate::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Scores variants against one client's preferences.
pub struct NegotiationEngine<'p> {
    prefs: &'p RequestPreferences,
}

impl<'p> NegotiationEngine<'p> {
    pub fn new(prefs: &'p RequestPreferences) -> Self {
        Self { prefs }
    }

    /// Negotiated quality of one variant:
    /// `qs_type·q_type × qs_charset·q_charset × max(qs_lang·q_lang)`.
    ///
    /// A variant without languages has a neutral language factor.
    pub fn score(&self, variant: &Variant) -> Quality {
        let type_q = variant.type_quality * self.prefs.types.type_quality(&variant.media_type);
        let charset_q = variant.charset_quality * self.prefs.charsets.charset_quality(&variant.charset);
        let language_q = if variant.languages.is_empty() {
            Quality::ONE
        } else {
            variant
                .languages
                .iter()
                .map(|l| l.quality * self.prefs.languages.language_quality(&l.tag))
                .fold(Quality::ZERO, |best, q| if q > best { q } else { best })
        };
        type_q * charset_q * language_q
    }

    /// Score every variant and decide the outcome. `None` when there are
    /// no variants at all.
    pub fn negotiate(&self, mut variants: Vec<Variant>) -> Option<Negotiation> {
        if variants.is_empty() {
            return None;
        }

        let mut best: Option<(usize, Quality)> = None;
        for (index, variant) in variants.iter_mut().enumerate() {
            let quality = self.score(variant);
            variant.set_negotiated_quality(quality);
            let best_q = best.map_or(Quality::ZERO, |(_, q)| q);
            if quality > best_q {
                best = Some((index, quality));
            }
        }

        let candidate_count = variants.len();
        let vary = (candidate_count > 1).then(|| VarySet::of(&variants));
        let alternates = variants.iter().map(Alternate::of).collect();

        let outcome = if candidate_count > 1 && self.prefs.negotiate.wants_list() {
            debug!(candidates = candidate_count, "client requested variant list");
            NegotiationOutcome::Ambiguous(variants)
        } else if let Some((index, quality)) = best {
            let winner = variants.swap_remove(index);
            debug!(variant = %winner.name, quality = quality.value(), "selected variant");
            NegotiationOutcome::Unique(winner)
        } else {
            debug!(candidates = candidate_count, "no acceptable variant");
            NegotiationOutcome::Unacceptable(variants)
        };

        Some(Negotiation { outcome, vary, candidate_count, alternates })
    }
}

/// Convenience wrapper around [`NegotiationEngine::negotiate`].
pub fn negotiate(variants: Vec<Variant>, prefs: &RequestPreferences) -> Option<Negotiation> {
    NegotiationEngine::new(prefs).negotiate(variants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MetadataCatalog;
    use crate::model::Candidate;
    use crate::preference::RequestHeaders;
    use crate::resolver::{StepBudget, VariantResolver};

    const CATALOG: &str = "\
.html: t=text/html
.txt: t=text/plain;q=0.8
.en: l=en
.fr: l=fr;q=0.7
";

    fn resolve(names: &[&str]) -> Vec<Variant> {
        let cat = MetadataCatalog::parse(CATALOG);
        let mut r = VariantResolver::new(&cat, StepBudget::default());
        let candidates = names.iter().map(|n| Candidate::new(*n, 100)).collect();
        r.resolve_all(candidates)
    }

    fn prefs(headers: RequestHeaders) -> RequestPreferences {
        RequestPreferences::from_headers(&headers)
    }

    fn assert_close(a: Quality, b: f64) {
        assert!((a.value() - b).abs() < 1e-9, "{} != {}", a.value(), b);
    }

    #[test]
    fn test_score_formula() {
        let p = prefs(
            RequestHeaders::new()
                .accept("text/html;q=1, text/plain;q=0.5")
                .accept_language("fr;q=1, en;q=0.3"),
        );
        let engine = NegotiationEngine::new(&p);
        let v = resolve(&["intro.html.en", "intro.html.fr", "intro.txt.en"]);
        assert_close(engine.score(&v[0]), 0.3);
        assert_close(engine.score(&v[1]), 0.7);
        assert_close(engine.score(&v[2]), 0.12);
    }

    #[test]
    fn test_single_acceptable_is_unique() {
        let n = negotiate(resolve(&["intro.html"]), &RequestPreferences::default()).unwrap();
        assert!(n.is_unique());
        assert_eq!(n.vary, None);
        assert_eq!(n.candidate_count, 1);
    }

    #[test]
    fn test_single_unacceptable() {
        let p = prefs(RequestHeaders::new().accept("image/png"));
        let n = negotiate(resolve(&["intro.html"]), &p).unwrap();
        match n.outcome {
            NegotiationOutcome::Unacceptable(v) => {
                assert_eq!(v.len(), 1);
                assert_eq!(v[0].negotiated_quality(), Some(Quality::ZERO));
            }
            other => panic!("expected Unacceptable, got {other:?}"),
        }
    }

    #[test]
    fn test_tie_keeps_first() {
        let n = negotiate(resolve(&["intro.html", "intro.html.en"]), &RequestPreferences::default()).unwrap();
        assert_eq!(n.winner().unwrap().name, "intro.html");
        let n = negotiate(resolve(&["intro.html.en", "intro.html"]), &RequestPreferences::default()).unwrap();
        assert_eq!(n.winner().unwrap().name, "intro.html.en");
    }

    #[test]
    fn test_trans_forces_list() {
        let p = prefs(RequestHeaders::new().negotiate("trans"));
        let n = negotiate(resolve(&["intro.html.en", "intro.txt.fr"]), &p).unwrap();
        match &n.outcome {
            NegotiationOutcome::Ambiguous(v) => assert_eq!(v.len(), 2),
            other => panic!("expected Ambiguous, got {other:?}"),
        }
        assert_eq!(n.alternates.len(), 2);
    }

    #[test]
    fn test_trans_with_single_candidate_selects() {
        let p = prefs(RequestHeaders::new().negotiate("trans"));
        let n = negotiate(resolve(&["intro.html.en"]), &p).unwrap();
        assert!(n.is_unique());
    }

    #[test]
    fn test_empty_candidates() {
        assert!(negotiate(Vec::new(), &RequestPreferences::default()).is_none());
    }

    #[test]
    fn test_vary_counts_missing_language() {
        let n = negotiate(resolve(&["intro.html.en", "intro.html"]), &RequestPreferences::default()).unwrap();
        assert!(n.vary.unwrap().language);

        // Accept-Language decides between them, so caches must key on it.
        let de = negotiate(resolve(&["intro.html.en", "intro.html"]), &prefs(RequestHeaders::new().accept_language("de"))).unwrap();
        let en = negotiate(resolve(&["intro.html.en", "intro.html"]), &prefs(RequestHeaders::new().accept_language("en"))).unwrap();
        assert_eq!(de.winner().unwrap().name, "intro.html");
        assert_eq!(en.winner().unwrap().name, "intro.html.en");
        assert_eq!(crate::protocol::vary_value(&de.vary.unwrap()), "negotiate,Accept-Language");
    }

    #[test]
    fn test_vary_ignores_uniformly_missing_language() {
        let n = negotiate(resolve(&["intro.html", "intro.txt"]), &RequestPreferences::default()).unwrap();
        let vary = n.vary.unwrap();
        assert!(!vary.language);
        assert!(vary.media_type);
    }

    #[test]
    fn test_vary_dimensions() {
        let n = negotiate(resolve(&["intro.html.en", "intro.html.fr"]), &RequestPreferences::default()).unwrap();
        let vary = n.vary.unwrap();
        assert!(vary.language);
        assert!(!vary.media_type);
        assert!(!vary.charset);
        assert_eq!(vary.dimensions().collect::<Vec<_>>(), vec![Dimension::Language]);
    }

    #[test]
    fn test_alternate_rendering() {
        let v = resolve(&["intro.html.fr"]);
        let alt = Alternate::of(&v[0]);
        assert_eq!(
            alt.to_string(),
            r#"{"intro.html.fr" 0.70000} {type text/html} {charset UTF-8} {language fr}"#
        );
    }

    #[test]
    fn test_language_less_variant_neutral() {
        let p = prefs(RequestHeaders::new().accept_language("de"));
        let engine = NegotiationEngine::new(&p);
        let v = resolve(&["intro.html", "intro.html.en"]);
        assert_eq!(engine.score(&v[0]), Quality::ONE);
        assert_eq!(engine.score(&v[1]), Quality::ZERO);
    }
}
