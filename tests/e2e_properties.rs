//! Property-based tests for header parsing and negotiation.
//!
//! - Parsers never panic and keep every quality within [0, 1]
//! - Identical inputs always produce identical outcomes
//! - Ties always go to the earliest candidate

use proptest::prelude::*;
use webzip_rs::catalog::MetadataCatalog;
use webzip_rs::negotiation::negotiate;
use webzip_rs::resolver::{StepBudget, VariantResolver};
use webzip_rs::{Candidate, Dimension, PreferenceTable, RequestHeaders, RequestPreferences, Variant};

const CATALOG: &str = "\
.html: t=text/html
.txt: t=text/plain;q=0.8
.xml: t=application/xml;q=0.6
.en: l=en
.fr: l=fr;q=0.7
.de: l=de;q=0.9
.l1: c=ISO-8859-1;q=0.5
";

/// Candidate names built from known and unknown suffixes.
fn name_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just(".html"),
            Just(".txt"),
            Just(".xml"),
            Just(".en"),
            Just(".fr"),
            Just(".de"),
            Just(".l1"),
            Just(".bak"),
        ],
        0..5,
    )
    .prop_map(|suffixes| format!("page{}", suffixes.concat()))
}

/// Loosely header-shaped text, including junk.
fn header_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z*]{1,5}(/[a-z*]{1,5})?(;q=[01](\\.[0-9]{1,3})?)?(, ?[a-z*]{1,5}(/[a-z*]{1,5})?(;q=[0-9.]{1,4})?){0,3}",
        "[ -~]{0,40}",
    ]
}

fn resolve(names: &[String]) -> Vec<Variant> {
    let catalog = MetadataCatalog::parse(CATALOG);
    let mut resolver = VariantResolver::new(&catalog, StepBudget::default());
    let candidates = names.iter().map(|n| Candidate::new(n.clone(), 1)).collect();
    resolver.resolve_all(candidates)
}

fn summary(names: &[String], headers: &RequestHeaders) -> (String, Vec<String>) {
    let prefs = RequestPreferences::from_headers(headers);
    let result = negotiate(resolve(names), &prefs).unwrap();
    let tag = format!("{:?}", webzip_rs::protocol::status_code(&result.outcome));
    let winner = result.winner().map(|v| v.name.clone()).unwrap_or_default();
    let alternates = result.alternates.iter().map(|a| a.to_string()).collect();
    (format!("{tag}:{winner}"), alternates)
}

proptest! {
    #[test]
    fn prop_preference_qualities_in_range(text in header_strategy()) {
        for dim in [Dimension::Type, Dimension::Charset, Dimension::Language] {
            let table = PreferenceTable::parse(dim, Some(text.as_str()));
            prop_assert!(!table.is_empty());
            for (_, q) in table.iter() {
                prop_assert!((0.0..=1.0).contains(&q.value()));
            }
        }
    }

    #[test]
    fn prop_catalog_never_loses_default(text in "[ -~\n]{0,120}") {
        let catalog = MetadataCatalog::parse(&text);
        prop_assert!(catalog.rule("DEFAULT").is_some());
        prop_assert!(!catalog.default_charset().value.is_empty());
    }

    #[test]
    fn prop_negotiation_is_pure(
        names in prop::collection::vec(name_strategy(), 1..6),
        accept in header_strategy(),
        language in header_strategy(),
    ) {
        let headers = RequestHeaders::new().accept(accept).accept_language(language);
        prop_assert_eq!(summary(&names, &headers), summary(&names, &headers));
    }

    #[test]
    fn prop_scores_in_range(
        names in prop::collection::vec(name_strategy(), 1..6),
        accept in header_strategy(),
    ) {
        let prefs = RequestPreferences::from_headers(&RequestHeaders::new().accept(accept));
        let result = negotiate(resolve(&names), &prefs).unwrap();
        prop_assert_eq!(result.alternates.len(), names.len());
        if let Some(winner) = result.winner() {
            let q = winner.negotiated_quality().unwrap().value();
            prop_assert!(q > 0.0 && q <= 1.0);
        }
    }

    #[test]
    fn prop_ties_go_to_first(name in name_strategy(), copies in 2usize..5) {
        // Identical names resolve identically, so every score ties.
        let names = vec![name; copies];
        let mut variants = resolve(&names);
        for (i, v) in variants.iter_mut().enumerate() {
            v.size = i as u64;
        }
        let result = negotiate(variants, &RequestPreferences::default()).unwrap();
        if let Some(winner) = result.winner() {
            prop_assert_eq!(winner.size, 0);
        }
    }
}
