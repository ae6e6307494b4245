//! Response header values for a negotiation result.
//!
//! Builds the values a response layer needs; sending them is the caller's
//! business.
//!
//! ```text
//! Negotiation → response_headers() → [(name, value), ...]
//!   Unique       200  Content-Type, Content-Language, Content-Location, Content-Length
//!   Ambiguous    300  TCN: list, Alternates
//!   Unacceptable 406  TCN: list, Alternates
//! ```

use chrono::{DateTime, Utc};

use crate::model::Variant;
use crate::negotiation::{Negotiation, NegotiationOutcome, VarySet};
use crate::preference::Dimension;

/// Plain-text body for a 406 response.
pub const UNACCEPTABLE_BODY: &str = "There is nothing acceptable for your request.";

/// HTTP status for an outcome.
pub fn status_code(outcome: &NegotiationOutcome) -> u16 {
    match outcome {
        NegotiationOutcome::Unique(_) => 200,
        NegotiationOutcome::Ambiguous(_) => 300,
        NegotiationOutcome::Unacceptable(_) => 406,
    }
}

/// `Vary` value: always `negotiate`, then the request header of each
/// varying dimension.
pub fn vary_value(vary: &VarySet) -> String {
    std::iter::once("negotiate")
        .chain(vary.dimensions().map(Dimension::header_name))
        .collect::<Vec<_>>()
        .join(",")
}

/// `Content-Type` value, with a charset parameter when one is known.
pub fn content_type_value(variant: &Variant) -> String {
    if variant.charset.is_empty() {
        variant.media_type.to_string()
    } else {
        format!("{}; charset={}", variant.media_type, variant.charset)
    }
}

/// `Content-Language` value, or `None` for a variant without languages.
pub fn content_language_value(variant: &Variant) -> Option<String> {
    if variant.languages.is_empty() {
        return None;
    }
    Some(variant.language_tags().collect::<Vec<_>>().join(","))
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Every negotiation-related response header, in emission order.
pub fn response_headers(
    negotiation: &Negotiation,
    last_modified: Option<DateTime<Utc>>,
) -> Vec<(&'static str, String)> {
    let mut headers = Vec::new();

    if let Some(vary) = &negotiation.vary {
        headers.push(("Vary", vary_value(vary)));
    }
    if let Some(time) = last_modified {
        headers.push(("Last-Modified", http_date(time)));
    }

    match &negotiation.outcome {
        NegotiationOutcome::Unique(winner) => {
            if negotiation.candidate_count > 1 {
                headers.push(("Content-Location", winner.leaf_name().to_string()));
            }
            if let Some(languages) = content_language_value(winner) {
                headers.push(("Content-Language", languages));
            }
            headers.push(("Content-Type", content_type_value(winner)));
            headers.push(("Content-Length", winner.size.to_string()));
        }
        NegotiationOutcome::Ambiguous(_) => {
            headers.push(("TCN", "list".to_string()));
            headers.push(("Alternates", negotiation.alternates_value()));
        }
        NegotiationOutcome::Unacceptable(_) => {
            headers.push(("TCN", "list".to_string()));
            headers.push(("Alternates", negotiation.alternates_value()));
            headers.push(("Content-Type", "text/plain; charset=UTF-8".to_string()));
        }
    }

    headers
}
