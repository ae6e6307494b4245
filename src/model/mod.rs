//! # Variant Model
//!
//! Plain data shared by every stage: qualities, media types, languages,
//! candidates and resolved variants. No parsing, no I/O beyond the
//! lazily opened stream handle.

pub mod quality;
pub mod media;
pub mod variant;

pub use quality::Quality;
pub use media::{MediaType, Language, LanguageSet, add_language};
pub use variant::{
    Candidate, Variant, VariantMetadata,
    StreamHandle, StreamSource, leaf_name,
};
