//! # Matching Feature
//!
//! OCR text to medication-name matching against a fixed vocabulary.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod matcher;
pub mod vocabulary;

pub use matcher::{extract_tokens, MatchResult, MedicationTextMatcher, MAX_LOOKUP_MATCHES};
pub use vocabulary::{MedicationVocabulary, DEFAULT_MEDICATIONS};
