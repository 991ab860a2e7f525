//! # Feature: Medication Text Matching
//!
//! Reduces raw OCR text to a short, ordered list of known medication names.
//! Tokens are whole words of four or more ASCII letters; a token is kept only
//! when it equals a vocabulary entry ignoring case. Results are deduplicated
//! in first-seen order and capped before they drive drug-event lookups.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Keep matches past the lookup cap as overflow for the full tag view
//! - 1.1.0: Deduplicate case-insensitively, report canonical spellings
//! - 1.0.0: Initial release

use crate::core::MatchError;
use crate::features::matching::vocabulary::MedicationVocabulary;
use log::debug;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

/// Maximum number of matches dispatched to drug-event lookup
pub const MAX_LOOKUP_MATCHES: usize = 5;

/// Minimum token length considered a medication candidate
pub const MIN_TOKEN_LEN: usize = 4;

/// Word runs as seen by an ASCII `\b` boundary
static WORD_RUN: OnceLock<Regex> = OnceLock::new();

fn word_run() -> &'static Regex {
    WORD_RUN.get_or_init(|| Regex::new(r"[A-Za-z0-9_]+").expect("word run pattern is valid"))
}

/// Ordered, deduplicated medication matches for one piece of text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// First `MAX_LOOKUP_MATCHES` matches; these drive lookups
    pub matches: Vec<String>,
    /// Matches past the cap, still shown in the tag list
    pub overflow: Vec<String>,
}

impl MatchResult {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Every match in text order, including overflow
    pub fn all_tags(&self) -> Vec<String> {
        self.matches
            .iter()
            .chain(self.overflow.iter())
            .cloned()
            .collect()
    }
}

/// Split text into candidate tokens.
///
/// A candidate is a maximal word run (`[A-Za-z0-9_]`) made only of ASCII
/// letters and at least `MIN_TOKEN_LEN` long. `Amox500` and `ab_cdef` yield
/// nothing, `Co-Amoxiclav` yields `Amoxiclav`.
pub fn extract_tokens(text: &str) -> Vec<&str> {
    word_run()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|run| run.len() >= MIN_TOKEN_LEN && run.bytes().all(|b| b.is_ascii_alphabetic()))
        .collect()
}

#[derive(Debug, Clone)]
pub struct MedicationTextMatcher {
    vocabulary: Arc<MedicationVocabulary>,
}

impl MedicationTextMatcher {
    pub fn new(vocabulary: Arc<MedicationVocabulary>) -> Self {
        MedicationTextMatcher { vocabulary }
    }

    pub fn vocabulary(&self) -> &MedicationVocabulary {
        &self.vocabulary
    }

    /// Match OCR output against the vocabulary.
    ///
    /// Returns `NoTextDetected` when every line is blank and
    /// `NoKnownMedicationFound` when text exists but nothing matched.
    /// An empty vocabulary yields an empty result rather than an error.
    pub fn match_text(&self, raw_text: &str) -> Result<MatchResult, MatchError> {
        let lines: Vec<&str> = raw_text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .collect();

        if lines.is_empty() {
            return Err(MatchError::NoTextDetected);
        }

        if self.vocabulary.is_empty() {
            debug!("Vocabulary is empty, skipping match");
            return Ok(MatchResult::default());
        }

        let joined = lines.join(" ");
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for token in extract_tokens(&joined) {
            if let Some(canonical) = self.vocabulary.canonical(token) {
                if seen.insert(canonical.to_lowercase()) {
                    found.push(canonical.to_string());
                }
            }
        }

        if found.is_empty() {
            debug!("No medication names among {} line(s) of text", lines.len());
            return Err(MatchError::NoKnownMedicationFound);
        }

        let overflow = if found.len() > MAX_LOOKUP_MATCHES {
            found.split_off(MAX_LOOKUP_MATCHES)
        } else {
            Vec::new()
        };

        debug!(
            "Matched {} medication(s), {} over the lookup cap",
            found.len(),
            overflow.len()
        );

        Ok(MatchResult {
            matches: found,
            overflow,
        })
    }
}
