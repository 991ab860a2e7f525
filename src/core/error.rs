//! Error taxonomy for the capture pipeline and reminder scheduling
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

/// Terminal outcomes of matching OCR text against the vocabulary.
///
/// These are the two conditions that stop a capture before any lookup
/// runs, and they are reported to the user with different messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchError {
    #[error("No text detected.")]
    NoTextDetected,

    #[error("No valid medication names found in extracted text.")]
    NoKnownMedicationFound,
}

#[derive(Debug, thiserror::Error)]
pub enum MedScanError {
    /// The OCR call itself failed. Never retried.
    #[error("Transcription failed: {0}")]
    Transcription(String),

    /// A single drug-event lookup failed. Logged, never propagated to siblings.
    #[error("Lookup failed for {drug}: {reason}")]
    Lookup { drug: String, reason: String },

    /// A single reminder could not be handed to the notifier.
    #[error("Scheduling failed for {hour:02}:00: {reason}")]
    Scheduling { hour: u32, reason: String },

    #[error("Invalid target hour {0} (expected 0-23)")]
    InvalidHour(u32),

    #[error("Invalid vocabulary: {0}")]
    InvalidVocabulary(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_error_messages_are_distinct() {
        assert_eq!(MatchError::NoTextDetected.to_string(), "No text detected.");
        assert_eq!(
            MatchError::NoKnownMedicationFound.to_string(),
            "No valid medication names found in extracted text."
        );
    }

    #[test]
    fn test_scheduling_message() {
        let scheduling = MedScanError::Scheduling {
            hour: 8,
            reason: "denied".to_string(),
        };
        assert_eq!(
            scheduling.to_string(),
            "Scheduling failed for 08:00: denied"
        );
    }
}
