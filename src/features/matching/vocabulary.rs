//! # Medication Vocabulary
//!
//! Fixed set of canonical medication names. Matching is case-insensitive,
//! display keeps the canonical spelling.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: YAML loading via MEDSCAN_VOCABULARY_PATH
//! - 1.0.0: Initial release with the built-in list

use crate::core::MedScanError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Names recognised when no vocabulary file is configured
pub const DEFAULT_MEDICATIONS: &[&str] = &[
    "Amoxicillin",
    "Ibuprofen",
    "Paracetamol",
    "Metformin",
    "Atorvastatin",
    "Omeprazole",
    "Amlodipine",
    "Lisinopril",
    "Hydrochlorothiazide",
    "Simvastatin",
    "Azithromycin",
    "Albuterol",
    "Levothyroxine",
    "Gabapentin",
    "Sertraline",
];

/// On-disk vocabulary format
#[derive(Debug, Deserialize)]
struct VocabularyFile {
    names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MedicationVocabulary {
    /// Canonical names in insertion order
    names: Vec<String>,
    /// lowercase -> index into `names`
    index: HashMap<String, usize>,
}

impl Default for MedicationVocabulary {
    fn default() -> Self {
        let mut vocabulary = Self::empty();
        for name in DEFAULT_MEDICATIONS {
            vocabulary.insert(name);
        }
        vocabulary
    }
}

impl MedicationVocabulary {
    pub fn empty() -> Self {
        MedicationVocabulary {
            names: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build from canonical names. Case-insensitive duplicates keep the first spelling.
    pub fn from_names<I, S>(names: I) -> Result<Self, MedScanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = Self::empty();

        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(MedScanError::InvalidVocabulary(
                    "medication names cannot be blank".to_string(),
                ));
            }

            vocabulary.insert(name);
        }

        Ok(vocabulary)
    }

    /// Add `name` unless a case-insensitive equal is already present
    fn insert(&mut self, name: &str) {
        let key = name.to_lowercase();
        if !self.index.contains_key(&key) {
            self.index.insert(key, self.names.len());
            self.names.push(name.to_string());
        }
    }

    /// Load a vocabulary from a YAML file of the form `names: [..]`
    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vocabulary file {path}"))?;
        let file: VocabularyFile = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse vocabulary file {path}"))?;
        Ok(Self::from_names(file.names)?)
    }

    /// Canonical spelling for `word`, if it names a known medication
    pub fn canonical(&self, word: &str) -> Option<&str> {
        self.index
            .get(&word.to_lowercase())
            .map(|&i| self.names[i].as_str())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.canonical(word).is_some()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary() {
        let vocab = MedicationVocabulary::default();
        assert_eq!(vocab.len(), DEFAULT_MEDICATIONS.len());
        assert!(vocab.names().eq(DEFAULT_MEDICATIONS.iter().copied()));
        assert!(vocab.contains("amoxicillin"));
        assert!(vocab.contains("SERTRALINE"));
        assert!(!vocab.contains("aspirin"));
    }

    #[test]
    fn test_canonical_preserves_case() {
        let vocab = MedicationVocabulary::default();
        assert_eq!(vocab.canonical("hydrochlorothiazide"), Some("Hydrochlorothiazide"));
        assert_eq!(vocab.canonical("IBUPROFEN"), Some("Ibuprofen"));
        assert_eq!(vocab.canonical("Ibu"), None);
    }

    #[test]
    fn test_duplicates_keep_first_spelling() {
        let vocab = MedicationVocabulary::from_names(["Metformin", "METFORMIN", " Aspirin "]).unwrap();
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.canonical("metformin"), Some("Metformin"));
        assert_eq!(vocab.canonical("aspirin"), Some("Aspirin"));
    }

    #[test]
    fn test_blank_names_rejected() {
        let result = MedicationVocabulary::from_names(["Metformin", "  "]);
        assert!(matches!(result, Err(MedScanError::InvalidVocabulary(_))));
    }

    #[test]
    fn test_load_from_yaml() {
        let path = std::env::temp_dir().join(format!("medscan_vocab_{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "names:\n  - Warfarin\n  - Digoxin\n").unwrap();

        let vocab = MedicationVocabulary::load(path.to_str().unwrap()).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(vocab.names().collect::<Vec<_>>(), vec!["Warfarin", "Digoxin"]);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(MedicationVocabulary::load("/nonexistent/vocab.yaml").is_err());
    }
}
