//! Environment-driven configuration
//!
//! Values are read from the process environment after `.env` has been
//! loaded by the binary with `dotenvy`.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Added OPENFDA_RESULT_LIMIT and HTTP_TIMEOUT_SECS
//! - 1.0.0: Initial release

use crate::core::error::MedScanError;
use anyhow::Result;
use std::env;

/// Default OCR language code understood by OCR.space
pub const DEFAULT_OCR_LANGUAGE: &str = "eng";
/// Default request timeout for the OCR and openFDA clients
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Default number of events requested per drug name
pub const DEFAULT_OPENFDA_RESULT_LIMIT: u32 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// OCR.space API key (only needed for `scan`)
    pub ocr_api_key: Option<String>,
    /// openFDA API key; anonymous access works with lower quotas
    pub openfda_api_key: Option<String>,
    pub ocr_language: String,
    pub log_level: String,
    /// Optional YAML file replacing the built-in vocabulary
    pub vocabulary_path: Option<String>,
    pub http_timeout_secs: u64,
    pub openfda_result_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ocr_api_key: None,
            openfda_api_key: None,
            ocr_language: DEFAULT_OCR_LANGUAGE.to_string(),
            log_level: "info".to_string(),
            vocabulary_path: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            openfda_result_limit: DEFAULT_OPENFDA_RESULT_LIMIT,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let http_timeout_secs = match non_empty("HTTP_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|e| MedScanError::Config(format!("Invalid HTTP_TIMEOUT_SECS '{v}': {e}")))?,
            None => defaults.http_timeout_secs,
        };

        let openfda_result_limit = match non_empty("OPENFDA_RESULT_LIMIT") {
            Some(v) => v
                .trim()
                .parse::<u32>()
                .map_err(|e| {
                    MedScanError::Config(format!("Invalid OPENFDA_RESULT_LIMIT '{v}': {e}"))
                })?,
            None => defaults.openfda_result_limit,
        };

        if openfda_result_limit == 0 {
            return Err(
                MedScanError::Config("OPENFDA_RESULT_LIMIT must be at least 1".to_string()).into(),
            );
        }

        Ok(Config {
            ocr_api_key: non_empty("OCR_SPACE_API_KEY"),
            openfda_api_key: non_empty("OPENFDA_API_KEY"),
            ocr_language: non_empty("OCR_LANGUAGE").unwrap_or(defaults.ocr_language),
            log_level: non_empty("LOG_LEVEL").unwrap_or(defaults.log_level),
            vocabulary_path: non_empty("MEDSCAN_VOCABULARY_PATH"),
            http_timeout_secs,
            openfda_result_limit,
        })
    }

    /// OCR key or a configuration error naming the missing variable
    pub fn require_ocr_api_key(&self) -> Result<&str> {
        let key = self
            .ocr_api_key
            .as_deref()
            .ok_or_else(|| MedScanError::Config("OCR_SPACE_API_KEY is not set".to_string()))?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.ocr_language, "eng");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.http_timeout_secs, 30);
        assert_eq!(config.openfda_result_limit, 5);
        assert!(config.ocr_api_key.is_none());
        assert!(config.require_ocr_api_key().is_err());
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("OCR_SPACE_API_KEY", "abc"),
            ("OPENFDA_API_KEY", "fda"),
            ("OCR_LANGUAGE", "ger"),
            ("LOG_LEVEL", "debug"),
            ("HTTP_TIMEOUT_SECS", "10"),
            ("OPENFDA_RESULT_LIMIT", "3"),
            ("MEDSCAN_VOCABULARY_PATH", "vocab.yaml"),
        ]))
        .unwrap();

        assert_eq!(config.require_ocr_api_key().unwrap(), "abc");
        assert_eq!(config.openfda_api_key.as_deref(), Some("fda"));
        assert_eq!(config.ocr_language, "ger");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.http_timeout_secs, 10);
        assert_eq!(config.openfda_result_limit, 3);
        assert_eq!(config.vocabulary_path.as_deref(), Some("vocab.yaml"));
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[("OCR_SPACE_API_KEY", "  ")])).unwrap();
        assert!(config.ocr_api_key.is_none());
    }

    #[test]
    fn test_rejects_bad_numbers() {
        for pairs in [[("HTTP_TIMEOUT_SECS", "soon")], [("OPENFDA_RESULT_LIMIT", "0")]] {
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<MedScanError>(),
                Some(MedScanError::Config(_))
            ));
        }
    }

    #[test]
    fn test_missing_ocr_key_is_config_error() {
        let err = Config::default().require_ocr_api_key().unwrap_err();
        assert!(err.to_string().contains("OCR_SPACE_API_KEY"));
        assert!(err.downcast_ref::<MedScanError>().is_some());
    }
}
