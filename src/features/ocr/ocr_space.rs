//! # Feature: OCR.space Text Extraction
//!
//! Sends a base64-encoded image to the OCR.space parse endpoint and returns
//! the parsed text. Any transport or service failure is a transcription error;
//! there is no retry.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use crate::core::MedScanError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use log::{error, info};
use serde::Deserialize;
use std::time::Duration;

pub const OCR_SPACE_URL: &str = "https://api.ocr.space/parse/image";

/// OCR collaborator: image bytes in, text (or "no text") out
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// `Ok(None)` means the service found no text in the image
    async fn extract_text(&self, image: &[u8], language: &str) -> Result<Option<String>, MedScanError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParseResponse {
    #[serde(default)]
    parsed_results: Vec<ParsedResult>,
    #[serde(default)]
    is_errored_on_processing: bool,
    #[serde(default)]
    error_message: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParsedResult {
    #[serde(default)]
    parsed_text: Option<String>,
}

/// Pull the first parsed text out of an OCR.space response body
pub fn parse_ocr_response(body: &str) -> Result<Option<String>, MedScanError> {
    let response: ParseResponse = serde_json::from_str(body)
        .map_err(|e| MedScanError::Transcription(format!("unexpected response format: {e}")))?;

    if response.is_errored_on_processing {
        let message = response
            .error_message
            .map(|m| match m {
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_else(|| "processing failed".to_string());
        return Err(MedScanError::Transcription(message));
    }

    Ok(response
        .parsed_results
        .into_iter()
        .next()
        .and_then(|r| r.parsed_text)
        .filter(|text| !text.is_empty()))
}

/// Encode raw image bytes as the data URI OCR.space expects
pub fn to_data_uri(image: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", STANDARD.encode(image))
}

#[derive(Clone)]
pub struct OcrSpaceClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl OcrSpaceClient {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self, MedScanError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(OcrSpaceClient {
            http,
            api_key,
            endpoint: OCR_SPACE_URL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl TextExtractor for OcrSpaceClient {
    async fn extract_text(&self, image: &[u8], language: &str) -> Result<Option<String>, MedScanError> {
        info!("Sending {} byte image for OCR ({language})", image.len());

        let form = reqwest::multipart::Form::new()
            .text("base64Image", to_data_uri(image))
            .text("language", language.to_string())
            .text("isOverlayRequired", "false");

        let response = self
            .http
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("OCR error: {e}");
                MedScanError::Transcription(format!("HTTP request failed: {e}"))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MedScanError::Transcription(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            error!("OCR service returned {status}");
            return Err(MedScanError::Transcription(format!(
                "OCR service returned {status}"
            )));
        }

        parse_ocr_response(&body)
    }
}
