//! # Feature: openFDA Drug Events
//!
//! Queries the openFDA adverse-event endpoint for reports mentioning a
//! medicinal product by name.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Treat 404 "No matches found" as an empty result
//! - 1.0.0: Initial release

use crate::core::MedScanError;
use crate::features::lookup::types::{DrugEvent, DrugEventLookup};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;
use std::time::Duration;

pub const OPENFDA_EVENT_URL: &str = "https://api.fda.gov/drug/event.json";

#[derive(Debug, Default, Deserialize)]
struct EventResponse {
    #[serde(default)]
    results: Vec<EventRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct EventRecord {
    #[serde(default)]
    safetyreportid: Option<String>,
    #[serde(default)]
    patient: Option<PatientRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct PatientRecord {
    #[serde(default)]
    reaction: Vec<ReactionRecord>,
    #[serde(default)]
    drug: Vec<DrugRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct ReactionRecord {
    #[serde(default)]
    reactionmeddrapt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DrugRecord {
    #[serde(default)]
    medicinalproduct: Option<String>,
}

/// Convert an openFDA event payload into events tagged with `drug_name`
pub fn parse_event_response(body: &str, drug_name: &str) -> Result<Vec<DrugEvent>, MedScanError> {
    let response: EventResponse = serde_json::from_str(body)?;

    Ok(response
        .results
        .into_iter()
        .map(|record| {
            let patient = record.patient.unwrap_or_default();
            DrugEvent {
                id: record.safetyreportid.unwrap_or_default(),
                reactions: patient
                    .reaction
                    .into_iter()
                    .filter_map(|r| r.reactionmeddrapt)
                    .collect(),
                products: patient
                    .drug
                    .into_iter()
                    .filter_map(|d| d.medicinalproduct)
                    .collect(),
                source_drug: drug_name.to_string(),
            }
        })
        .collect())
}

#[derive(Clone)]
pub struct OpenFdaClient {
    http: reqwest::Client,
    api_key: Option<String>,
    result_limit: u32,
    base_url: String,
}

impl OpenFdaClient {
    pub fn new(api_key: Option<String>, result_limit: u32, timeout_secs: u64) -> Result<Self, MedScanError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("medscan/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(OpenFdaClient {
            http,
            api_key,
            result_limit,
            base_url: OPENFDA_EVENT_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (staging or a local mirror)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn search_query(drug_name: &str) -> String {
        format!("patient.drug.medicinalproduct:\"{drug_name}\"")
    }
}

#[async_trait]
impl DrugEventLookup for OpenFdaClient {
    async fn lookup(&self, drug_name: &str) -> Result<Vec<DrugEvent>, MedScanError> {
        let mut query = vec![
            ("search", Self::search_query(drug_name)),
            ("limit", self.result_limit.to_string()),
        ];
        if let Some(ref key) = self.api_key {
            query.push(("api_key", key.clone()));
        }

        debug!("Querying openFDA for {drug_name}");

        let response = self
            .http
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| MedScanError::Lookup {
                drug: drug_name.to_string(),
                reason: if e.is_timeout() {
                    "request timed out".to_string()
                } else {
                    format!("HTTP request failed: {e}")
                },
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            warn!("No FDA drug events found for \"{drug_name}\"");
            return Ok(Vec::new());
        }

        let body = response.text().await?;
        if !status.is_success() {
            return Err(MedScanError::Lookup {
                drug: drug_name.to_string(),
                reason: format!("openFDA returned {status}"),
            });
        }

        let events = parse_event_response(&body, drug_name)?;
        info!("openFDA returned {} event(s) for {drug_name}", events.len());
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http_stub::serve_once;

    const SAMPLE: &str = r#"{
        "meta": {"results": {"skip": 0, "limit": 2, "total": 1234}},
        "results": [
            {
                "safetyreportid": "10003304",
                "patient": {
                    "reaction": [{"reactionmeddrapt": "NAUSEA"}, {"reactionmeddrapt": "RASH"}],
                    "drug": [{"medicinalproduct": "IBUPROFEN"}, {"medicinalproduct": "ADVIL"}]
                }
            },
            {
                "safetyreportid": "10003305"
            }
        ]
    }"#;

    #[test]
    fn test_parse_event_response() {
        let events = parse_event_response(SAMPLE, "Ibuprofen").unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "10003304");
        assert_eq!(events[0].reactions, vec!["NAUSEA", "RASH"]);
        assert_eq!(events[0].products, vec!["IBUPROFEN", "ADVIL"]);
        assert_eq!(events[0].source_drug, "Ibuprofen");
        assert!(events[1].reactions.is_empty());
        assert!(events[1].products.is_empty());
    }

    #[test]
    fn test_parse_empty_results() {
        let events = parse_event_response(r#"{"meta": {}}"#, "Metformin").unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(
            parse_event_response("not json", "Metformin"),
            Err(MedScanError::Json(_))
        ));
    }

    fn client(api_key: Option<&str>, url: &str) -> OpenFdaClient {
        OpenFdaClient::new(api_key.map(str::to_string), 3, 5)
            .unwrap()
            .with_base_url(url)
    }

    #[tokio::test]
    async fn test_lookup_sends_query_and_tags_events() {
        let (url, server) = serve_once(200, SAMPLE).await;

        let events = client(Some("secret"), &url).lookup("Ibuprofen").await.unwrap();
        let request = server.await.unwrap();

        assert!(request.starts_with("GET /?"));
        assert!(request.contains("search=patient.drug.medicinalproduct%3A%22Ibuprofen%22"));
        assert!(request.contains("limit=3"));
        assert!(request.contains("api_key=secret"));
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.source_drug == "Ibuprofen"));
    }

    #[tokio::test]
    async fn test_lookup_without_key_omits_param() {
        let (url, server) = serve_once(200, r#"{"results": []}"#).await;

        let events = client(None, &url).lookup("Metformin").await.unwrap();
        let request = server.await.unwrap();

        assert!(events.is_empty());
        assert!(!request.contains("api_key"));
    }

    #[tokio::test]
    async fn test_not_found_is_empty() {
        let body = r#"{"error": {"code": "NOT_FOUND", "message": "No matches found!"}}"#;
        let (url, _server) = serve_once(404, body).await;

        let events = client(None, &url).lookup("Gabapentin").await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_lookup_failure() {
        let (url, _server) = serve_once(503, r#"{"error": "busy"}"#).await;

        match client(None, &url).lookup("Metformin").await {
            Err(MedScanError::Lookup { drug, reason }) => {
                assert_eq!(drug, "Metformin");
                assert!(reason.contains("503"));
            }
            other => panic!("expected lookup error, got {other:?}"),
        }
    }

    #[test]
    fn test_search_query_quotes_name() {
        assert_eq!(
            OpenFdaClient::search_query("Metformin"),
            "patient.drug.medicinalproduct:\"Metformin\""
        );
    }
}
