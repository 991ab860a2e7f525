//! Drug-event record and lookup contract

use crate::core::MedScanError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One adverse-event report returned for a searched drug name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrugEvent {
    /// Report identifier from the event database
    pub id: String,
    /// Reaction labels (MedDRA preferred terms)
    pub reactions: Vec<String>,
    /// Product names listed on the report
    pub products: Vec<String>,
    /// Search term that produced this event
    pub source_drug: String,
}

/// Drug-event database collaborator
#[async_trait]
pub trait DrugEventLookup: Send + Sync {
    /// Fetch events for one drug name. An empty list is a normal result.
    async fn lookup(&self, drug_name: &str) -> Result<Vec<DrugEvent>, MedScanError>;
}
