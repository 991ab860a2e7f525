//! # Feature: Lookup Fan-out
//!
//! Runs one drug-event lookup per matched name, all concurrently, and
//! streams each outcome back as soon as it completes. A failed or empty
//! lookup is reported and logged but never cancels its siblings.
//!
//! Arrival order across lookups is not deterministic.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false

use crate::features::lookup::types::{DrugEvent, DrugEventLookup};
use crate::features::matching::MAX_LOOKUP_MATCHES;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outcome of a single lookup, delivered in completion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupUpdate {
    /// Events found, each tagged with `drug`
    Events { drug: String, events: Vec<DrugEvent> },
    /// Lookup succeeded with no events
    Empty { drug: String },
    /// Lookup failed; siblings are unaffected
    Failed { drug: String, reason: String },
}

impl LookupUpdate {
    pub fn drug(&self) -> &str {
        match self {
            LookupUpdate::Events { drug, .. }
            | LookupUpdate::Empty { drug }
            | LookupUpdate::Failed { drug, .. } => drug,
        }
    }
}

/// Everything a fan-out produced once all lookups settled
#[derive(Debug, Clone, Default)]
pub struct FanOutReport {
    /// All events in arrival order
    pub events: Vec<DrugEvent>,
    /// Names whose lookup returned nothing
    pub empty: Vec<String>,
    /// (name, reason) for failed lookups
    pub failures: Vec<(String, String)>,
}

impl FanOutReport {
    /// Fold one update into the report
    pub fn absorb(&mut self, update: LookupUpdate) {
        match update {
            LookupUpdate::Events { events, .. } => self.events.extend(events),
            LookupUpdate::Empty { drug } => self.empty.push(drug),
            LookupUpdate::Failed { drug, reason } => self.failures.push((drug, reason)),
        }
    }
}

/// Start one lookup task per name (at most `MAX_LOOKUP_MATCHES`).
///
/// The receiver yields one update per name and closes once every task
/// has finished. Dropping the receiver early lets in-flight lookups run
/// to completion; their results are discarded.
pub fn spawn_lookups(
    lookup: Arc<dyn DrugEventLookup>,
    drugs: &[String],
) -> mpsc::UnboundedReceiver<LookupUpdate> {
    let (sender, receiver) = mpsc::unbounded_channel();

    if drugs.len() > MAX_LOOKUP_MATCHES {
        warn!(
            "Capping lookups at {MAX_LOOKUP_MATCHES} of {} names",
            drugs.len()
        );
    }

    for drug in drugs.iter().take(MAX_LOOKUP_MATCHES) {
        let lookup = lookup.clone();
        let sender = sender.clone();
        let drug = drug.clone();

        tokio::spawn(async move {
            let update = run_one(lookup.as_ref(), drug).await;
            if sender.send(update).is_err() {
                info!("Lookup result discarded, receiver gone");
            }
        });
    }

    receiver
}

async fn run_one(lookup: &dyn DrugEventLookup, drug: String) -> LookupUpdate {
    match lookup.lookup(&drug).await {
        Ok(events) if events.is_empty() => {
            warn!("No drug events found for \"{drug}\"");
            LookupUpdate::Empty { drug }
        }
        Ok(events) => {
            let events = events
                .into_iter()
                .map(|mut event| {
                    event.source_drug = drug.clone();
                    event
                })
                .collect();
            LookupUpdate::Events { drug, events }
        }
        Err(e) => {
            error!("Error fetching data for {drug}: {e}");
            LookupUpdate::Failed {
                drug,
                reason: e.to_string(),
            }
        }
    }
}

/// Run all lookups and wait for every one of them to settle
pub async fn lookup_all(lookup: Arc<dyn DrugEventLookup>, drugs: &[String]) -> FanOutReport {
    let mut receiver = spawn_lookups(lookup, drugs);
    let mut report = FanOutReport::default();

    while let Some(update) = receiver.recv().await {
        report.absorb(update);
    }

    info!(
        "Lookups settled: {} event(s), {} empty, {} failed",
        report.events.len(),
        report.empty.len(),
        report.failures.len()
    );

    report
}
